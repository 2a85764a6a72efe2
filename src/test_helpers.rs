//! Test helpers for building resource fixtures and mock contexts

#![cfg(test)]

use crate::context::Context;
use crate::drift::ResourceCollection;
use crate::sink::MockReportSink;
use crate::traits::{MockFileSystem, MockOutput};
use serde_json::{Value, json};
use std::sync::Arc;

/// Cloud side of the mixed batch: one match, one flipped boolean, one bucket
/// absent from IaC
pub const MIXED_CLOUD: &str = r#"{
  "resources": [
    {"type": "aws_instance", "id": "i-123", "arn": "arn:aws:ec2:us-east-1:1:instance/i-123",
     "instance_type": "t3.micro", "tags": [{"Key": "Name", "Value": "web"}]},
    {"type": "aws_db_instance", "id": "prod-db-1", "engine": "postgres", "publicly_accessible": true},
    {"type": "aws_s3_bucket", "id": "my-logs", "public": true}
  ]
}"#;

/// IaC side of the mixed batch
pub const MIXED_IAC: &str = r#"{
  "resources": [
    {"type": "aws_instance", "id": "i-123", "instance_type": "t3.micro", "tags": {"Name": "web"}},
    {"type": "aws_db_instance", "id": "prod-db-1", "engine": "postgres", "publicly_accessible": "false"}
  ]
}"#;

/// Build a collection from records
pub fn collection(resources: Vec<Value>) -> ResourceCollection {
    ResourceCollection { resources }
}

/// An `aws_instance` record
pub fn instance(id: &str, instance_type: &str) -> Value {
    json!({
        "type": "aws_instance",
        "id": id,
        "instance_type": instance_type,
    })
}

/// A context over fresh mocks, with handles for assertions
pub fn mock_context(
    sink: MockReportSink,
) -> (Context, Arc<MockFileSystem>, Arc<MockOutput>, Arc<MockReportSink>) {
    let fs = Arc::new(MockFileSystem::new());
    let output = Arc::new(MockOutput::new());
    let sink = Arc::new(sink);

    let ctx = Context::test_with(Arc::clone(&fs), Arc::clone(&output), Arc::clone(&sink));
    (ctx, fs, output, sink)
}
