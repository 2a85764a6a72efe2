use crate::config::AnalyzerConfig;
use crate::context::Context;
use crate::drift::{AnalysisSummary, ChangeEntry, DiffRecord, DriftAnalyzer, DriftState, Report};
use crate::loader::load_collection;
use crate::sink::S3Config;
use anyhow::{Context as AnyhowContext, Result};
use serde_json::Value;
use std::path::PathBuf;

/// Default path the report is written to
pub const DEFAULT_OUTPUT_PATH: &str = "analysis_output.json";

pub struct AnalyzeCommand;

/// Inputs for a single analysis run
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub cloud: PathBuf,
    pub iac: PathBuf,
    pub out: PathBuf,
    pub config: Option<PathBuf>,
    /// Upload destination; no upload when absent
    pub upload: Option<S3Config>,
    /// Skip printing the JSON report to stdout
    pub quiet: bool,
}

impl AnalyzeCommand {
    /// Execute the analyze command.
    ///
    /// The report is printed and written before any upload is attempted, so an
    /// upload failure never costs the local copy.
    pub fn execute(ctx: &Context, options: &AnalyzeOptions) -> Result<Report> {
        let (config, config_source) = AnalyzerConfig::load(&*ctx.fs, options.config.as_deref())?;

        let cloud = load_collection(&*ctx.fs, &options.cloud)
            .context("Failed to load cloud resources")?;
        let iac = load_collection(&*ctx.fs, &options.iac)
            .context("Failed to load IaC resources")?;

        let analyzer = DriftAnalyzer::new(config.key_filter());
        let report = analyzer.report(&cloud, &iac);
        let json = report.to_json_pretty()?;

        if !options.quiet {
            ctx.output.plain(&json);
        }

        ctx.fs.write(&options.out, &json)?;

        ctx.output.section("Drift Analysis");
        ctx.output
            .key_value("Cloud resources", &format!("{} ({})", cloud.len(), options.cloud.display()));
        ctx.output
            .key_value("IaC resources", &format!("{} ({})", iac.len(), options.iac.display()));
        if let Some(source) = config_source {
            ctx.output.key_value("Config", &source.display().to_string());
        }
        ctx.output.key_value(
            "Ignored keys",
            &analyzer.filter().ignored_keys().collect::<Vec<_>>().join(", "),
        );

        if cloud.is_empty() {
            ctx.output
                .dimmed(&format!("No cloud resources in {}", options.cloud.display()));
        }

        display_drift_details(ctx, &report.analysis);
        display_summary(ctx, &report.summary);

        ctx.output
            .success(&format!("Report written to: {}", options.out.display()));

        if let Some(upload) = &options.upload {
            ctx.output
                .info(&format!("Uploading report to {}", upload.location()));
            let location = ctx.sink.upload(&report, upload)?;
            ctx.output
                .success(&format!("Report uploaded to {}", location));
        }

        Ok(report)
    }
}

/// Display per-resource details for every drifted record
fn display_drift_details(ctx: &Context, records: &[DiffRecord]) {
    let drifted: Vec<&DiffRecord> = records.iter().filter(|r| r.state.is_drift()).collect();
    if drifted.is_empty() {
        return;
    }

    ctx.output.subsection("Drifted Resources");
    for record in drifted {
        ctx.output.dimmed(&format!(
            "[{}] {} ({})",
            record.state.symbol(),
            record.address(),
            record.state
        ));

        match record.state {
            DriftState::Missing => ctx.output.dimmed("  Not declared in IaC"),
            _ => {
                for change in &record.change_log {
                    display_change(ctx, change);
                }
            }
        }
    }
}

fn display_change(ctx: &Context, change: &ChangeEntry) {
    ctx.output.dimmed(&format!("  {}:", change.key_name));
    ctx.output
        .dimmed(&format!("    Cloud: {}", render_value(change.cloud_value.as_ref())));
    ctx.output
        .dimmed(&format!("    IaC:   {}", render_value(change.iac_value.as_ref())));
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None => "(absent)".to_string(),
        Some(v) => v.to_string(),
    }
}

/// Display counts per state and the overall verdict
pub(crate) fn display_summary(ctx: &Context, summary: &AnalysisSummary) {
    ctx.output.subsection("Summary");
    for state in DriftState::ALL {
        ctx.output
            .key_value(state.as_str(), &summary.count(state).to_string());
    }
    ctx.output.key_value("Total", &summary.total().to_string());
    ctx.output.blank();

    if summary.drifted() == 0 {
        ctx.output
            .success("No drift detected. Cloud resources match their IaC declarations.");
    } else {
        ctx.output.warning(&format!(
            "Drift detected in {} of {} resource(s)",
            summary.drifted(),
            summary.total()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Credentials, MockReportSink};
    use crate::test_helpers::{MIXED_CLOUD, MIXED_IAC, mock_context};
    use crate::traits::{FileSystem, OutputMessage};
    use std::path::Path;

    fn options() -> AnalyzeOptions {
        AnalyzeOptions {
            cloud: PathBuf::from("/in/cloud.json"),
            iac: PathBuf::from("/in/iac.json"),
            out: PathBuf::from("/out/analysis_output.json"),
            config: None,
            upload: None,
            quiet: false,
        }
    }

    fn upload_config() -> S3Config {
        S3Config {
            bucket: "reports".to_string(),
            key: "report.json".to_string(),
            endpoint: Some("http://localhost:4566".to_string()),
            region: "us-east-1".to_string(),
            credentials: Credentials {
                access_key_id: "test".to_string(),
                secret_access_key: "test".to_string(),
                session_token: None,
            },
        }
    }

    #[test]
    fn test_analyze_writes_and_prints_report() {
        let (ctx, fs, output, _) = mock_context(MockReportSink::new());
        fs.write(Path::new("/in/cloud.json"), MIXED_CLOUD).unwrap();
        fs.write(Path::new("/in/iac.json"), MIXED_IAC).unwrap();

        let report = AnalyzeCommand::execute(&ctx, &options()).unwrap();

        assert_eq!(report.summary.total(), 3);
        assert_eq!(report.summary.matched, 1);
        assert_eq!(report.summary.modified, 1);
        assert_eq!(report.summary.missing, 1);

        let written = fs
            .get_file_contents(Path::new("/out/analysis_output.json"))
            .unwrap();
        let parsed: Report = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, report);

        assert!(output.contains_message(&OutputMessage::Plain(written)));
        assert!(output.contains_message(&OutputMessage::KeyValue(
            "Missing".to_string(),
            "1".to_string()
        )));
        assert_eq!(
            output.get_warnings(),
            vec!["Drift detected in 2 of 3 resource(s)".to_string()]
        );

        let text = output.to_text();
        assert!(text.contains("aws_db_instance.prod-db-1"));
        assert!(text.contains("publicly_accessible"));
        assert!(text.contains("Not declared in IaC"));
    }

    #[test]
    fn test_quiet_skips_json_on_stdout() {
        let (ctx, fs, output, _) = mock_context(MockReportSink::new());
        fs.write(Path::new("/in/cloud.json"), MIXED_CLOUD).unwrap();
        fs.write(Path::new("/in/iac.json"), MIXED_IAC).unwrap();

        let mut opts = options();
        opts.quiet = true;
        AnalyzeCommand::execute(&ctx, &opts).unwrap();

        assert!(
            !output
                .get_messages()
                .iter()
                .any(|m| matches!(m, OutputMessage::Plain(_)))
        );
        assert!(fs.get_file_contents(Path::new("/out/analysis_output.json")).is_some());
    }

    #[test]
    fn test_missing_input_fails_without_writing() {
        let (ctx, fs, _, _) = mock_context(MockReportSink::new());
        fs.write(Path::new("/in/cloud.json"), MIXED_CLOUD).unwrap();

        let err = AnalyzeCommand::execute(&ctx, &options()).unwrap_err();

        assert!(format!("{:#}", err).contains("/in/iac.json"));
        assert!(fs.get_file_contents(Path::new("/out/analysis_output.json")).is_none());
    }

    #[test]
    fn test_upload_after_local_write() {
        let (ctx, fs, output, sink) = mock_context(MockReportSink::new());
        fs.write(Path::new("/in/cloud.json"), MIXED_CLOUD).unwrap();
        fs.write(Path::new("/in/iac.json"), MIXED_IAC).unwrap();

        let mut opts = options();
        opts.upload = Some(upload_config());
        let report = AnalyzeCommand::execute(&ctx, &opts).unwrap();

        let uploads = sink.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, report);
        assert_eq!(uploads[0].1, "s3://reports/report.json");
        assert!(output.contains_message(&OutputMessage::Success(
            "Report uploaded to s3://reports/report.json".to_string()
        )));
    }

    #[test]
    fn test_upload_failure_keeps_local_report() {
        let (ctx, fs, _, _) = mock_context(MockReportSink::failing("connection refused"));
        fs.write(Path::new("/in/cloud.json"), MIXED_CLOUD).unwrap();
        fs.write(Path::new("/in/iac.json"), MIXED_IAC).unwrap();

        let mut opts = options();
        opts.upload = Some(upload_config());
        let err = AnalyzeCommand::execute(&ctx, &opts).unwrap_err();

        assert!(err.to_string().contains("connection refused"));
        let written = fs
            .get_file_contents(Path::new("/out/analysis_output.json"))
            .unwrap();
        let parsed: Report = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.analysis.len(), 3);
    }

    #[test]
    fn test_config_extends_ignored_keys() {
        let (ctx, fs, output, _) = mock_context(MockReportSink::new());
        fs.write(Path::new("/in/cloud.json"), MIXED_CLOUD).unwrap();
        fs.write(Path::new("/in/iac.json"), MIXED_IAC).unwrap();
        fs.write(
            Path::new("/cfg/driftscan.yaml"),
            "extra_ignored_keys: [publicly_accessible]\n",
        )
        .unwrap();

        let mut opts = options();
        opts.config = Some(PathBuf::from("/cfg/driftscan.yaml"));
        let report = AnalyzeCommand::execute(&ctx, &opts).unwrap();

        assert_eq!(report.summary.matched, 2);
        assert_eq!(report.summary.modified, 0);
        assert!(output.contains_message(&OutputMessage::KeyValue(
            "Config".to_string(),
            "/cfg/driftscan.yaml".to_string()
        )));
    }

    #[test]
    fn test_no_drift_message() {
        let (ctx, fs, output, _) = mock_context(MockReportSink::new());
        fs.write(Path::new("/in/cloud.json"), MIXED_IAC).unwrap();
        fs.write(Path::new("/in/iac.json"), MIXED_IAC).unwrap();

        let report = AnalyzeCommand::execute(&ctx, &options()).unwrap();

        assert!(!report.has_drift());
        assert!(output.get_warnings().is_empty());
        assert!(!output.has_error());
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(None), "(absent)");
        assert_eq!(render_value(Some(&Value::Null)), "null");
        assert_eq!(render_value(Some(&serde_json::json!("t3.micro"))), "\"t3.micro\"");
    }
}
