use super::filter::KeyFilter;
use super::flatten::{FlatAttributes, flatten};
use super::normalize::{normalize_tags, tags_to_value};
use super::types::{ChangeEntry, DiffRecord, DriftState};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const TAGS_KEY: &str = "tags";

/// Compare a cloud record with its IaC counterpart, if any.
///
/// Both raw records are carried into the result untouched.
pub fn compare_resources(cloud: &Value, iac: Option<&Value>, filter: &KeyFilter) -> DiffRecord {
    let Some(iac) = iac else {
        return DiffRecord::missing(cloud.clone());
    };

    let cloud_flat = comparable_attributes(cloud, filter);
    let iac_flat = comparable_attributes(iac, filter);
    let change_log = diff_attributes(&cloud_flat, &iac_flat);

    let state = if change_log.is_empty() {
        DriftState::Match
    } else {
        DriftState::Modified
    };

    DiffRecord {
        cloud_resource_item: cloud.clone(),
        iac_resource_item: iac.clone(),
        state,
        change_log,
    }
}

/// Flatten a record and fold its tags into a single mapping-valued entry
fn comparable_attributes(record: &Value, filter: &KeyFilter) -> FlatAttributes {
    let empty = Map::new();
    let fields = record.as_object().unwrap_or(&empty);
    let mut flat = flatten(fields, filter);

    if let Some(tags) = fields.get(TAGS_KEY)
        && filter.should_compare(TAGS_KEY)
    {
        let nested_prefix = format!("{}.", TAGS_KEY);
        flat.retain(|key, _| !key.starts_with(&nested_prefix));
        flat.insert(TAGS_KEY.to_string(), tags_to_value(normalize_tags(tags)));
    }

    flat
}

/// Change entries for every path whose values differ, ordered by path
fn diff_attributes(cloud: &FlatAttributes, iac: &FlatAttributes) -> Vec<ChangeEntry> {
    let keys: BTreeSet<&String> = cloud.keys().chain(iac.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let cloud_value = cloud.get(key);
            let iac_value = iac.get(key);

            (cloud_value != iac_value)
                .then(|| ChangeEntry::new(key.clone(), cloud_value.cloned(), iac_value.cloned()))
        })
        .collect()
}
