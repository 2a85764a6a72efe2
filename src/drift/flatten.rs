use super::filter::KeyFilter;
use super::normalize::normalize_value;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Dot-joined attribute path to normalized value
pub type FlatAttributes = BTreeMap<String, Value>;

const PATH_SEPARATOR: char = '.';

/// Flatten a nested record into dot-joined paths.
///
/// Keys rejected by the filter are skipped at every depth, together with
/// everything beneath them. Nested mappings are recursed into rather than
/// normalized, so an empty nested mapping contributes no paths.
pub fn flatten(record: &Map<String, Value>, filter: &KeyFilter) -> FlatAttributes {
    let mut flat = FlatAttributes::new();
    flatten_into(record, "", filter, &mut flat);
    flat
}

fn flatten_into(
    record: &Map<String, Value>,
    prefix: &str,
    filter: &KeyFilter,
    flat: &mut FlatAttributes,
) {
    for (key, value) in record {
        if !filter.should_compare(key) {
            continue;
        }

        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, PATH_SEPARATOR, key)
        };

        match value {
            Value::Object(nested) => flatten_into(nested, &path, filter, flat),
            other => {
                flat.insert(path, normalize_value(other, filter));
            }
        }
    }
}
