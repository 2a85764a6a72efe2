//! Canonicalization of attribute values and tags
//!
//! Cloud APIs and IaC tools serialize the same logical value differently
//! (`"true"` vs `true`, `"123"` vs `123`, tags as a map or as a list of
//! `{Key, Value}` pairs). Everything here is a total function: a value that
//! cannot be coerced falls through to the next representation and finally to
//! its trimmed string form.

use super::filter::KeyFilter;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Tags in canonical mapping form
pub type Tags = BTreeMap<String, String>;

const TAG_KEY_FIELDS: [&str; 2] = ["Key", "key"];
const TAG_VALUE_FIELDS: [&str; 2] = ["Value", "value"];

/// Normalize a single value for comparison.
///
/// Strings are tried in order: boolean (case-insensitive), integer, finite
/// float, otherwise the trimmed string. Sequences are normalized element-wise.
/// A mapping shaped like a single tag entry collapses into a tag mapping;
/// any other mapping keeps only the keys the filter compares.
pub fn normalize_value(value: &Value, filter: &KeyFilter) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => normalize_str(s),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize_value(item, filter))
                .collect(),
        ),
        Value::Object(map) => {
            if is_tag_entry(map) {
                return tags_to_value(normalize_tags(&Value::Array(vec![value.clone()])));
            }

            Value::Object(
                map.iter()
                    .filter(|(key, _)| filter.should_compare(key))
                    .map(|(key, v)| (key.clone(), normalize_value(v, filter)))
                    .collect(),
            )
        }
        other => other.clone(),
    }
}

/// Normalize tags given either as a mapping or as a sequence of
/// `{Key|key, Value|value}` pair objects.
///
/// Pair objects without a key, and sequence elements that are not objects,
/// are skipped. A pair without a value maps to the empty string.
pub fn normalize_tags(value: &Value) -> Tags {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, v)| (key.clone(), tag_string(v)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|item| {
                let key = first_present(item, &TAG_KEY_FIELDS)?;
                let value = first_present(item, &TAG_VALUE_FIELDS).unwrap_or(&Value::Null);
                Some((tag_string(key), tag_string(value)))
            })
            .collect(),
        _ => Tags::new(),
    }
}

/// Convert canonical tags into a comparable value
pub fn tags_to_value(tags: Tags) -> Value {
    Value::Object(
        tags.into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    )
}

fn normalize_str(raw: &str) -> Value {
    let trimmed = raw.trim();

    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(int) = trimmed.parse::<u64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>()
        && let Some(number) = Number::from_f64(float)
    {
        return Value::Number(number);
    }

    Value::String(trimmed.to_string())
}

fn is_tag_entry(map: &Map<String, Value>) -> bool {
    TAG_KEY_FIELDS
        .iter()
        .chain(TAG_VALUE_FIELDS.iter())
        .any(|field| map.contains_key(*field))
}

fn first_present<'a>(map: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| map.get(*field))
        .find(|v| !v.is_null())
}

fn tag_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> Value {
        normalize_value(&value, &KeyFilter::default())
    }

    #[test]
    fn test_boolean_strings() {
        assert_eq!(normalize(json!("true")), json!(true));
        assert_eq!(normalize(json!("FALSE")), json!(false));
        assert_eq!(normalize(json!("True")), json!(true));
        assert_eq!(normalize(json!(" true ")), json!(true));
        assert_eq!(normalize(json!("truthy")), json!("truthy"));
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(normalize(json!("123")), json!(123));
        assert_eq!(normalize(json!("-7")), json!(-7));
        assert_eq!(normalize(json!(" 42 ")), json!(42));
        assert_eq!(normalize(json!("18446744073709551615")), json!(18446744073709551615u64));
        assert_eq!(normalize(json!("1.5")), json!(1.5));
        assert_eq!(normalize(json!("1e3")), json!(1000.0));
    }

    #[test]
    fn test_unparseable_strings_are_trimmed() {
        assert_eq!(normalize(json!("  t3.micro ")), json!("t3.micro"));
        assert_eq!(normalize(json!("12abc")), json!("12abc"));
        assert_eq!(normalize(json!("nan")), json!("nan"));
        assert_eq!(normalize(json!("inf")), json!("inf"));
        assert_eq!(normalize(json!("")), json!(""));
    }

    #[test]
    fn test_integer_and_float_stay_distinct() {
        assert_ne!(normalize(json!("1")), normalize(json!("1.0")));
    }

    #[test]
    fn test_non_strings_pass_through() {
        assert_eq!(normalize(Value::Null), Value::Null);
        assert_eq!(normalize(json!(true)), json!(true));
        assert_eq!(normalize(json!(3)), json!(3));
        assert_eq!(normalize(json!(2.5)), json!(2.5));
    }

    #[test]
    fn test_sequences_preserve_order() {
        assert_eq!(
            normalize(json!(["b", "1", "false", null])),
            json!(["b", 1, false, null])
        );
    }

    #[test]
    fn test_mapping_drops_ignored_keys_recursively() {
        let value = json!({
            "id": "sg-1",
            "name": "web",
            "rules": [{"arn": "x", "port": "443"}],
            "nested": {"etag": "abc", "enabled": "true"}
        });

        assert_eq!(
            normalize(value),
            json!({
                "name": "web",
                "rules": [{"port": 443}],
                "nested": {"enabled": true}
            })
        );
    }

    #[test]
    fn test_custom_filter_applies_inside_mappings() {
        let filter = KeyFilter::new(["secret"]);

        assert_eq!(
            normalize_value(&json!({"secret": "x", "id": "1", "inner": [{"secret": 1}]}), &filter),
            json!({"id": 1, "inner": [{}]})
        );
    }

    #[test]
    fn test_tag_entry_mapping_collapses_to_tags() {
        assert_eq!(
            normalize(json!({"Key": "Name", "Value": "web"})),
            json!({"Name": "web"})
        );
        assert_eq!(
            normalize(json!([{"key": "Env", "value": "prod"}, {"Key": "Team", "Value": 7}])),
            json!([{"Env": "prod"}, {"Team": "7"}])
        );
    }

    #[test]
    fn test_value_only_entry_collapses_to_empty_tags() {
        assert_eq!(normalize(json!({"Value": "orphan"})), json!({}));
    }

    #[test]
    fn test_normalize_tags_from_mapping() {
        let tags = normalize_tags(&json!({"Name": "web", "Count": 3, "On": true, "Gone": null}));

        assert_eq!(tags.get("Name").map(String::as_str), Some("web"));
        assert_eq!(tags.get("Count").map(String::as_str), Some("3"));
        assert_eq!(tags.get("On").map(String::as_str), Some("true"));
        assert_eq!(tags.get("Gone").map(String::as_str), Some(""));
    }

    #[test]
    fn test_normalize_tags_from_pairs() {
        let tags = normalize_tags(&json!([
            {"Key": "Name", "Value": "web"},
            {"key": "Env", "value": "prod"},
            {"Key": null, "key": "Team", "Value": "core"},
            {"Key": "NoValue"},
            {"Value": "no-key"},
            "not-an-object",
            42
        ]));

        let expected: Tags = [
            ("Env", "prod"),
            ("Name", "web"),
            ("NoValue", ""),
            ("Team", "core"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(tags, expected);
    }

    #[test]
    fn test_normalize_tags_other_inputs_are_empty() {
        assert!(normalize_tags(&Value::Null).is_empty());
        assert!(normalize_tags(&json!("Name=web")).is_empty());
        assert!(normalize_tags(&json!(12)).is_empty());
    }

    #[test]
    fn test_mapping_and_pair_forms_agree() {
        let mapping = json!({"Name": "web", "Env": "prod", "Owner": "ops"});
        let pairs = json!([
            {"Key": "Owner", "Value": "ops"},
            {"Key": "Env", "Value": "prod"},
            {"Key": "Name", "Value": "web"}
        ]);

        assert_eq!(normalize_tags(&mapping), normalize_tags(&pairs));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let samples = vec![
            Value::Null,
            json!(" TRUE "),
            json!("false"),
            json!(" 42 "),
            json!("3.25"),
            json!("  padded  "),
            json!("ami-123"),
            json!(["1", "x ", ["true"]]),
            json!({"id": "drop", "size": "10", "inner": {"arn": "a", "flag": "False"}}),
            json!(17),
            json!(false),
        ];

        for sample in samples {
            let once = normalize(sample.clone());
            let twice = normalize(once.clone());
            assert_eq!(once, twice, "not idempotent for {}", sample);
        }
    }

    #[test]
    fn test_collapsed_tag_entries_are_normalized_again_as_mappings() {
        // A collapsed entry is an ordinary mapping, so a second pass coerces
        // its string values and filters its keys.
        let port = normalize(json!({"Key": "Port", "Value": "80"}));
        assert_eq!(port, json!({"Port": "80"}));
        assert_eq!(normalize(port), json!({"Port": 80}));

        let ignored = normalize(json!({"Key": "id", "Value": "x"}));
        assert_eq!(ignored, json!({"id": "x"}));
        assert_eq!(normalize(ignored), json!({}));

        let nested = normalize(json!({"Key": "Key", "Value": "x"}));
        assert_eq!(nested, json!({"Key": "x"}));
        assert_eq!(normalize(nested), json!({"x": ""}));
    }

    #[test]
    fn test_plain_string_tags_are_stable() {
        let once = normalize(json!([{"Key": "Name", "Value": "web"}]));
        assert_eq!(normalize(once.clone()), once);
    }
}
