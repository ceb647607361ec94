//! Complete flag sets and the snapshot handed to consumers.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::feature_flags::keys::FlagKey;
use crate::feature_flags::value::FlagValue;

/// Value for every [`FlagKey`]. Only constructible from the defaults, so it is never partial.
#[derive(Clone, Debug, PartialEq)]
pub struct FlagSet {
    values: BTreeMap<FlagKey, FlagValue>,
}

/// Outcome of [`FlagSet::merge_remote`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Number of distinct flags overridden by the payload.
    pub applied: usize,
    pub unknown_keys: Vec<String>,
    pub mismatched_keys: Vec<String>,
    /// Names that set a flag already set under its other spelling. The later name wins.
    pub duplicate_keys: Vec<String>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.unknown_keys.is_empty()
            && self.mismatched_keys.is_empty()
            && self.duplicate_keys.is_empty()
    }
}

impl FlagSet {
    pub fn defaults() -> Self {
        let values = FlagKey::ALL
            .iter()
            .map(|key| (*key, key.default_value()))
            .collect();
        Self { values }
    }

    pub fn get(&self, key: FlagKey) -> &FlagValue {
        // Every key is inserted by `defaults`, and merges only replace values.
        &self.values[&key]
    }

    pub fn get_bool(&self, key: FlagKey) -> Option<bool> {
        self.get(key).as_bool()
    }

    pub fn get_number(&self, key: FlagKey) -> Option<f64> {
        self.get(key).as_number()
    }

    pub fn get_str(&self, key: FlagKey) -> Option<&str> {
        self.get(key).as_str()
    }

    pub fn get_json(&self, key: FlagKey) -> Option<&JsonValue> {
        self.get(key).as_json()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlagKey, &FlagValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }

    /// Overlays a remote payload on this set.
    ///
    /// Keys are matched in camelCase or kebab-case. Unknown keys and values whose kind does
    /// not match the declared kind are dropped with a warning; the default stays in place.
    pub fn merge_remote(&mut self, payload: &JsonMap<String, JsonValue>) -> MergeReport {
        let mut report = MergeReport::default();
        let mut applied = BTreeSet::new();
        for (name, raw) in payload {
            let Some(key) = FlagKey::from_wire(name) else {
                log::warn!("ignoring unknown feature flag `{name}`");
                report.unknown_keys.push(name.clone());
                continue;
            };
            match FlagValue::from_json(key.kind(), raw) {
                Some(value) => {
                    self.values.insert(key, value);
                    if !applied.insert(key) {
                        log::warn!("feature flag `{name}` was also sent as `{}`", key.as_str());
                        report.duplicate_keys.push(name.clone());
                    }
                }
                None => {
                    log::warn!(
                        "ignoring feature flag `{name}`: expected a {} value, got {raw}",
                        key.kind().as_str()
                    );
                    report.mismatched_keys.push(name.clone());
                }
            }
        }
        report.applied = applied.len();
        report
    }

    pub fn to_camel(&self) -> CamelFlagSet {
        CamelFlagSet::from(self)
    }
}

impl Default for FlagSet {
    fn default() -> Self {
        Self::defaults()
    }
}

/// camelCase view of a [`FlagSet`]. Read-only.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CamelFlagSet {
    values: BTreeMap<String, FlagValue>,
}

impl CamelFlagSet {
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FlagValue::as_bool)
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FlagValue::as_number)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FlagValue::as_str)
    }

    pub fn get_json(&self, name: &str) -> Option<&JsonValue> {
        self.get(name).and_then(FlagValue::as_json)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl From<&FlagSet> for CamelFlagSet {
    fn from(set: &FlagSet) -> Self {
        let values = set
            .iter()
            .map(|(key, value)| (key.camel_name(), value.clone()))
            .collect();
        Self { values }
    }
}

/// Snapshot consumed by the UI: `{ "variations": { <camelCaseKey>: value, ... } }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureFlagsResult {
    pub variations: CamelFlagSet,
}

impl FeatureFlagsResult {
    pub fn defaults() -> Self {
        Self::from(&FlagSet::defaults())
    }
}

impl From<&FlagSet> for FeatureFlagsResult {
    fn from(set: &FlagSet) -> Self {
        Self {
            variations: set.to_camel(),
        }
    }
}

/// camelCase view of the default table.
pub fn default_variations() -> CamelFlagSet {
    FlagSet::defaults().to_camel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: JsonValue) -> JsonMap<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn default_variations_cover_every_key_once() {
        let variations = default_variations();
        assert_eq!(variations.len(), FlagKey::ALL.len());
        for key in FlagKey::ALL {
            assert_eq!(variations.get(&key.camel_name()), Some(&key.default_value()));
        }
        assert!(variations.keys().all(|name| !name.contains('-')));
    }

    #[test]
    fn merge_counts_each_flag_once_across_spellings() {
        let mut set = FlagSet::defaults();
        let report = set.merge_remote(&payload(json!({
            "example-number": 1,
            "exampleNumber": 2,
            "exampleString": "x"
        })));

        assert_eq!(report.applied, 2);
        assert_eq!(report.duplicate_keys.len(), 1);
        assert!(!report.is_clean());
        assert!(report.unknown_keys.is_empty());
    }

    #[test]
    fn merge_overrides_only_listed_keys() {
        let mut set = FlagSet::defaults();
        let report = set.merge_remote(&payload(json!({
            "ecommerceServiceUsersEnableChat": true
        })));

        assert_eq!(report.applied, 1);
        assert!(report.is_clean());
        assert_eq!(set.get_bool(FlagKey::EcommerceServiceUsersEnableChat), Some(true));
        for key in FlagKey::ALL {
            if *key != FlagKey::EcommerceServiceUsersEnableChat {
                assert_eq!(set.get(*key), &key.default_value());
            }
        }
    }

    #[test]
    fn merge_accepts_kebab_aliases() {
        let mut set = FlagSet::defaults();
        set.merge_remote(&payload(json!({
            "example-string": "hello",
            "exampleNumber": 7
        })));
        assert_eq!(set.get_str(FlagKey::ExampleString), Some("hello"));
        assert_eq!(set.get_number(FlagKey::ExampleNumber), Some(7.0));
    }

    #[test]
    fn merge_drops_unknown_and_mismatched_keys() {
        let mut set = FlagSet::defaults();
        let report = set.merge_remote(&payload(json!({
            "notAFlag": true,
            "profileServiceEnableWalletSend": "yes",
            "exampleJson": { "nested": [1, 2] }
        })));

        assert_eq!(report.applied, 1);
        assert_eq!(report.unknown_keys, vec!["notAFlag".to_string()]);
        assert_eq!(
            report.mismatched_keys,
            vec!["profileServiceEnableWalletSend".to_string()]
        );
        assert_eq!(set.get_bool(FlagKey::ProfileServiceEnableWalletSend), Some(false));
        assert_eq!(
            set.get_json(FlagKey::ExampleJson),
            Some(&json!({ "nested": [1, 2] }))
        );
        assert_eq!(set.len(), FlagKey::ALL.len());
    }

    #[test]
    fn result_serialises_with_variations_wrapper() {
        let value = serde_json::to_value(FeatureFlagsResult::defaults()).unwrap();
        let variations = value["variations"].as_object().unwrap();
        assert_eq!(variations.len(), FlagKey::ALL.len());
        assert_eq!(variations["ecommerceServiceUsersEnableChat"], json!(false));
        assert_eq!(variations["exampleJson"], json!({}));
    }
}
