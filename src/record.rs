//! Extern records accumulated by the pipeline

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::switch_info::{FieldDescriptor, UserEngine};

/// Everything known about one discovered extern instance
///
/// Discovery fills in the identity fields; the resolver stages add the
/// control width, addresses and module name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternRecord {
    /// Short instance name used for HDL directories and header constants
    #[serde(rename = "px_name")]
    pub instance_name: String,
    /// Name as declared in the switch description
    #[serde(rename = "p4_name")]
    pub declared_name: String,
    /// Signature of the matched catalog entry
    pub extern_type: String,
    /// Declared name without the `_<signature>` suffix
    pub prefix_name: String,
    pub input_tuple: Vec<FieldDescriptor>,
    pub output_tuple: Vec<FieldDescriptor>,
    /// Bits of the control address bus, 0 without a control interface
    pub control_width: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_addr: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    /// Located `.HDL` directory of the instance
    #[serde(skip)]
    pub extern_dir: Option<PathBuf>,
    /// Engine keys this tool does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Serialized names of the fields an `ExternRecord` computes itself
const RECORD_KEYS: &[&str] = &[
    "px_name",
    "p4_name",
    "extern_type",
    "prefix_name",
    "input_tuple",
    "output_tuple",
    "control_width",
    "addr_offset",
    "base_addr",
    "module_name",
];

impl ExternRecord {
    /// Create a record for an engine matched to `signature`
    ///
    /// Engine keys that collide with record fields are dropped.
    pub fn from_engine(engine: &UserEngine, signature: &str) -> Self {
        let mut extra = engine.extra.clone();
        extra.retain(|key, _| !RECORD_KEYS.contains(&key.as_str()));

        Self {
            instance_name: engine.instance_name.clone(),
            declared_name: engine.declared_name.clone(),
            extern_type: signature.to_string(),
            prefix_name: prefix_name(&engine.declared_name, signature),
            input_tuple: engine.input_tuple.clone(),
            output_tuple: engine.output_tuple.clone(),
            control_width: 0,
            addr_offset: None,
            base_addr: None,
            module_name: None,
            extern_dir: None,
            extra,
        }
    }

    /// Whether the extern exposes a control register interface
    pub fn has_control(&self) -> bool {
        self.control_width > 0
    }
}

/// Strip every `_<signature>` from a declared name
pub fn prefix_name(declared_name: &str, signature: &str) -> String {
    declared_name.replace(&format!("_{}", signature), "")
}

/// Extern records in declaration order, unique by instance name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternSet {
    records: Vec<ExternRecord>,
}

impl ExternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing one with the same instance name in place
    pub fn insert(&mut self, record: ExternRecord) {
        match self
            .records
            .iter_mut()
            .find(|r| r.instance_name == record.instance_name)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn get(&self, instance_name: &str) -> Option<&ExternRecord> {
        self.records.iter().find(|r| r.instance_name == instance_name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExternRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records keyed by prefix name, as written to the extern defines file
    pub fn by_prefix(&self) -> BTreeMap<&str, &ExternRecord> {
        self.records
            .iter()
            .map(|r| (r.prefix_name.as_str(), r))
            .collect()
    }
}

impl IntoIterator for ExternSet {
    type Item = ExternRecord;
    type IntoIter = std::vec::IntoIter<ExternRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExternSet {
    type Item = &'a ExternRecord;
    type IntoIter = std::slice::Iter<'a, ExternRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<ExternRecord> for ExternSet {
    fn from_iter<T: IntoIterator<Item = ExternRecord>>(iter: T) -> Self {
        let mut set = ExternSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(instance: &str, declared: &str) -> ExternRecord {
        ExternRecord::from_engine(&UserEngine::new(instance, declared), "reg_rw")
    }

    #[test]
    fn test_engine_keys_do_not_shadow_record_fields() {
        let engine: UserEngine = serde_json::from_str(
            r#"{
                "px_name": "reg_rw_0",
                "p4_name": "count_reg_rw",
                "control_width": 99,
                "module_name": "stale",
                "extern_type": "other",
                "direction": "ingress"
            }"#,
        )
        .unwrap();
        let mut record = ExternRecord::from_engine(&engine, "reg_rw");
        record.control_width = 4;

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json.matches("\"control_width\"").count(), 1);
        assert_eq!(json.matches("\"extern_type\"").count(), 1);
        assert!(!json.contains("module_name"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["control_width"], 4);
        assert_eq!(value["extern_type"], "reg_rw");
        assert_eq!(value["direction"], "ingress");
    }

    #[test]
    fn test_prefix_name() {
        assert_eq!(prefix_name("ip_count_reg_rw", "reg_rw"), "ip_count");
        assert_eq!(prefix_name("myeng_sig1", "sig1"), "myeng");
        // No separator: nothing to strip
        assert_eq!(prefix_name("sig1eng", "sig1"), "sig1eng");
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut set = ExternSet::new();
        set.insert(record("a", "first_reg_rw"));
        set.insert(record("b", "second_reg_rw"));
        set.insert(record("a", "third_reg_rw"));

        let names: Vec<_> = set.iter().map(|r| r.instance_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(set.get("a").unwrap().prefix_name, "third");
    }

    #[test]
    fn test_serialize_skips_unresolved_fields() {
        let value = serde_json::to_value(record("reg_rw_0", "cnt_reg_rw")).unwrap();
        assert_eq!(value["px_name"], "reg_rw_0");
        assert_eq!(value["p4_name"], "cnt_reg_rw");
        assert_eq!(value["extern_type"], "reg_rw");
        assert_eq!(value["control_width"], 0);
        assert!(value.get("base_addr").is_none());
        assert!(value.get("module_name").is_none());
        assert!(value.get("extern_dir").is_none());
    }

    #[test]
    fn test_by_prefix_sorted() {
        let set: ExternSet = vec![record("b", "zz_reg_rw"), record("a", "aa_reg_rw")]
            .into_iter()
            .collect();
        let prefixes: Vec<_> = set.by_prefix().keys().copied().collect();
        assert_eq!(prefixes, vec!["aa", "zz"]);
    }
}
