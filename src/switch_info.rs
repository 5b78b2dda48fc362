//! Switch description input
//!
//! The switch description is a JSON document produced by the P4 compiler flow.
//! Only `user_engines` is read; each engine must carry `px_name` and `p4_name`.
//! Any other keys of an engine or of its tuple fields are kept verbatim so
//! they reappear in the extern defines output.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur when loading a switch description
#[derive(Error, Debug)]
pub enum SwitchInfoError {
    #[error("Failed to read switch description: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse switch description JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// One field of an engine's data-plane tuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "px_name")]
    pub field_name: String,
    pub msb: u64,
    pub lsb: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDescriptor {
    pub fn new(field_name: impl Into<String>, msb: u64, lsb: u64) -> Self {
        Self {
            field_name: field_name.into(),
            msb,
            lsb,
            extra: Map::new(),
        }
    }

    /// Width of the field in bits, None when it does not fit in 64 bits
    pub fn width(&self) -> Option<u64> {
        self.msb.abs_diff(self.lsb).checked_add(1)
    }
}

/// An engine declared in the switch description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEngine {
    /// Short name used for the engine's HDL instance
    #[serde(rename = "px_name")]
    pub instance_name: String,
    /// Full name as declared in the P4 program
    #[serde(rename = "p4_name")]
    pub declared_name: String,
    #[serde(default)]
    pub input_tuple: Vec<FieldDescriptor>,
    #[serde(default)]
    pub output_tuple: Vec<FieldDescriptor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserEngine {
    pub fn new(instance_name: impl Into<String>, declared_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            declared_name: declared_name.into(),
            input_tuple: Vec::new(),
            output_tuple: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_input(mut self, field: FieldDescriptor) -> Self {
        self.input_tuple.push(field);
        self
    }

    pub fn with_output(mut self, field: FieldDescriptor) -> Self {
        self.output_tuple.push(field);
        self
    }
}

/// The parts of the switch description this tool reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchInfo {
    pub user_engines: Vec<UserEngine>,
}

impl SwitchInfo {
    /// Load a switch description from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, SwitchInfoError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a switch description from a JSON string
    pub fn from_str(content: &str) -> Result<Self, SwitchInfoError> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_engines() {
        let json = r#"{
            "user_engines": [
                {
                    "px_name": "reg_rw_0",
                    "p4_name": "ip_count_reg_rw",
                    "input_tuple": [
                        {"px_name": "index", "msb": 8, "lsb": 4, "type": "bits"},
                        {"px_name": "opCode", "msb": 3, "lsb": 0}
                    ],
                    "output_tuple": [{"px_name": "result", "msb": 31, "lsb": 0}],
                    "direction": "ingress"
                },
                {"px_name": "lpm_0", "p4_name": "ipv4_lpm"}
            ],
            "other": 1
        }"#;
        let info = SwitchInfo::from_str(json).expect("Should parse");
        assert_eq!(info.user_engines.len(), 2);

        let engine = &info.user_engines[0];
        assert_eq!(engine.instance_name, "reg_rw_0");
        assert_eq!(engine.declared_name, "ip_count_reg_rw");
        assert_eq!(engine.input_tuple[0].width(), Some(5));
        assert_eq!(engine.input_tuple[0].extra["type"], "bits");
        assert_eq!(engine.output_tuple[0].width(), Some(32));
        assert_eq!(engine.extra["direction"], "ingress");
        assert!(info.user_engines[1].input_tuple.is_empty());
    }

    #[test]
    fn test_missing_names_rejected() {
        let json = r#"{"user_engines": [{"px_name": "reg_rw_0"}]}"#;
        assert!(matches!(
            SwitchInfo::from_str(json),
            Err(SwitchInfoError::JsonError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = SwitchInfo::from_file(Path::new("/nonexistent/switch_info.json"));
        assert!(matches!(result, Err(SwitchInfoError::IoError(_))));
    }

    #[test]
    fn test_engine_roundtrips_extra_keys() {
        let json = r#"{"px_name": "a", "p4_name": "b", "input_tuple": [], "output_tuple": [], "k": [1, 2]}"#;
        let engine: UserEngine = serde_json::from_str(json).unwrap();
        let value = serde_json::to_value(&engine).unwrap();
        assert_eq!(value["px_name"], "a");
        assert_eq!(value["k"], serde_json::json!([1, 2]));
    }
}
