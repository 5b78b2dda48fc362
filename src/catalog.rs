//! Extern type catalog
//!
//! The catalog maps a type signature (a substring of a declared engine name) to
//! the template that implements it and the ordered placeholder replacements to
//! run over that template. Catalogs are TOML documents; commands are parsed when
//! the catalog loads, so an unknown command never reaches the template engine.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::ParseError;
use crate::parser::{parse_command, Command};

/// Errors that can occur when loading or parsing a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse catalog TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("duplicate extern signature '{signature}'")]
    DuplicateSignature { signature: String },
    #[error("empty extern signature for template '{template_file}'")]
    EmptySignature { template_file: String },
    #[error("pattern '{pattern}' of extern '{signature}' has more than one command")]
    DuplicatePattern { signature: String, pattern: String },
    #[error("invalid command '{command}' for pattern '{pattern}' of extern '{signature}': {}", format_errors(.errors))]
    InvalidCommand {
        signature: String,
        pattern: String,
        command: String,
        errors: Vec<ParseError>,
    },
}

fn format_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl CatalogError {
    /// Render the error, with a source snippet for command errors
    pub fn report(&self) -> String {
        match self {
            CatalogError::InvalidCommand {
                pattern,
                command,
                errors,
                ..
            } => {
                let mut out = format!("{}\n", self);
                for err in errors {
                    out.push_str(&err.format(command, pattern));
                }
                out
            }
            other => other.to_string(),
        }
    }
}

/// One placeholder replacement of an extern type
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    /// Literal text searched for in the template
    pub pattern: String,
    pub command: Command,
}

/// A known extern type
#[derive(Debug, Clone, PartialEq)]
pub struct ExternTypeSpec {
    /// Substring identifying the type in a declared engine name
    pub signature: String,
    /// Module template, relative to the templates directory
    pub template_file: PathBuf,
    /// Replacements in the order they are applied
    pub replacements: Vec<Replacement>,
}

impl ExternTypeSpec {
    /// Placeholder patterns of this type
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.replacements.iter().map(|r| r.pattern.as_str())
    }
}

/// Ordered set of extern types
///
/// Order matters: discovery picks the first signature contained in an engine
/// name.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    /// Optional name for the catalog
    pub name: Option<String>,
    types: Vec<ExternTypeSpec>,
}

/// TOML structure for deserializing catalogs
#[derive(Deserialize)]
struct TomlCatalog {
    metadata: Option<TomlMetadata>,
    #[serde(rename = "extern", default)]
    externs: Vec<TomlExtern>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
}

#[derive(Deserialize)]
struct TomlExtern {
    signature: String,
    template_file: String,
    #[serde(default)]
    replacements: Vec<TomlReplacement>,
}

#[derive(Deserialize)]
struct TomlReplacement {
    pattern: String,
    command: String,
}

/// Extern types shipped with the SUME P4 switch templates
const DEFAULT_CATALOG: &str = r#"
[metadata]
name = "sume-sdnet"

[[extern]]
signature = "hash_lrc"
template_file = "externs/hash_lrc/hdl/EXTERN_hash_lrc_template.v"
replacements = [
    { pattern = "@EXTERN_NAME@", command = "extern_name" },
    { pattern = "@MODULE_NAME@", command = "module_name" },
    { pattern = "@PREFIX_NAME@", command = "prefix_name" },
    { pattern = "@INPUT_WIDTH@", command = "input_width(in_data)" },
    { pattern = "@RESULT_WIDTH@", command = "output_width(result)" },
]

[[extern]]
signature = "timestamp"
template_file = "externs/timestamp/hdl/EXTERN_timestamp_template.v"
replacements = [
    { pattern = "@EXTERN_NAME@", command = "extern_name" },
    { pattern = "@MODULE_NAME@", command = "module_name" },
    { pattern = "@PREFIX_NAME@", command = "prefix_name" },
    { pattern = "@VALID_WIDTH@", command = "input_width(valid)" },
    { pattern = "@RESULT_WIDTH@", command = "output_width(result)" },
]

[[extern]]
signature = "reg_rw"
template_file = "externs/reg_rw/hdl/EXTERN_reg_rw_template.v"
replacements = [
    { pattern = "@EXTERN_NAME@", command = "extern_name" },
    { pattern = "@MODULE_NAME@", command = "module_name" },
    { pattern = "@PREFIX_NAME@", command = "prefix_name" },
    { pattern = "@ADDR_WIDTH@", command = "addr_width" },
    { pattern = "@INDEX_WIDTH@", command = "input_width(index)" },
    { pattern = "@REG_WIDTH@", command = "output_width(result)" },
    { pattern = "@OP_WIDTH@", command = "input_width(opCode)" },
]

[[extern]]
signature = "reg_raw"
template_file = "externs/reg_raw/hdl/EXTERN_reg_raw_template.v"
replacements = [
    { pattern = "@EXTERN_NAME@", command = "extern_name" },
    { pattern = "@MODULE_NAME@", command = "module_name" },
    { pattern = "@PREFIX_NAME@", command = "prefix_name" },
    { pattern = "@ADDR_WIDTH@", command = "addr_width" },
    { pattern = "@INDEX_WIDTH@", command = "input_width(index)" },
    { pattern = "@REG_WIDTH@", command = "output_width(result)" },
    { pattern = "@OP_WIDTH@", command = "input_width(opCode)" },
]

[[extern]]
signature = "reg_praw"
template_file = "externs/reg_praw/hdl/EXTERN_reg_praw_template.v"
replacements = [
    { pattern = "@EXTERN_NAME@", command = "extern_name" },
    { pattern = "@MODULE_NAME@", command = "module_name" },
    { pattern = "@PREFIX_NAME@", command = "prefix_name" },
    { pattern = "@ADDR_WIDTH@", command = "addr_width" },
    { pattern = "@INDEX_WIDTH@", command = "input_width(index)" },
    { pattern = "@REG_WIDTH@", command = "output_width(result)" },
    { pattern = "@OP_WIDTH@", command = "input_width(opCode)" },
]

[[extern]]
signature = "reg_ifElseRaw"
template_file = "externs/reg_ifElseRaw/hdl/EXTERN_reg_ifElseRaw_template.v"
replacements = [
    { pattern = "@EXTERN_NAME@", command = "extern_name" },
    { pattern = "@MODULE_NAME@", command = "module_name" },
    { pattern = "@PREFIX_NAME@", command = "prefix_name" },
    { pattern = "@ADDR_WIDTH@", command = "addr_width" },
    { pattern = "@INDEX_WIDTH@", command = "input_width(index_2)" },
    { pattern = "@REG_WIDTH@", command = "output_width(result)" },
    { pattern = "@OP_WIDTH@", command = "input_width(opCode)" },
]

[[extern]]
signature = "reg_sub"
template_file = "externs/reg_sub/hdl/EXTERN_reg_sub_template.v"
replacements = [
    { pattern = "@EXTERN_NAME@", command = "extern_name" },
    { pattern = "@MODULE_NAME@", command = "module_name" },
    { pattern = "@PREFIX_NAME@", command = "prefix_name" },
    { pattern = "@ADDR_WIDTH@", command = "addr_width" },
    { pattern = "@INDEX_WIDTH@", command = "input_width(index)" },
    { pattern = "@REG_WIDTH@", command = "output_width(result)" },
    { pattern = "@OP_WIDTH@", command = "input_width(opCode)" },
]

[[extern]]
signature = "reg_multi_raws"
template_file = "externs/reg_multi_raws/hdl/EXTERN_reg_multi_raws_template.v"
replacements = [
    { pattern = "@EXTERN_NAME@", command = "extern_name" },
    { pattern = "@MODULE_NAME@", command = "module_name" },
    { pattern = "@PREFIX_NAME@", command = "prefix_name" },
    { pattern = "@ADDR_WIDTH@", command = "addr_width" },
    { pattern = "@INDEX_WIDTH@", command = "input_width(index_0)" },
    { pattern = "@REG_WIDTH@", command = "output_width(result)" },
    { pattern = "@OP_WIDTH@", command = "input_width(opCode_0)" },
]
"#;

impl TypeCatalog {
    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a catalog from a TOML string
    pub fn from_str(content: &str) -> Result<Self, CatalogError> {
        let parsed: TomlCatalog = toml::from_str(content)?;

        let mut seen = HashSet::new();
        let mut types = Vec::with_capacity(parsed.externs.len());
        for ext in parsed.externs {
            if ext.signature.is_empty() {
                return Err(CatalogError::EmptySignature {
                    template_file: ext.template_file,
                });
            }
            if !seen.insert(ext.signature.clone()) {
                return Err(CatalogError::DuplicateSignature {
                    signature: ext.signature,
                });
            }

            let mut patterns = HashSet::new();
            let mut replacements = Vec::with_capacity(ext.replacements.len());
            for r in ext.replacements {
                if !patterns.insert(r.pattern.clone()) {
                    return Err(CatalogError::DuplicatePattern {
                        signature: ext.signature,
                        pattern: r.pattern,
                    });
                }
                let command =
                    parse_command(&r.command).map_err(|errors| CatalogError::InvalidCommand {
                        signature: ext.signature.clone(),
                        pattern: r.pattern.clone(),
                        command: r.command.clone(),
                        errors,
                    })?;
                replacements.push(Replacement {
                    pattern: r.pattern,
                    command,
                });
            }

            types.push(ExternTypeSpec {
                signature: ext.signature,
                template_file: PathBuf::from(ext.template_file),
                replacements,
            });
        }

        Ok(TypeCatalog {
            name: parsed.metadata.and_then(|m| m.name),
            types,
        })
    }

    /// Get an extern type by its exact signature
    pub fn get(&self, signature: &str) -> Option<&ExternTypeSpec> {
        self.types.iter().find(|t| t.signature == signature)
    }

    /// First extern type whose signature occurs in `declared_name`
    pub fn match_name(&self, declared_name: &str) -> Option<&ExternTypeSpec> {
        self.types
            .iter()
            .find(|t| declared_name.contains(t.signature.as_str()))
    }

    /// All extern types in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &ExternTypeSpec> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::from_str(DEFAULT_CATALOG).expect("Default catalog should be valid TOML")
    }
}
