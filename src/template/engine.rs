//! Placeholder substitution and per-extern file generation

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::catalog::{ExternTypeSpec, Replacement, TypeCatalog};
use crate::parser::{Command, FieldDirection, LiteralKind};
use crate::record::{ExternRecord, ExternSet};
use crate::resolve::HDL_DIR_SUFFIX;

use super::store::{TemplateError, TemplateStore};

/// CPU register module template, relative to the templates directory
pub const CPU_REGS_TEMPLATE: &str = "externs/cpu_regs_template.v";

/// CPU register defines template, relative to the templates directory
pub const CPU_REGS_DEFINES_TEMPLATE: &str = "externs/cpu_regs_defines_template.v";

/// A file produced for one extern, not yet written
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
    /// Instance name of the extern the file belongs to
    pub instance: String,
}

/// Module name of an extern, from its `.HDL` directory
pub fn module_name(extern_dir: &Path) -> Option<String> {
    let name = extern_dir.file_name()?.to_string_lossy();
    Some(name.strip_suffix(HDL_DIR_SUFFIX).unwrap_or(&name).to_string())
}

/// Text a command substitutes for `record`, or None when it cannot be resolved
fn substitution(command: &Command, record: &ExternRecord) -> Option<String> {
    match command {
        Command::FieldWidth { direction, field } => {
            let tuple = match direction {
                FieldDirection::Input => &record.input_tuple,
                FieldDirection::Output => &record.output_tuple,
            };
            let Some(descriptor) = tuple.iter().find(|f| f.field_name == *field) else {
                warn!(
                    "could not find bit width for field {} of extern {}",
                    field, record.declared_name
                );
                return None;
            };
            let width = descriptor.width();
            if width.is_none() {
                warn!(
                    "bit width of field {} of extern {} does not fit in 64 bits",
                    field, record.declared_name
                );
            }
            width.map(|w| w.to_string())
        }
        Command::Literal(LiteralKind::ExternName) => Some(record.instance_name.clone()),
        Command::Literal(LiteralKind::ModuleName) => {
            if record.module_name.is_none() {
                warn!("module name of extern {} is not resolved", record.declared_name);
            }
            record.module_name.clone()
        }
        Command::Literal(LiteralKind::PrefixName) => Some(record.prefix_name.clone()),
        Command::Literal(LiteralKind::AddrWidth) => Some(record.control_width.to_string()),
    }
}

/// Run one replacement over `text`
///
/// Patterns absent from the text are not evaluated, so running a replacement
/// over already substituted text changes nothing. An unresolvable command
/// leaves its placeholder in place.
pub fn run_replacement(text: String, replacement: &Replacement, record: &ExternRecord) -> String {
    if !text.contains(&replacement.pattern) {
        return text;
    }
    match substitution(&replacement.command, record) {
        Some(value) => text.replace(&replacement.pattern, &value),
        None => {
            warn!(
                "could not replace {} using command {} for extern {}",
                replacement.pattern, replacement.command, record.declared_name
            );
            text
        }
    }
}

/// Apply all replacements of an extern type in catalog order
pub fn apply_replacements(text: &str, spec: &ExternTypeSpec, record: &ExternRecord) -> String {
    spec.replacements
        .iter()
        .fold(text.to_string(), |acc, r| run_replacement(acc, r, record))
}

/// Generates extern modules and CPU register files from templates
#[derive(Debug)]
pub struct TemplateEngine<'a> {
    catalog: &'a TypeCatalog,
    store: TemplateStore,
    /// Fail instead of emitting text that still holds placeholders
    strict: bool,
}

impl<'a> TemplateEngine<'a> {
    /// Create an engine reading templates below `templates_dir`
    pub fn new(catalog: &'a TypeCatalog, templates_dir: impl Into<PathBuf>) -> Self {
        Self::with_store(catalog, TemplateStore::with_base_path(templates_dir.into()))
    }

    /// Create an engine over an existing store
    pub fn with_store(catalog: &'a TypeCatalog, store: TemplateStore) -> Self {
        Self {
            catalog,
            store,
            strict: false,
        }
    }

    /// Enable or disable strict placeholder checking
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Instantiate templates for every extern
    ///
    /// Returns the externs with their module names filled in, along with the
    /// generated files. Externs whose directory was not found are skipped.
    pub fn generate(
        &mut self,
        externs: ExternSet,
    ) -> Result<(ExternSet, Vec<GeneratedFile>), TemplateError> {
        let mut files = Vec::new();
        let mut resolved = ExternSet::new();

        for mut record in externs {
            let Some(dir) = record.extern_dir.clone() else {
                warn!(
                    "skipping extern {}: no directory to generate into",
                    record.instance_name
                );
                resolved.insert(record);
                continue;
            };
            record.module_name = module_name(&dir);

            files.extend(self.instantiate(&record, &dir)?);
            resolved.insert(record);
        }

        Ok((resolved, files))
    }

    /// Generate the files of a single extern into `dir`
    pub fn instantiate(
        &mut self,
        record: &ExternRecord,
        dir: &Path,
    ) -> Result<Vec<GeneratedFile>, TemplateError> {
        let catalog = self.catalog;
        let spec = catalog
            .get(&record.extern_type)
            .ok_or_else(|| TemplateError::UnknownType {
                instance: record.instance_name.clone(),
                extern_type: record.extern_type.clone(),
            })?;

        let module_file = format!(
            "{}.v",
            record
                .module_name
                .as_deref()
                .unwrap_or(&record.instance_name)
        );

        let mut outputs = vec![(spec.template_file.clone(), module_file)];
        if record.has_control() {
            outputs.push((
                PathBuf::from(CPU_REGS_TEMPLATE),
                format!("{}_cpu_regs.v", record.prefix_name),
            ));
            outputs.push((
                PathBuf::from(CPU_REGS_DEFINES_TEMPLATE),
                format!("{}_cpu_regs_defines.v", record.prefix_name),
            ));
        }

        let mut files = Vec::with_capacity(outputs.len());
        for (template, file_name) in outputs {
            let text = self.store.load(&template)?;
            let contents = apply_replacements(text, spec, record);
            let path = dir.join(file_name);
            if self.strict {
                check_placeholders(&contents, spec, &path, record)?;
            }
            debug!("extern '{}': generated {}", record.instance_name, path.display());
            files.push(GeneratedFile {
                path,
                contents,
                instance: record.instance_name.clone(),
            });
        }

        Ok(files)
    }
}

/// Fail if any catalog pattern survived substitution
fn check_placeholders(
    contents: &str,
    spec: &ExternTypeSpec,
    file: &Path,
    record: &ExternRecord,
) -> Result<(), TemplateError> {
    match spec.patterns().find(|p| contents.contains(p)) {
        Some(pattern) => Err(TemplateError::UnresolvedPlaceholder {
            pattern: pattern.to_string(),
            file: file.to_path_buf(),
            instance: record.instance_name.clone(),
        }),
        None => Ok(()),
    }
}
