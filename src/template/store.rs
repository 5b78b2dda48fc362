//! Template store for loading and caching template texts

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while instantiating templates
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Error reading a template file
    #[error("could not read template file {}: {message}", path.display())]
    FileReadError { path: PathBuf, message: String },

    /// Record tagged with a type the catalog does not know
    #[error("extern '{instance}' has unknown type '{extern_type}'")]
    UnknownType {
        instance: String,
        extern_type: String,
    },

    /// Placeholder still present after substitution (strict mode)
    #[error("placeholder {pattern} left unresolved in {} for extern '{instance}'", file.display())]
    UnresolvedPlaceholder {
        pattern: String,
        file: PathBuf,
        instance: String,
    },
}

/// Template texts read from a templates directory
///
/// Each file is read at most once per store.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<PathBuf, String>,
    /// Base path for resolving relative file paths
    base_path: Option<PathBuf>,
}

impl TemplateStore {
    /// Create a new empty store resolving paths as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new store with a base path for file resolution
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            templates: HashMap::new(),
            base_path: Some(base_path),
        }
    }

    /// Resolve a relative path against the base path
    pub fn resolve_path(&self, relative: &Path) -> PathBuf {
        if let Some(base) = &self.base_path {
            base.join(relative)
        } else {
            relative.to_path_buf()
        }
    }

    /// Register template text directly, bypassing the file system
    pub fn insert(&mut self, relative: impl Into<PathBuf>, text: impl Into<String>) {
        let path = self.resolve_path(&relative.into());
        self.templates.insert(path, text.into());
    }

    /// Check if a template has been loaded
    pub fn contains(&self, relative: &Path) -> bool {
        self.templates.contains_key(&self.resolve_path(relative))
    }

    /// Load a template, reading it from disk on first use
    pub fn load(&mut self, relative: &Path) -> Result<&str, TemplateError> {
        let full_path = self.resolve_path(relative);

        let text = match self.templates.entry(full_path) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let content = std::fs::read_to_string(entry.key()).map_err(|e| {
                    TemplateError::FileReadError {
                        path: entry.key().clone(),
                        message: e.to_string(),
                    }
                })?;
                entry.insert(content)
            }
        };
        Ok(text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reads_once() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.v"), "module a;").unwrap();

        let mut store = TemplateStore::with_base_path(tmp.path().to_path_buf());
        assert_eq!(store.load(Path::new("a.v")).unwrap(), "module a;");

        // Cached copy survives the file going away
        std::fs::remove_file(tmp.path().join("a.v")).unwrap();
        assert_eq!(store.load(Path::new("a.v")).unwrap(), "module a;");
        assert!(store.contains(Path::new("a.v")));
    }

    #[test]
    fn test_missing_template_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = TemplateStore::with_base_path(tmp.path().to_path_buf());
        let err = store.load(Path::new("externs/missing.v")).unwrap_err();
        match err {
            TemplateError::FileReadError { path, .. } => {
                assert_eq!(path, tmp.path().join("externs/missing.v"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_insert_without_base_path() {
        let mut store = TemplateStore::new();
        store.insert("t.v", "@X@");
        assert_eq!(store.load(Path::new("t.v")).unwrap(), "@X@");
        assert_eq!(store.resolve_path(Path::new("t.v")), PathBuf::from("t.v"));
    }
}
