//! Error types for the resolver stages

use std::path::PathBuf;

use thiserror::Error;

use crate::error::ParseError;

/// Fatal errors while resolving extern widths and addresses
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The extern directory exists but holds no matching stub
    #[error("could not find stub file for extern '{instance}' in {}", dir.display())]
    StubNotFound { instance: String, dir: PathBuf },

    /// A stub or header could not be read
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stub or header could not be tokenized into declarations
    #[error("could not parse {}: {}", path.display(), format_errors(.errors))]
    Parse {
        path: PathBuf,
        errors: Vec<ParseError>,
    },

    /// The control address range is declared but its width cannot be computed
    #[error("cannot compute control address width of extern '{instance}' from range {range} in {}", stub.display())]
    UnresolvedWidth {
        instance: String,
        stub: PathBuf,
        range: String,
    },

    /// A control-bearing extern has no start address constant
    #[error("cannot find address for {instance} in {} (expected {constant})", header.display())]
    MissingAddress {
        instance: String,
        constant: String,
        header: PathBuf,
    },

    /// Switch base address plus offset does not fit in 64 bits
    #[error("base address {base:#x} + offset {offset:#x} of extern '{instance}' overflows")]
    AddressOverflow {
        instance: String,
        base: u64,
        offset: u64,
    },
}

fn format_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ResolveError {
    /// Create a read error for `path`
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error for `path`
    pub fn parse(path: impl Into<PathBuf>, errors: Vec<ParseError>) -> Self {
        Self::Parse {
            path: path.into(),
            errors,
        }
    }
}
