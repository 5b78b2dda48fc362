//! extern-gen - register interface generator for P4 switch externs
//!
//! Reads a compiled switch description, finds the engines that implement a
//! known extern type, works out the width and base address of each engine's
//! control interface, and instantiates the HDL templates for it.
//!
//! # Example
//!
//! ```no_run
//! use extern_gen::{generate, write_outputs, GenerateConfig};
//!
//! let config = GenerateConfig::new(
//!     "nf_sume_sdnet_ip/SimpleSumeSwitch/Switch.json",
//!     "nf_sume_sdnet_ip/SimpleSumeSwitch",
//!     "templates",
//! )
//! .with_base_address(0x4402_0000);
//!
//! let generated = generate(&config).unwrap();
//! write_outputs(&generated, "testdata".as_ref(), "sw".as_ref()).unwrap();
//! ```

pub mod catalog;
pub mod error;
pub mod output;
pub mod parser;
pub mod record;
pub mod resolve;
pub mod switch_info;
pub mod template;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub use catalog::{CatalogError, TypeCatalog};
pub use error::ParseError;
pub use output::OutputError;
pub use record::{ExternRecord, ExternSet};
pub use resolve::ResolveError;
pub use switch_info::{SwitchInfo, SwitchInfoError};
pub use template::{GeneratedFile, TemplateEngine, TemplateError};

/// Default start address of the switch register space
pub const DEFAULT_BASE_ADDRESS: u64 = 0x4402_0000;

/// Errors that can occur during generation
#[derive(Debug, Error)]
pub enum GenError {
    #[error("switch description: {0}")]
    SwitchInfo(#[from] SwitchInfoError),

    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("template: {0}")]
    Template(#[from] TemplateError),

    #[error("output: {0}")]
    Output(#[from] OutputError),

    /// The switch directory has no usable name to derive the switch from
    #[error("cannot derive switch name from {}", .0.display())]
    InvalidSwitchDir(PathBuf),
}

/// Configuration for a generation run
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Switch description JSON
    pub switch_info: PathBuf,
    /// Switch hardware definition directory, named after the switch
    pub switch_dir: PathBuf,
    /// Directory holding the extern templates
    pub templates_dir: PathBuf,
    pub base_address: u64,
    pub catalog: TypeCatalog,
    /// Fail on placeholders left after substitution
    pub strict: bool,
}

impl GenerateConfig {
    /// Create a configuration with the default catalog and base address
    pub fn new(
        switch_info: impl Into<PathBuf>,
        switch_dir: impl Into<PathBuf>,
        templates_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            switch_info: switch_info.into(),
            switch_dir: switch_dir.into(),
            templates_dir: templates_dir.into(),
            base_address: DEFAULT_BASE_ADDRESS,
            catalog: TypeCatalog::default(),
            strict: false,
        }
    }

    /// Set the switch base address
    pub fn with_base_address(mut self, base_address: u64) -> Self {
        self.base_address = base_address;
        self
    }

    /// Set the extern type catalog
    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Enable or disable strict placeholder checking
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Result of a generation run, not yet written to disk
#[derive(Debug)]
pub struct Generated {
    /// Switch name, from the switch directory
    pub switch: String,
    pub externs: ExternSet,
    pub files: Vec<GeneratedFile>,
}

/// Run discovery, both resolvers and template instantiation
pub fn generate(config: &GenerateConfig) -> Result<Generated, GenError> {
    let switch = resolve::switch_name(&config.switch_dir)
        .ok_or_else(|| GenError::InvalidSwitchDir(config.switch_dir.clone()))?;
    let info = SwitchInfo::from_file(&config.switch_info)?;

    let externs = resolve::discover(&info, &config.catalog);
    info!(
        "discovered {} externs among {} engines",
        externs.len(),
        info.user_engines.len()
    );

    let externs = resolve::resolve_widths(externs, &config.switch_dir)?;
    info!(
        "{} externs with a control interface",
        externs.iter().filter(|r| r.has_control()).count()
    );

    let externs =
        resolve::resolve_addresses(externs, &config.switch_dir, &switch, config.base_address)?;

    let mut engine =
        TemplateEngine::new(&config.catalog, &config.templates_dir).with_strict(config.strict);
    let (externs, files) = engine.generate(externs)?;
    info!("instantiated {} files", files.len());

    Ok(Generated {
        switch,
        externs,
        files,
    })
}

/// Write generated files and the extern defines
///
/// Returns the paths of the defines files.
pub fn write_outputs(
    generated: &Generated,
    testdata_dir: &Path,
    sw_dir: &Path,
) -> Result<Vec<PathBuf>, GenError> {
    output::write_files(&generated.files)?;
    let defines = output::write_extern_defines(
        &generated.externs,
        testdata_dir,
        sw_dir,
        &generated.switch,
    )?;
    info!(
        "wrote {} files and {} defines files",
        generated.files.len(),
        defines.len()
    );
    Ok(defines)
}
