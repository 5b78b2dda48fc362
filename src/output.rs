//! Writing generated files and the consolidated extern defines

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::record::ExternSet;
use crate::template::GeneratedFile;

/// Directory under the software tree that receives a copy of the defines
pub const SW_CLI_DIR: &str = "CLI";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize extern defines: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File name of the consolidated extern defines of a switch
pub fn extern_defines_file(switch: &str) -> String {
    format!("{}_extern_defines.json", switch)
}

/// Consolidated defines as pretty JSON, keyed by prefix name
pub fn extern_defines_json(externs: &ExternSet) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(&externs.by_prefix())?)
}

fn write(path: &Path, contents: &str) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write generated template files to their paths
pub fn write_files(files: &[GeneratedFile]) -> Result<(), OutputError> {
    files.iter().try_for_each(|f| {
        write(&f.path, &f.contents)?;
        debug!("extern '{}': wrote {}", f.instance, f.path.display());
        Ok(())
    })
}

/// Write `<switch>_extern_defines.json` to the test data directory and to
/// `<sw_dir>/CLI`, creating the latter if needed
///
/// Returns the paths written.
pub fn write_extern_defines(
    externs: &ExternSet,
    testdata_dir: &Path,
    sw_dir: &Path,
    switch: &str,
) -> Result<Vec<PathBuf>, OutputError> {
    let json = extern_defines_json(externs)?;
    let file_name = extern_defines_file(switch);

    let cli_dir = sw_dir.join(SW_CLI_DIR);
    fs::create_dir_all(&cli_dir).map_err(|source| OutputError::CreateDir {
        path: cli_dir.clone(),
        source,
    })?;

    let paths = vec![testdata_dir.join(&file_name), cli_dir.join(&file_name)];
    for path in &paths {
        write(path, &json)?;
        debug!("wrote {}", path.display());
    }
    Ok(paths)
}
