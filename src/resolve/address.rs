//! Control register base addresses from the switch header

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::parser::parse_defines;
use crate::record::ExternSet;

use super::error::ResolveError;

/// Name of the switch, taken from its hardware definition directory
pub fn switch_name(switch_dir: &Path) -> Option<String> {
    switch_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            switch_dir
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
}

/// Path of the generated `<switch>.h` header
pub fn header_path(switch_dir: &Path, switch: &str) -> PathBuf {
    switch_dir.join(format!("{}.h", switch))
}

/// Header constant holding an extern's offset within the switch
pub fn address_constant(switch: &str, instance: &str) -> String {
    format!("{}__{}__START_ADDRESS", switch, instance)
}

/// Integer constants of a switch header, first definition wins
#[derive(Debug, Clone, Default)]
pub struct AddressMap {
    defines: HashMap<String, u64>,
}

impl AddressMap {
    /// Parse the defines of a header
    pub fn parse(header: &Path, text: &str) -> Result<Self, ResolveError> {
        let mut defines = HashMap::new();
        for define in parse_defines(text).map_err(|errors| ResolveError::parse(header, errors))? {
            defines.entry(define.name).or_insert(define.value);
        }
        Ok(Self { defines })
    }

    /// Read and parse a header file
    pub fn from_file(header: &Path) -> Result<Self, ResolveError> {
        let text = fs::read_to_string(header).map_err(|e| ResolveError::read(header, e))?;
        Self::parse(header, &text)
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.defines.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }
}

/// Assign offset and absolute base address to every control-bearing extern
///
/// The header is read even when no extern has a control interface.
pub fn resolve_addresses(
    externs: ExternSet,
    switch_dir: &Path,
    switch: &str,
    base_address: u64,
) -> Result<ExternSet, ResolveError> {
    let header = header_path(switch_dir, switch);
    let addresses = AddressMap::from_file(&header)?;
    if addresses.is_empty() {
        debug!("no integer defines in {}", header.display());
    } else {
        debug!("{} defines in {}", addresses.len(), header.display());
    }

    externs
        .into_iter()
        .map(|mut record| {
            if !record.has_control() {
                return Ok(record);
            }

            let constant = address_constant(switch, &record.instance_name);
            let offset = addresses
                .get(&constant)
                .ok_or_else(|| ResolveError::MissingAddress {
                    instance: record.instance_name.clone(),
                    constant: constant.clone(),
                    header: header.clone(),
                })?;
            let base = base_address
                .checked_add(offset)
                .ok_or_else(|| ResolveError::AddressOverflow {
                    instance: record.instance_name.clone(),
                    base: base_address,
                    offset,
                })?;

            debug!(
                "extern '{}': offset {:#x}, base address {:#x}",
                record.instance_name, offset, base
            );
            record.addr_offset = Some(offset);
            record.base_addr = Some(base);
            Ok(record)
        })
        .collect()
}
