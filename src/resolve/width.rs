//! Control address width resolution from generated stubs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::parser::{find_addr_bus, AddrBus};
use crate::record::ExternSet;

use super::error::ResolveError;

/// Suffix of the per-engine hardware definition directories
pub const HDL_DIR_SUFFIX: &str = ".HDL";

/// Suffix of generated engine stubs
pub const STUB_SUFFIX: &str = ".v.stub";

/// Write address input of an engine's AXI-Lite control interface
pub const CONTROL_ADDR_BUS: &str = "control_S_AXI_AWADDR";

/// Whether `name` is `<instance>.HDL` or `<instance>_*.HDL`
///
/// `reg_rw_10_t.HDL` does not belong to `reg_rw_1`.
fn is_extern_dir_name(name: &str, instance: &str) -> bool {
    match name
        .strip_suffix(HDL_DIR_SUFFIX)
        .and_then(|stem| stem.strip_prefix(instance))
    {
        Some(rest) => rest.is_empty() || rest.starts_with('_'),
        None => false,
    }
}

/// Find the `<instance>_*.HDL` directory under `root`
///
/// The tree is walked depth first in file name order so the result does not
/// depend on directory listing order.
pub fn find_extern_dir(instance: &str, root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .find(|entry| is_extern_dir_name(&entry.file_name().to_string_lossy(), instance))
        .map(|entry| entry.into_path())
}

/// Find the `*<instance>_*.v.stub` file inside an extern directory
pub fn find_stub(instance: &str, extern_dir: &Path) -> Option<PathBuf> {
    let needle = format!("{}_", instance);
    WalkDir::new(extern_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.contains(&needle) && name.ends_with(STUB_SUFFIX)
        })
        .map(|entry| entry.into_path())
}

/// Read a stub and compute the width of its control address bus
///
/// A declared bus whose width cannot be computed is an error naming the stub
/// and the offending range.
pub fn read_control_width(instance: &str, stub: &Path) -> Result<u64, ResolveError> {
    let text = fs::read_to_string(stub).map_err(|e| ResolveError::read(stub, e))?;
    let bus = find_addr_bus(&text, CONTROL_ADDR_BUS)
        .map_err(|errors| ResolveError::parse(stub, errors))?;
    debug!("extern '{}': control address bus {:?}", instance, bus);

    bus.width().ok_or_else(|| {
        let range = match &bus {
            AddrBus::Symbolic(span) => text.get(span.clone()).unwrap_or_default().to_string(),
            AddrBus::Ranged(range) => format!("[{}:{}]", range.msb, range.lsb),
            AddrBus::SingleBit | AddrBus::Absent => String::new(),
        };
        ResolveError::UnresolvedWidth {
            instance: instance.to_string(),
            stub: stub.to_path_buf(),
            range,
        }
    })
}

/// Locate every extern's directory and compute its control width
///
/// An extern whose directory cannot be found keeps a width of 0 and no
/// directory; later stages skip it. A found directory without a readable stub
/// is fatal.
pub fn resolve_widths(externs: ExternSet, switch_dir: &Path) -> Result<ExternSet, ResolveError> {
    externs
        .into_iter()
        .map(|mut record| {
            let Some(dir) = find_extern_dir(&record.instance_name, switch_dir) else {
                warn!(
                    "could not find directory corresponding to extern: {}",
                    record.instance_name
                );
                return Ok(record);
            };

            let stub = find_stub(&record.instance_name, &dir).ok_or_else(|| {
                ResolveError::StubNotFound {
                    instance: record.instance_name.clone(),
                    dir: dir.clone(),
                }
            })?;

            record.control_width = read_control_width(&record.instance_name, &stub)?;
            debug!(
                "extern '{}': {} bit control address bus",
                record.instance_name, record.control_width
            );
            record.extern_dir = Some(dir);
            Ok(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ExternRecord;
    use crate::switch_info::UserEngine;

    fn externs(instances: &[&str]) -> ExternSet {
        instances
            .iter()
            .map(|i| ExternRecord::from_engine(&UserEngine::new(*i, format!("x_{}", i)), "sig1"))
            .collect()
    }

    fn write_stub(root: &Path, dir: &str, file: &str, body: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn test_widths_from_stubs() {
        let tmp = tempfile::tempdir().unwrap();
        write_stub(
            tmp.path(),
            "ranged_0_t.HDL",
            "ranged_0_t_stub.v.stub",
            "module ranged_0_t(input [7:0] control_S_AXI_AWADDR, input clk);",
        );
        write_stub(
            tmp.path(),
            "bare_0_t.HDL",
            "bare_0_t.v.stub",
            "module bare_0_t(input control_S_AXI_AWADDR);",
        );
        write_stub(
            tmp.path(),
            "none_0_t.HDL",
            "none_0_t.v.stub",
            "module none_0_t(input clk, output [3:0] result);",
        );

        let resolved =
            resolve_widths(externs(&["ranged_0", "bare_0", "none_0"]), tmp.path()).unwrap();
        assert_eq!(resolved.get("ranged_0").unwrap().control_width, 8);
        assert_eq!(resolved.get("bare_0").unwrap().control_width, 1);
        assert_eq!(resolved.get("none_0").unwrap().control_width, 0);
        assert_eq!(
            resolved.get("none_0").unwrap().extern_dir.as_deref(),
            Some(tmp.path().join("none_0_t.HDL").as_path())
        );
    }

    #[test]
    fn test_missing_directory_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolve_widths(externs(&["ghost_0"]), tmp.path()).unwrap();
        let record = resolved.get("ghost_0").unwrap();
        assert_eq!(record.control_width, 0);
        assert!(record.extern_dir.is_none());
    }

    #[test]
    fn test_missing_stub_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("lonely_0_t.HDL")).unwrap();
        let err = resolve_widths(externs(&["lonely_0"]), tmp.path()).unwrap_err();
        assert!(matches!(err, ResolveError::StubNotFound { .. }));
    }

    #[test]
    fn test_nested_directory_found() {
        let tmp = tempfile::tempdir().unwrap();
        write_stub(
            tmp.path(),
            "nested/deep/eng_0_t.HDL",
            "eng_0_t.v.stub",
            "input [3:0] control_S_AXI_AWADDR",
        );
        let dir = find_extern_dir("eng_0", tmp.path()).unwrap();
        assert!(dir.ends_with("nested/deep/eng_0_t.HDL"));
        assert_eq!(
            find_stub("eng_0", &dir),
            Some(dir.join("eng_0_t.v.stub"))
        );
    }

    #[test]
    fn test_parameterized_bus_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_stub(
            tmp.path(),
            "param_0_t.HDL",
            "param_0_t.v.stub",
            "module param_0_t(\n  input [C_S_AXI_ADDR_WIDTH-1:0] control_S_AXI_AWADDR,\n  input clk);",
        );
        let err = resolve_widths(externs(&["param_0"]), tmp.path()).unwrap_err();
        match err {
            ResolveError::UnresolvedWidth {
                instance, range, ..
            } => {
                assert_eq!(instance, "param_0");
                assert_eq!(range, "[C_S_AXI_ADDR_WIDTH-1:0]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_full_width_bus_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_stub(
            tmp.path(),
            "wide_0_t.HDL",
            "wide_0_t.v.stub",
            "input [0xffffffffffffffff:0] control_S_AXI_AWADDR",
        );
        let err = resolve_widths(externs(&["wide_0"]), tmp.path()).unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedWidth { .. }));
    }

    #[test]
    fn test_instance_prefix_of_another() {
        let tmp = tempfile::tempdir().unwrap();
        for instance in ["reg_rw_1", "reg_rw_10"] {
            write_stub(
                tmp.path(),
                &format!("{}_t.HDL", instance),
                &format!("{}_t.v.stub", instance),
                "input [3:0] control_S_AXI_AWADDR",
            );
        }
        assert_eq!(
            find_extern_dir("reg_rw_1", tmp.path()),
            Some(tmp.path().join("reg_rw_1_t.HDL"))
        );
        assert_eq!(
            find_extern_dir("reg_rw_10", tmp.path()),
            Some(tmp.path().join("reg_rw_10_t.HDL"))
        );

        let resolved = resolve_widths(externs(&["reg_rw_1", "reg_rw_10"]), tmp.path()).unwrap();
        assert_eq!(resolved.get("reg_rw_1").unwrap().control_width, 4);
        assert_eq!(resolved.get("reg_rw_10").unwrap().control_width, 4);
    }

    #[test]
    fn test_extern_dir_names() {
        assert!(is_extern_dir_name("eng_0.HDL", "eng_0"));
        assert!(is_extern_dir_name("eng_0_t.HDL", "eng_0"));
        assert!(!is_extern_dir_name("eng_01_t.HDL", "eng_0"));
        assert!(!is_extern_dir_name("eng_0_t", "eng_0"));
    }

    #[test]
    fn test_plain_files_are_not_directories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("eng_0_t.HDL"), "").unwrap();
        assert!(find_extern_dir("eng_0", tmp.path()).is_none());
    }
}
