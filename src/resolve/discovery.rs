//! Matching declared engines against the extern type catalog

use tracing::debug;

use crate::catalog::TypeCatalog;
use crate::record::{ExternRecord, ExternSet};
use crate::switch_info::SwitchInfo;

/// Build one record per engine whose declared name contains a known signature
///
/// Signatures are tried in catalog order and the first one contained in the
/// declared name wins. Engines matching nothing are not externs and are left
/// out.
pub fn discover(info: &SwitchInfo, catalog: &TypeCatalog) -> ExternSet {
    info.user_engines
        .iter()
        .filter_map(|engine| match catalog.match_name(&engine.declared_name) {
            Some(spec) => {
                debug!(
                    "engine '{}' ({}) is a {} extern",
                    engine.instance_name, engine.declared_name, spec.signature
                );
                Some(ExternRecord::from_engine(engine, &spec.signature))
            }
            None => {
                debug!("engine '{}' is not an extern", engine.declared_name);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch_info::{FieldDescriptor, UserEngine};

    fn catalog() -> TypeCatalog {
        TypeCatalog::from_str(
            r#"
[[extern]]
signature = "sig1"
template_file = "sig1.v"

[[extern]]
signature = "reg_rw"
template_file = "reg_rw.v"

[[extern]]
signature = "rw"
template_file = "rw.v"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_discover_matching_engines() {
        let info = SwitchInfo {
            user_engines: vec![
                UserEngine::new("sig1_0", "myeng_sig1")
                    .with_input(FieldDescriptor::new("index", 3, 0)),
                UserEngine::new("lpm_0", "ipv4_lpm"),
                UserEngine::new("reg_rw_0", "pkt_count_reg_rw"),
            ],
        };
        let externs = discover(&info, &catalog());
        assert_eq!(externs.len(), 2);

        let sig1 = externs.get("sig1_0").unwrap();
        assert_eq!(sig1.extern_type, "sig1");
        assert_eq!(sig1.prefix_name, "myeng");
        assert_eq!(sig1.input_tuple[0].field_name, "index");
        assert_eq!(sig1.control_width, 0);

        let reg = externs.get("reg_rw_0").unwrap();
        // "rw" also matches, but "reg_rw" comes first in the catalog
        assert_eq!(reg.extern_type, "reg_rw");
        assert_eq!(reg.prefix_name, "pkt_count");

        assert!(externs.get("lpm_0").is_none());
    }

    #[test]
    fn test_discover_keeps_declaration_order() {
        let info = SwitchInfo {
            user_engines: vec![
                UserEngine::new("z", "z_sig1"),
                UserEngine::new("a", "a_sig1"),
            ],
        };
        let externs = discover(&info, &catalog());
        let names: Vec<_> = externs.iter().map(|r| r.instance_name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn test_discover_nothing() {
        let info = SwitchInfo {
            user_engines: vec![UserEngine::new("lpm_0", "ipv4_lpm")],
        };
        assert!(discover(&info, &catalog()).is_empty());
    }
}
