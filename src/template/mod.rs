//! Template instantiation for extern modules and CPU register files
//!
//! Templates are plain HDL text holding catalog placeholders such as
//! `@MODULE_NAME@`. Each placeholder is replaced by the value its catalog
//! command computes from an extern record.

mod engine;
mod store;

pub use engine::{
    apply_replacements, module_name, run_replacement, GeneratedFile, TemplateEngine,
    CPU_REGS_DEFINES_TEMPLATE, CPU_REGS_TEMPLATE,
};
pub use store::{TemplateError, TemplateStore};
