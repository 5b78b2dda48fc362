//! Parsers for generated stubs, switch headers and catalog commands

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::{find_addr_bus, parse_command, parse_defines, parse_ports};
