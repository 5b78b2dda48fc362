//! Resolver stages: discovery, control width and base address
//!
//! Each stage takes the extern set by value and returns the enriched set.

pub mod address;
pub mod discovery;
pub mod error;
pub mod width;

pub use address::{address_constant, header_path, resolve_addresses, switch_name, AddressMap};
pub use discovery::discover;
pub use error::ResolveError;
pub use width::{find_extern_dir, find_stub, resolve_widths, CONTROL_ADDR_BUS, HDL_DIR_SUFFIX};
