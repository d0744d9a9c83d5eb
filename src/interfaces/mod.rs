//! Outer formats used by the command line: shop configuration, order requests
//! and CSV output.

pub mod config;
pub mod csv;
pub mod request;
