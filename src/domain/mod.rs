//! Domain types for the print shop: print settings and their pricing, uploaded
//! files, payment requests, the payment verification state machine and placed
//! orders. Nothing in here performs I/O or reads a clock.

pub mod file;
pub mod order;
pub mod payment;
pub mod ports;
pub mod pricing;
pub mod settings;
pub mod verification;
