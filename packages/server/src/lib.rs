// Sportify - reconciliation core
//
// Background work behind the sports-event backend: coordinate enrichment of
// event addresses, capacity-bounded membership changes and delayed payment
// settlement. The HTTP surface lives elsewhere and calls into `domains`.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
