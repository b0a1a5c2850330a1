//! Payments domain - payment status and delayed settlement

pub mod activities;
pub mod models;

pub use activities::*;
pub use models::{Payment, PaymentStatus};
