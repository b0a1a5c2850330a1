//! Payment domain activities

mod payment_status;

pub use payment_status::get_payment_status;
