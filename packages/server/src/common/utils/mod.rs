pub mod address;
pub mod geocoding;

pub use address::*;
pub use geocoding::*;
