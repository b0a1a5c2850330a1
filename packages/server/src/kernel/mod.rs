//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod enrichment;
pub mod resolver;
pub mod service_host;
pub mod settlement;
pub mod stores;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use enrichment::{start_background_workers, CoordinateQueue, RefreshSettings};
pub use resolver::{CoordinateResolver, ResolveError};
pub use service_host::{RunningServices, Service, ServiceHost};
pub use settlement::{SettlementScheduler, ShutdownMode, DEFAULT_SETTLEMENT_DELAY};
pub use stores::{PostgresEventStore, PostgresPaymentStore};
pub use test_dependencies::TestDependencies;
pub use traits::*;
