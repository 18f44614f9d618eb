//! In-process workflows driven by the local runtime

pub mod catalog_sync;
pub mod stock_check;
pub mod supplier_sync;

pub use catalog_sync::{settle_all, CatalogSyncCoordinator};
pub use stock_check::StockCheckWorkflow;
pub use supplier_sync::{StatusHandle, SupplierSyncWorkflow};
