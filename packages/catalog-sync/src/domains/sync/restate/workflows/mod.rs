pub mod catalog_sync;
pub mod stock_check;
pub mod supplier_sync;

pub use catalog_sync::{CatalogSyncWorkflow, CatalogSyncWorkflowClient, CatalogSyncWorkflowImpl};
pub use stock_check::{StockCheckWorkflow, StockCheckWorkflowClient, StockCheckWorkflowImpl};
pub use supplier_sync::{SupplierSyncWorkflow, SupplierSyncWorkflowClient, SupplierSyncWorkflowImpl};
