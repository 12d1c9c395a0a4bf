//! Reconciliation logic shared by every managed resource kind

pub mod resource;

pub use resource::{delete, reconcile, record_failure, update_status, Reconciled};
