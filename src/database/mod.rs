//! Destination-side building blocks: cell ranges, declared schemas, catalog
//! reconciliation, insert batches and the database session.
pub mod batch;
pub mod column;
pub mod range;
pub mod reconcile;
pub mod session;
pub mod table;
