//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod alert_log_repo;
pub mod product_repo;

pub use alert_log_repo::AlertLogRepo;
pub use product_repo::ProductRepo;
