//! Post-commit notification routing.
//!
//! The [`StockAlertRouter`] subscribes to the event bus and hands every
//! committed stock change to the automatic dispatch path.

pub mod router;

pub use router::StockAlertRouter;
