//! Application layer module
//!
//! This module contains the traversal controller and the session that
//! orchestrates a complete extraction run.

pub mod extraction_session;
pub mod order_traversal;
pub mod target_orders;

pub use extraction_session::{ExtractionSession, RunSummary, SessionError};
pub use order_traversal::{OrderTraversal, TraversalError};
pub use target_orders::{TEST_ORDER_NUMBERS, parse_order_numbers};
