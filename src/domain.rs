//! Domain module - order records and traversal bookkeeping
//!
//! This module contains the entities produced by extraction and the pure
//! state used by the traversal controller. Nothing here touches the browser.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod order;
pub mod traversal;

// Re-export commonly used items for convenience
pub use order::{Order, OrderDate, OrderItem};
pub use traversal::{
    OrderCollector, StopReason, TargetSet, TraversalMode, TraversalOutcome, TraversalPhase,
};
