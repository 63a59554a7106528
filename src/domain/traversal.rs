//! Traversal domain logic
//!
//! Responsibility:
//! - traversal modes and the phase state machine
//! - found-set bookkeeping (dedup by order id, target resolution)
//! - the outcome handed to the export stage

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::order::Order;

/// Which traversal strategy a run uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalMode {
    /// Walk every listing page (bounded by `max_pages`)
    FullScan,
    /// Search for specific order ids, then fall back to a filtered scan
    TargetedSearch { targets: Vec<String> },
}

impl TraversalMode {
    /// Targeted search when any targets are given, full scan otherwise
    pub fn from_targets(targets: &[String]) -> Self {
        if targets.is_empty() {
            Self::FullScan
        } else {
            Self::TargetedSearch { targets: targets.to_vec() }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullScan => "full_scan",
            Self::TargetedSearch { .. } => "targeted_search",
        }
    }
}

/// Phase of a traversal.
///
/// Full scan: `Scanning(n) -> Scanning(n + 1) | Done`.
/// Targeted: `Searching -> FallbackScanning -> Done` (fallback skipped when
/// every target was found by search).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalPhase {
    Scanning { page: u32 },
    Searching { remaining: usize },
    FallbackScanning { remaining: usize },
    Done,
}

impl fmt::Display for TraversalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scanning { page } => write!(f, "Scanning(page {page})"),
            Self::Searching { remaining } => write!(f, "Searching({remaining} remaining)"),
            Self::FallbackScanning { remaining } => {
                write!(f, "FallbackScanning({remaining} remaining)")
            }
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Why a scan stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No "next" control on the last page
    NoNextPage,
    /// "next" control present but disabled
    NextDisabled,
    /// Configured page ceiling reached
    PageLimit(u32),
    /// Advancing to the next page failed
    NavigationFailed(String),
    /// Every target id has been found
    AllTargetsResolved,
    /// Targeted search finished without needing the fallback scan
    SearchComplete,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoNextPage => write!(f, "no next page"),
            Self::NextDisabled => write!(f, "next page control disabled"),
            Self::PageLimit(limit) => write!(f, "page limit {limit} reached"),
            Self::NavigationFailed(reason) => write!(f, "navigation failed: {reason}"),
            Self::AllTargetsResolved => write!(f, "all target orders found"),
            Self::SearchComplete => write!(f, "search complete"),
        }
    }
}

/// Accumulates orders in discovery order, suppressing duplicate ids
#[derive(Debug, Default)]
pub struct OrderCollector {
    orders: Vec<Order>,
    seen: HashSet<String>,
}

impl OrderCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the order unless its id was already collected. Returns whether it was added.
    pub fn accept(&mut self, order: Order) -> bool {
        if self.seen.contains(&order.order_id) {
            return false;
        }
        self.seen.insert(order.order_id.clone());
        self.orders.push(order);
        true
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.seen.contains(order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn into_orders(self) -> Vec<Order> {
        self.orders
    }
}

/// Target order ids for a targeted search, in input order
#[derive(Debug, Clone)]
pub struct TargetSet {
    targets: Vec<String>,
    found: HashSet<String>,
}

impl TargetSet {
    /// Builds the set from already-normalized ids; blanks and repeats are dropped
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut targets: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            if !id.is_empty() && !targets.contains(&id) {
                targets.push(id);
            }
        }
        Self {
            targets,
            found: HashSet::new(),
        }
    }

    pub fn is_remaining(&self, order_id: &str) -> bool {
        !self.found.contains(order_id) && self.targets.iter().any(|t| t == order_id)
    }

    /// Marks a target found. Returns false when it is not a target or already found.
    pub fn resolve(&mut self, order_id: &str) -> bool {
        if self.is_remaining(order_id) {
            self.found.insert(order_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn remaining(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter(|t| !self.found.contains(*t))
            .cloned()
            .collect()
    }

    pub fn remaining_count(&self) -> usize {
        self.targets.len() - self.found.len()
    }

    pub fn all_resolved(&self) -> bool {
        self.remaining_count() == 0
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Result of a traversal run
#[derive(Debug)]
pub struct TraversalOutcome {
    pub mode: &'static str,
    /// Orders in discovery order, unique by id
    pub orders: Vec<Order>,
    pub pages_visited: u32,
    pub stop_reason: StopReason,
    /// Targets never found by search or fallback scan
    pub unresolved_targets: Vec<String>,
    /// Order cards dropped by the extractor
    pub skipped_orders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderDate;
    use chrono::NaiveDate;

    fn order(id: &str) -> Order {
        Order::new(id, OrderDate::from(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap()))
    }

    #[test]
    fn collector_keeps_first_occurrence_only() {
        let mut collector = OrderCollector::new();
        assert!(collector.accept(order("1-2-3")));
        assert!(!collector.accept(order("1-2-3").with_total(9.99)));
        assert!(collector.accept(order("4-5-6")));

        let orders = collector.into_orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id, "1-2-3");
        assert_eq!(orders[0].order_total, None);
        assert_eq!(orders[1].order_id, "4-5-6");
    }

    #[test]
    fn target_set_dedups_and_keeps_input_order() {
        let targets = TargetSet::new(["b", "a", "b", "", "c"]);
        assert_eq!(targets.len(), 3);
        assert_eq!(targets.remaining(), vec!["b", "a", "c"]);
    }

    #[test]
    fn target_resolution_is_idempotent() {
        let mut targets = TargetSet::new(["1-1-1", "2-2-2"]);
        assert!(targets.resolve("1-1-1"));
        assert!(!targets.resolve("1-1-1"));
        assert!(!targets.resolve("9-9-9"));
        assert!(!targets.is_remaining("1-1-1"));
        assert_eq!(targets.remaining(), vec!["2-2-2"]);
        assert!(targets.resolve("2-2-2"));
        assert!(targets.all_resolved());
    }

    #[test]
    fn mode_from_targets() {
        assert_eq!(TraversalMode::from_targets(&[]), TraversalMode::FullScan);
        assert_eq!(
            TraversalMode::from_targets(&["1-2-3".to_string()]).label(),
            "targeted_search"
        );
    }
}
