//! Order History Extractor - browser-driven order history export
//!
//! Reads a retail account's order-history pages through a WebDriver-controlled
//! browser after the user signs in, and writes the orders as CSV and JSON.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_utils;
