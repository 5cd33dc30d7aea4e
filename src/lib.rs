//! Filtering and aggregation for a daily engagement dashboard.

pub mod dashboard;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod report;
pub mod source;
