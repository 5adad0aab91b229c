//! View-model layer of the console: everything the pages do, minus the markup.

pub mod actions;
pub mod charts;
pub mod dashboard;
pub mod detail;
pub mod list;
pub mod metrics;
pub mod poller;
pub mod query;
pub mod selection;
