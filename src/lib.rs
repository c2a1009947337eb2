pub mod api;
pub mod core;
pub mod report;
pub mod store;
