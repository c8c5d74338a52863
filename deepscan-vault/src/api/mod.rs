//! HTTP API handlers for deepscan-vault

pub mod health;
pub mod records;
pub mod scan;

pub use health::health_routes;
pub use records::record_routes;
pub use scan::scan_routes;
