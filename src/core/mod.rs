pub mod analyze;
pub mod fingerprint;
pub mod intervals;
pub mod series;
pub mod stats;
pub mod timeline;
pub mod usage;
pub mod utilization;
