pub mod metrics;
pub mod port_key;
pub mod record;
pub mod rules;
pub mod status;
