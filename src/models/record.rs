//! Ingestion-boundary record shape.

use serde::{Deserialize, Serialize};

use super::port_key::PortKey;

/// One device status record as supplied by the upstream fetch client.
///
/// Every field is optional: the feed is tolerated as-is and normalized here,
/// at the boundary, instead of sprinkling null checks downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortRecord {
    pub location_id: Option<String>,
    pub station_id: Option<String>,
    pub port_id: Option<String>,
    pub status: Option<String>,
    pub last_updated: Option<String>,
}

impl PortRecord {
    pub fn key(&self) -> PortKey {
        PortKey::new(
            self.location_id.clone(),
            self.station_id.clone(),
            self.port_id.clone(),
        )
    }
}
