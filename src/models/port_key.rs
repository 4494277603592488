//! Identity keys for monitored devices.
//!
//! A port is identified by a (location, station, port) triple where every
//! component may be missing. Equality is null-safe: `None` matches `None`
//! and nothing else. The derived `PartialEq`/`Hash` give exactly that, and
//! the SQL side uses SQLite's `IS` operator for the same semantics, so every
//! lookup goes through one shared definition of "same device".

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PortKey {
    pub location_id: Option<String>,
    pub station_id: Option<String>,
    pub port_id: Option<String>,
}

impl PortKey {
    pub fn new(
        location_id: Option<String>,
        station_id: Option<String>,
        port_id: Option<String>,
    ) -> Self {
        Self {
            location_id,
            station_id,
            port_id,
        }
    }

    /// The station this port belongs to.
    pub fn station(&self) -> StationKey {
        StationKey {
            location_id: self.location_id.clone(),
            station_id: self.station_id.clone(),
        }
    }
}

/// Identity of a station (group of ports sharing location + station).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StationKey {
    pub location_id: Option<String>,
    pub station_id: Option<String>,
}
