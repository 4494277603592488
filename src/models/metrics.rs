//! Utilization accumulators and derived metrics.

use serde::{Deserialize, Serialize};

/// Raw utilization totals for one port, or a merged set of ports.
///
/// Accumulation is associative and commutative, so totals can be merged up
/// from port to station to location to the whole network in any order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub sessions: f64,
    pub monitored_seconds: f64,
    pub available_seconds: f64,
    pub occupied_seconds: f64,
    pub active_seconds: f64,
    pub port_count: f64,
}

impl Totals {
    pub fn accumulate(&mut self, other: &Totals) {
        self.sessions += other.sessions;
        self.monitored_seconds += other.monitored_seconds;
        self.available_seconds += other.available_seconds;
        self.occupied_seconds += other.occupied_seconds;
        self.active_seconds += other.active_seconds;
        self.port_count += other.port_count;
    }

    /// Derive presentation metrics. Every ratio falls back to 0.0 when its
    /// denominator is 0 so empty windows never fault.
    pub fn metrics(&self) -> UtilizationMetrics {
        let hours = self.monitored_seconds / 3600.0;
        let days = self.monitored_seconds / 86400.0;
        UtilizationMetrics {
            sessions: self.sessions,
            monitored_seconds: self.monitored_seconds,
            monitored_hours: hours,
            monitored_days: days,
            available_seconds: self.available_seconds,
            occupied_seconds: self.occupied_seconds,
            active_seconds: self.active_seconds,
            session_count_per_day: if days > 0.0 { self.sessions / days } else { 0.0 },
            session_count_per_hour: if hours > 0.0 { self.sessions / hours } else { 0.0 },
            occupation_utilization_pct: if self.available_seconds > 0.0 {
                self.occupied_seconds / self.available_seconds * 100.0
            } else {
                0.0
            },
            active_charging_utilization_pct: if self.available_seconds > 0.0 {
                self.active_seconds / self.available_seconds * 100.0
            } else {
                0.0
            },
            availability_ratio: if self.monitored_seconds > 0.0 {
                self.available_seconds / self.monitored_seconds
            } else {
                0.0
            },
        }
    }
}

/// Formatted utilization figures as exposed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtilizationMetrics {
    pub sessions: f64,
    pub monitored_seconds: f64,
    pub monitored_hours: f64,
    pub monitored_days: f64,
    pub available_seconds: f64,
    pub occupied_seconds: f64,
    pub active_seconds: f64,
    pub session_count_per_day: f64,
    pub session_count_per_hour: f64,
    pub occupation_utilization_pct: f64,
    pub active_charging_utilization_pct: f64,
    pub availability_ratio: f64,
}
