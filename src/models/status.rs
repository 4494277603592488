//! Status classification sets.
//!
//! Statuses arrive as free-form strings from the upstream feed; the engine
//! only cares about a few classes of them. A missing status never matches
//! any class.

pub const UNAVAILABLE_STATUSES: &[&str] = &["OUT_OF_ORDER", "UNAVAILABLE"];
pub const OCCUPIED_STATUSES: &[&str] =
    &["IN_USE", "FINISHED", "COMPLETED", "OCCUPIED", "CHARGING"];
pub const ACTIVE_CHARGING_STATUSES: &[&str] = &["IN_USE", "CHARGING"];

/// The status that opens and sustains a usage session.
pub const SESSION_STATUS: &str = "IN_USE";

pub fn is_unavailable(status: Option<&str>) -> bool {
    matches!(status, Some(s) if UNAVAILABLE_STATUSES.contains(&s))
}

pub fn is_occupied(status: Option<&str>) -> bool {
    matches!(status, Some(s) if OCCUPIED_STATUSES.contains(&s))
}

pub fn is_active_charging(status: Option<&str>) -> bool {
    matches!(status, Some(s) if ACTIVE_CHARGING_STATUSES.contains(&s))
}

pub fn is_session_active(status: Option<&str>) -> bool {
    status == Some(SESSION_STATUS)
}
