//! Timestamp utilities
//!
//! Timestamps are stored as RFC 3339 TEXT columns; every row mapper goes
//! through these helpers so the format stays uniform.

use crate::Result;
use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for a TEXT column
pub fn to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// Parse a stored TEXT column back into a UTC timestamp
pub fn parse_db(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Parse an optional TEXT column (nullable timestamp fields)
pub fn parse_db_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    s.map(parse_db).transpose()
}
