//! Audit sink trait — read-only access to the external message store.
//!
//! Messages are written to the store by the managed database integration,
//! not by this service. The gateway only lists the most recent rows so
//! operators can prove that storage is working.

use crate::error::AuditError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Hard upper bound on rows returned by a single audit read.
pub const MAX_AUDIT_ROWS: usize = 20;

/// Row count used when the caller does not ask for one.
pub const DEFAULT_AUDIT_ROWS: usize = 5;

/// One row of the `messages` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRow {
    pub session_identifier: Option<String>,
    pub role: Option<String>,
    pub message_text: Option<String>,
    pub created_time: Option<String>,
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    /// A human-readable backend name (e.g., "supabase", "postgres").
    fn name(&self) -> &str;

    /// The most recent `limit` messages, newest first.
    async fn recent_messages(&self, limit: usize) -> Result<Vec<AuditRow>, AuditError>;
}

/// Turn the raw `limit` query value into a row count.
///
/// The leading integer is used (`"3abc"` reads as 3, `"4.9"` as 4). Missing
/// or non-numeric values fall back to [`DEFAULT_AUDIT_ROWS`]; the result is
/// always within `1..=MAX_AUDIT_ROWS`.
pub fn clamp_limit(raw: Option<&str>) -> usize {
    let parsed = raw
        .and_then(leading_integer)
        .unwrap_or(DEFAULT_AUDIT_ROWS as i64);
    parsed.clamp(1, MAX_AUDIT_ROWS as i64) as usize
}

/// An optional sign followed by at least one ASCII digit, after leading
/// whitespace. Overflowing values saturate.
fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
