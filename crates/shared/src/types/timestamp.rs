//! Wall-clock stamps at storage precision.

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to microseconds, the precision of `timestamptz`.
///
/// Stamps taken here compare equal to what a later read returns.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
