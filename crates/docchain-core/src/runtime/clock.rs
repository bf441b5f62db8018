// crates/docchain-core/src/runtime/clock.rs
// ============================================================================
// Module: DocChain Clocks
// Description: Wall-clock time source for registry timestamps.
// Purpose: Keep wall-clock reads at the host edge of the engine.
// Dependencies: time
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads UTC wall time at millisecond precision. Tests swap
//! in their own [`Clock`] to get deterministic timestamps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;

use crate::core::Timestamp;
use crate::interfaces::Clock;

// ============================================================================
// SECTION: System Clock
// ============================================================================

/// Clock reading the host's UTC wall time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Timestamp::from_unix_millis(i64::try_from(millis).unwrap_or(i64::MAX))
    }
}
