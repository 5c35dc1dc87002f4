//! Foreground loop that keeps reminders fresh without user edits.
//!
//! Passes run on interval boundaries counted from local midnight, and a pass
//! always runs at midnight itself so date-driven reminders roll over with the
//! calendar. There is no queue: each pass is a plain [`sync_all`].

use std::time::Duration as StdDuration;

use chrono::{Duration, Local, NaiveDateTime, NaiveTime, Timelike};
use tracing::{debug, info};

use crate::store::RecordStore;
use crate::sync::{sync_all, SyncStats, SyncWindow};

/// Why a pass ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Interval,
    Midnight,
}

/// When the pass after `now` is due.
///
/// Ticks sit on multiples of `interval_minutes` since midnight; the last tick
/// of a day is pulled back to the following midnight.
pub fn next_run_after(now: NaiveDateTime, interval_minutes: u32) -> NaiveDateTime {
    let interval = i64::from(interval_minutes.max(1));
    let since_midnight = i64::from(now.time().num_seconds_from_midnight()) / 60;
    let next_slot = (since_midnight / interval + 1) * interval;
    let midnight = now.date().and_time(NaiveTime::MIN) + Duration::days(1);
    let candidate = now.date().and_time(NaiveTime::MIN) + Duration::minutes(next_slot);
    candidate.min(midnight)
}

pub fn pass_kind(at: NaiveDateTime) -> PassKind {
    if at.time() == NaiveTime::MIN {
        PassKind::Midnight
    } else {
        PassKind::Interval
    }
}

/// Runs one pass over every source type as of `now`.
pub fn run_pass<S: RecordStore + ?Sized>(
    store: &S,
    now: NaiveDateTime,
    kind: PassKind,
    horizon_days: i64,
) -> SyncStats {
    let stats = sync_all(store, SyncWindow::new(now.date(), horizon_days));
    info!(
        ?kind,
        at = %now,
        created = stats.created,
        updated = stats.updated,
        retired = stats.retired,
        "scheduled pass finished"
    );
    stats
}

/// Runs a pass now, then one per tick, forever.
pub fn run<S: RecordStore + ?Sized>(store: &S, interval_minutes: u32, horizon_days: i64) {
    let mut now = Local::now().naive_local();
    run_pass(store, now, PassKind::Interval, horizon_days);
    loop {
        let next = next_run_after(now, interval_minutes);
        let wait = (next - Local::now().naive_local())
            .to_std()
            .unwrap_or(StdDuration::ZERO);
        debug!(next = %next, wait_secs = wait.as_secs(), "sleeping until next pass");
        std::thread::sleep(wait);
        // after a suspend, skip the missed ticks rather than replaying them
        now = next.max(Local::now().naive_local());
        run_pass(store, now, pass_kind(next), horizon_days);
    }
}
