//! # Upkeep
//!
//! Maintenance and reminder scheduling for a household or farm.
//!
//! Maintenance items (animal care, plant watering, vehicle service, ...)
//! describe obligations that recur every so many days, hours or miles. The
//! engine turns the ones coming due into calendar reminders, merging items
//! that share a day, a reason and a place into a single reminder, keeps those
//! reminders in step as items change, and feeds a completed reminder back
//! into every item behind it so the cycle repeats.
//!
//! * [`due`] computes next-due dates and status.
//! * [`grouping`] and [`provenance`] build the keys that tie reminders to items.
//! * [`sync`] reconciles reminders with the items currently due.
//! * [`completion`] propagates "done" back to the items.
//! * [`recurrence`] projects recurring user tasks onto calendar dates.

pub mod commands;
pub mod completion;
pub mod config;
pub mod due;
pub mod error;
pub mod grouping;
pub mod models;
pub mod provenance;
pub mod recurrence;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod sync;
pub mod tui;

pub use error::{Result, UpkeepError};
