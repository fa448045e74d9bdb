//! Periodic backup scheduling
//!
//! The scheduler runs one backup cycle per period, forever:
//!
//! ```text
//! Idle -> Waiting -> Running -> Recording -> Pruning -> Idle
//! ```
//!
//! - **Waiting**: sleep until the next period boundary counted from the Unix
//!   epoch, so a one hour period fires on the hour regardless of when the
//!   process started. With `first_wait = false` the first cycle starts
//!   immediately.
//! - **Running**: a [`DumpRunner`] writes the whole keyspace to a new
//!   `redis-backup-<local time>.resp` file. A failed dump has its partial
//!   file removed and the cycle is abandoned; the next period is the retry.
//! - **Recording**: the run is appended to `metadata.json`.
//! - **Pruning**: dump files beyond `keep_last` are deleted, oldest first.
//!
//! An error anywhere in a cycle is logged and alerted, and the loop carries on.

pub mod operations;
pub mod runner;

pub use operations::BackupScheduler;
pub use runner::{DumpRunner, RedisDumpRunner};

/// Start of the next period after `now`, both in seconds since the epoch.
///
/// A `now` sitting exactly on a boundary yields the following boundary.
pub fn next_backup_time(now: f64, period: f64) -> f64 {
    ((now / period).floor() + 1.0) * period
}
