//! Freshness path: registry → shared bridge session → account cache.

mod cycle;
mod scheduler;

#[cfg(test)]
mod tests;

pub use cycle::SessionCycleRunner;
pub use scheduler::{CycleOutcome, RefreshScheduler, SyncTrigger};
