//! Health evaluation: reachability probe plus cache-derived freshness and
//! sync-ratio signals.

mod evaluator;
mod probe;


pub use evaluator::HealthEvaluator;
pub use probe::{HttpProbe, ServiceProbe};
