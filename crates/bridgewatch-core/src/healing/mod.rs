//! Auto-healing: a pure state machine plus the async controller that performs
//! its dispatches and alerts.

mod controller;
mod machine;


pub use controller::AutoHealingController;
pub use machine::{HealingMachine, Transition};
