//! Per-caller session state and the event dispatch machine.

mod machine;
mod types;

pub use machine::{SessionAction, SessionEvent};
pub use types::{Awaiting, SessionState};
