//! State management module
//! 
//! This module contains the timer state machine and the shared server state.

pub mod app_state;
pub mod timer;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use timer::{Advance, StateRecord, Timer, TimerId, TimerRecord};
pub use timer_state::{TimerAction, TimerState, UnknownAction};
