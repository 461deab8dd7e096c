//! Countdown Deck - a multi-timer countdown engine
//! 
//! This library tracks independent countdown timers, advances them from a
//! shared background tick loop and notifies observers on every tick and on
//! completion. Timers are persisted in named profiles and can be driven over
//! a small HTTP API.

pub mod config;
pub mod error;
pub mod state;
pub mod scheduler;
pub mod profile;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{ProfileError, TimerError};
pub use state::{AppState, Timer, TimerAction, TimerId, TimerRecord, TimerState};
pub use scheduler::{Clock, Scheduler, SchedulerStatus, TimerUpdate};
pub use profile::{Profile, ProfileStore, Session};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
