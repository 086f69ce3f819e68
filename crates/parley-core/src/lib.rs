//! Core systems for Parley.
//!
//! This crate provides the building blocks the connection layer is wired
//! together with:
//!
//! - **Signal/Slot System**: Type-safe notification of UI collaborators
//! - **Timers**: One-shot timers behind the [`Scheduler`] trait
//! - **Clocks**: A wall clock for production and a [`ManualClock`] for tests
//!
//! # Signal/Slot Example
//!
//! ```
//! use parley_core::Signal;
//!
//! let line_rendered = Signal::<String>::new();
//!
//! let conn_id = line_rendered.connect(|line| {
//!     println!("render: {}", line);
//! });
//!
//! line_rendered.emit("Connected to server".to_string());
//! line_rendered.disconnect(conn_id);
//! ```
//!
//! # Timer Example
//!
//! ```
//! use parley_core::{ManualClock, Scheduler, TimerManager};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut timers = TimerManager::with_clock(clock.clone());
//!
//! let id = timers.schedule(Duration::from_secs(2));
//! assert!(timers.take_expired().is_empty());
//!
//! clock.advance(Duration::from_secs(2));
//! assert_eq!(timers.take_expired(), vec![id]);
//! ```

mod clock;
mod error;
pub mod logging;
pub mod signal;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TimerError;
pub use signal::{ConnectionId, Signal};
pub use timer::{Scheduler, TimerId, TimerManager};
