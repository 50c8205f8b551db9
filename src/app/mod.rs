//! Application module.
//!
//! This module contains the session logic: window and device setup, event
//! routing, the selection of the active (API, problem, solution) combination
//! and the per-frame render and timing loop.
//!
//! # Module Structure
//!
//! - [`app_state`]: [`ApplicationState`], everything a running session owns
//! - [`activation`]: binding the active solution and recording its frames
//! - [`event_handler`]: [`App`], the winit [`ApplicationHandler`](winit::application::ApplicationHandler)
//! - [`update`]: the per-frame clear, render, swap and record step
//! - [`selection`]: the interactive / benchmark selection state machine
//! - [`windows`]: keeps the per-API windows together and turns closes into quits
//!
//! # Event Flow
//!
//! 1. **Window events**: moves, closes, resizes and key releases are routed to
//!    the coordinator, the contexts and the selection machine
//! 2. **Quit check**: once per loop iteration, before anything is rendered
//! 3. **Frame**: the active combination is rendered and its timings recorded
//!
//! # Threading Model
//!
//! Everything runs on the event loop thread. The only shared state is the
//! interrupt flag set by the Ctrl-C handler.

pub mod activation;
pub mod app_state;
pub mod event_handler;
pub mod selection;
pub mod update;
pub mod windows;

pub use app_state::ApplicationState;
pub use event_handler::{App, RunOutcome};
