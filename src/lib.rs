//! Doomie: a small habit tracker.
//!
//! Clients define **tasks** that recur on a period, record **done events**
//! when a task is completed (optionally through a **button** bound to a
//! user), and a server stores everything behind a REST API.
//!
//! # Architecture
//!
//! - **Model**: record types and server-generated ids
//! - **Store**: SQLite document store, one table per collection
//! - **Validation**: body decoding and reference checks before every write
//! - **API**: axum handlers, plus an SSE feed of done event changes
//! - **Notifier**: in-process broadcast of done event saves and removals
//! - **Client**: typed `reqwest` client for the API and the feed
//! - **Activity**: per-task timers cycling between inactive and active
//! - **Board**: client view tying tasks, buttons, timers and the feed together

pub mod activity;
pub mod api;
pub mod board;
pub mod client;
pub mod config;
pub mod doomie_dirs;
pub mod error;
pub mod logging;
pub mod model;
pub mod notifier;
pub mod store;
pub mod validation;

pub use api::{ApiServer, AppState};
pub use client::TrackerClient;
pub use config::DoomieConfig;
pub use error::{DoomieError, Result};
pub use notifier::{ChangeKind, ChangeNotifier, DoneEventChange};
pub use store::SqliteStore;
