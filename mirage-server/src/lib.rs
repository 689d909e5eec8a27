//! Mirage server: an HTTP double of a cloud image-target recognition
//! service.
//!
//! Exposes a Target API (signed with a database's server key pair) for
//! target CRUD, summaries, and duplicate detection, plus a Query API
//! (signed with the client key pair) that simulates image recognition.
//! All state lives in [`mirage_core::Database`] instances registered on
//! the shared [`AppState`].

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod validators;

pub use config::Config;
pub use routes::router;
pub use state::{AppState, SharedDatabase};
