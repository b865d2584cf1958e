//! # Confab
//!
//! The admin and auth service of the Confab meeting-transcription platform,
//! usable both as a standalone binary and as a library.
//!
//! Every request is resolved against one of two credential schemes before any
//! handler runs: a server-configured admin secret (`X-Admin-API-Key`) or a
//! per-user opaque API token (`X-API-Key`). The two are never interchangeable.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use confab::server::{AppState, create_router};
//! use confab::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/confab.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     Some("admin-secret".to_string()),
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
