//! # voxserve-server
//!
//! HTTP front end for the voxserve voice registry. Exposes synthesis,
//! voice discovery, alias management and the download/delete lifecycle
//! over a small JSON API (audio responses are raw bytes).

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
