//! Recommendation queue consumption and background generation for the movie
//! discovery client.
//!
//! [`services::Discovery`] owns the queue for the current epoch, applies swipe
//! decisions, asks the backend for more candidates when supply runs low, and polls
//! the resulting job until it can reload the queue. [`routes`] exposes it to UI
//! surfaces over a local HTTP API.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
