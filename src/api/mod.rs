//! HTTP access layer: login handshake and authenticated dispatch.
//!
//! This module provides the `AccessClient` for obtaining a bearer token
//! from the credential endpoint and carrying it on every subsequent
//! request. GET responses are treated as full rendered pages and handed
//! to the configured `Renderer`.

pub mod client;
pub mod error;

pub use client::{AccessClient, AuthenticatedRequest, Payload};
pub use error::ApiError;
