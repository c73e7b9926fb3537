//! repoprops-client: authenticated REST access for repository mutations
//!
//! This crate is the transport layer of repoprops. It wraps a single
//! `reqwest::Client` carrying the bearer token, optional trust root and
//! request timeout, and exposes the narrow [`RepoApi`] seam that the
//! appliers in `repoprops-core` are written against.
//!
//! ## Layout
//!
//! - [`api`]: the `RepoApi` trait and `ApiResponse`
//! - [`client`]: the reqwest implementation
//! - [`fakes`]: a scripted in-memory implementation for tests

pub mod api;
pub mod client;
pub mod error;
pub mod fakes;

pub use api::{ApiResponse, ClientResult, RepoApi};
pub use client::{
    ClientConfig, GitHubClient, ACCEPT_MEDIA_TYPE, DEFAULT_API_URL, DEFAULT_TIMEOUT,
};
pub use error::ClientError;
