//! Client for the ONOS REST management API
//!
//! The API is an external, versioned contract. This crate only knows how to
//! send one request and classify the answer; which request belongs to which
//! operator action is decided by the caller.

pub mod client;

pub use client::{
    ApiRequest, ApiResponse, Credentials, HttpOnosApiClient, MockOnosApiClient, OnosApiClient,
};
pub use reqwest::Method;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OnosApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Upstream answered with a non-success status
    #[error("ONOS API returned {status}: {body}")]
    RemoteOperationFailed { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, OnosApiError>;
