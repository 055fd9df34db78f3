//! Defines the custom error types for the hospital-sleuth application.

use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// The primary error type for normalization and link discovery.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reading the delimited raw extract.
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    /// The raw extract header lacks a column the builder needs.
    #[error("Missing column in raw extract header: {0}")]
    MissingColumn(String),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Error making HTTP requests via reqwest.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered, but not with a success status.
    #[error("HTTP status {status} for {url}")]
    HttpStatus {
        /// The numeric status code.
        status: u16,
        /// The URL that was requested.
        url: String,
    },

    /// The response was not an HTML document.
    #[error("Non-HTML content ({content_type}) at {url}")]
    NotHtml {
        /// The response's Content-Type.
        content_type: String,
        /// The URL that was requested.
        url: String,
    },

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;
