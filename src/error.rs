use std::net::AddrParseError;

use thiserror::Error;

/// Errors raised while registering clients and routing their frames
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("client {client} is already present in room {room}")]
    AlreadyPresent { room: String, client: String },

    #[error("recipient {client} is unavailable")]
    RecipientUnavailable { client: String },

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid socket address in {var} ({value:?}): {source}")]
    InvalidAddr {
        var: &'static str,
        value: String,
        #[source]
        source: AddrParseError,
    },

    #[error("invalid boolean in {var}: {value:?}")]
    InvalidFlag { var: &'static str, value: String },
}
