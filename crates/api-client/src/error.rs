use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build or send the HTTP request: {0}")]
    RequestBuild(#[from] reqwest::Error),

    #[error("The API request returned an error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Order was rejected by the exchange: {0}")]
    OrderRejected(String),

    #[error("Failed to sign the request: {0}")]
    Signing(String),
}
