use crate::Channel;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlerterError {
    #[error("Discord webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Discord webhook returned an error: {0}")]
    ApiError(String),

    #[error("No webhook configured for the {0} channel.")]
    NotConfigured(Channel),
}

