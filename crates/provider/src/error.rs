/// Errors from the generation provider layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A long-running operation finished with an error payload.
    #[error("Operation failed ({code}): {message}")]
    Operation { code: i32, message: String },

    /// The response was well-formed JSON but missing required data.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Human-readable detail without the variant prefix, for surfacing to
    /// the user.
    pub fn detail(&self) -> String {
        match self {
            Self::Request(e) => e.to_string(),
            Self::ApiError { body, .. } => body.clone(),
            Self::Operation { message, .. } => message.clone(),
            Self::MalformedResponse(msg) => msg.clone(),
        }
    }
}
