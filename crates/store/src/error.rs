use lumina_core::types::AssetId;

/// Errors from asset and media persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    /// Analysis may only be attached to video assets.
    #[error("Asset {0} is not a video")]
    NotAVideo(AssetId),

    #[error("Invalid user id: '{0}'")]
    InvalidUserId(String),

    #[error("Unsupported media URL: {0}")]
    UnsupportedUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_user() {
        let err = StoreError::InvalidUserId("../etc".into());
        assert_eq!(err.to_string(), "Invalid user id: '../etc'");
    }

    #[test]
    fn io_error_converts() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StoreError = inner.into();
        assert!(err.to_string().starts_with("I/O error:"));
    }
}
