use lumina_core::error::CoreError;
use lumina_core::progress::GENERIC_ERROR_MESSAGE;
use lumina_provider::ProviderError;
use lumina_store::StoreError;

/// Provider text that signals rejected or missing credentials.
pub const AUTH_REJECTION_PATTERN: &str = "Requested entity was not found";

// ---------------------------------------------------------------------------
// GenerationError
// ---------------------------------------------------------------------------

/// Terminal outcome of a generation call other than success.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The cancellation token was observed at a checkpoint.
    #[error("Generation cancelled")]
    Cancelled,

    /// The provider rejected the credentials. The caller must
    /// re-authenticate before retrying.
    #[error("Provider rejected credentials: {0}")]
    AuthError(String),

    /// Any other provider-side failure, or a job that finished without a
    /// usable artifact.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// The job was still running after the configured maximum number of
    /// polls.
    #[error("Generation timed out after {polls} polls")]
    TimedOut { polls: u32 },

    /// The driver already has a job in flight.
    #[error("A generation job is already in progress")]
    Busy,

    /// The request cannot be handled by this component.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::GenerationFailed(detail) | Self::AuthError(detail)
                if !detail.trim().is_empty() =>
            {
                detail.clone()
            }
            Self::GenerationFailed(_) | Self::AuthError(_) => GENERIC_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Map a provider failure onto the outward-facing taxonomy.
///
/// Any error whose text contains [`AUTH_REJECTION_PATTERN`] is an
/// [`GenerationError::AuthError`], whichever call produced it. Everything
/// else is [`GenerationError::GenerationFailed`] carrying the provider's
/// detail text.
pub fn classify_provider_error(err: &ProviderError) -> GenerationError {
    let detail = err.detail();
    if err.to_string().contains(AUTH_REJECTION_PATTERN) {
        GenerationError::AuthError(detail)
    } else {
        GenerationError::GenerationFailed(detail)
    }
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Caller-side precondition and persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No user is signed in")]
    NotSignedIn,

    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("A generation is already in progress")]
    Busy,

    #[error("Credentials must be selected before generating")]
    CredentialsRequired,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
