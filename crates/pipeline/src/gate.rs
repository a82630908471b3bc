use async_trait::async_trait;

/// Source of provider credentials.
///
/// The job driver never talks to the gate; it only reports
/// [`AuthError`](crate::GenerationError::AuthError) upward. The session
/// consults the gate before a submission and sends the user through the
/// picker after an auth rejection.
#[async_trait]
pub trait CredentialGate: Send + Sync {
    /// Whether usable credentials are currently selected.
    async fn has_valid_credentials(&self) -> bool;

    /// Let the user select credentials. Returns `true` when a selection
    /// was made.
    async fn open_credential_picker(&self) -> bool;
}
