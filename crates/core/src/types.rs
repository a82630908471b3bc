use crate::error::CoreError;

/// Users are identified by opaque strings (UUID v4 for locally created accounts).
pub type UserId = String;

/// Generated assets are identified by UUID v4.
pub type AssetId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Longest accepted user id.
pub const MAX_USER_ID_LEN: usize = 128;

/// User ids double as file names in the asset store: ASCII alphanumerics,
/// `-`, `_`, `.` and `@`, no leading dot, at most [`MAX_USER_ID_LEN`]
/// bytes.
pub fn is_valid_user_id(user_id: &str) -> bool {
    !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && !user_id.starts_with('.')
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
}

pub fn validate_user_id(user_id: &str) -> Result<(), CoreError> {
    if is_valid_user_id(user_id) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid user id '{user_id}'. Use letters, digits, '-', '_', '.' or '@' \
             (max {MAX_USER_ID_LEN}, no leading dot)"
        )))
    }
}
