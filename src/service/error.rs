const PROFILE_OWNER_UNIQUE: &str = "student_profile_user_id_key";
const UNIQUE_VIOLATION: &str = "23505";
const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";

/// Failure kinds of the profile service. Each kind maps to one HTTP status in
/// `route::profile`.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error("profile with id = {0} still exists after delete")]
    DeleteVerification(i32),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProfileError {
    pub fn profile_not_found(id: i32) -> Self {
        ProfileError::NotFound(format!("profile with id = {} not found", id))
    }

    pub fn user_not_found(email: &str) -> Self {
        ProfileError::NotFound(format!("user with email = {} not found", email))
    }

    pub fn not_owner(id: i32) -> Self {
        ProfileError::Forbidden(format!("not allowed to access profile with id = {}", id))
    }

    /// Classify a failed profile write. A second profile for the same user and
    /// text longer than its column are caused by the request, anything else is
    /// internal.
    pub fn from_write(err: anyhow::Error) -> Self {
        if let Some(sqlx::Error::Database(db_err)) = err.downcast_ref::<sqlx::Error>() {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) if db_err.constraint() == Some(PROFILE_OWNER_UNIQUE) => {
                    return ProfileError::ValidationFailed(
                        "user already has a profile".to_string(),
                    );
                }
                Some(STRING_DATA_RIGHT_TRUNCATION) => {
                    return ProfileError::ValidationFailed(db_err.message().to_string());
                }
                _ => {}
            }
        }
        ProfileError::Internal(err)
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ProfileError::DeleteVerification(_)
                | ProfileError::Database(_)
                | ProfileError::Internal(_)
        )
    }
}
