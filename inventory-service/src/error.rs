use crate::cipher::CipherError;
use crate::services::store::StoreError;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cycle detected in group tree at group {group_id}")]
    CycleDetected { group_id: String },

    #[error(transparent)]
    Persistence(#[from] StoreError),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type InventoryResult<T> = Result<T, InventoryError>;

impl InventoryError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        InventoryError::Validation(vec![reason.into()])
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        InventoryError::NotFound(what.into())
    }

    /// A unique-index rejection from the store reported as `reason`.
    pub(crate) fn on_duplicate(reason: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |err| match err {
            StoreError::Duplicate { .. } => InventoryError::invalid(reason),
            other => InventoryError::Persistence(other),
        }
    }
}

/// Flatten derive-level validation failures into the reason list.
pub fn validation_reasons(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut reasons: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid.", field),
                })
                .collect::<Vec<_>>()
        })
        .collect();
    reasons.sort();
    reasons
}

impl From<validator::ValidationErrors> for InventoryError {
    fn from(errors: validator::ValidationErrors) -> Self {
        InventoryError::Validation(validation_reasons(&errors))
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Validation(reasons) => AppError::InvalidRequest(reasons),
            InventoryError::NotFound(what) => {
                AppError::NotFound(anyhow::anyhow!("{} not found", what))
            }
            InventoryError::Unauthorized => AppError::Unauthorized(anyhow::anyhow!("Unauthorized")),
            InventoryError::Persistence(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}
