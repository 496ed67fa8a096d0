#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed input. `details` carries every individual problem found,
    /// never just the first one.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a validation error with a single problem.
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        CoreError::Validation {
            details: vec![message.clone()],
            message,
        }
    }

    /// Shorthand for a missing load.
    pub fn load_not_found(load_id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: "Load",
            id: load_id.into(),
        }
    }
}
