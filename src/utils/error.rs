use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispenserError {
    #[error("Login failed: {message}")]
    AuthFailure { message: String },

    #[error("Polling orders failed: {message}")]
    PollFailure { message: String },

    #[error("Bumping order {order_id} failed after {attempts} attempt(s): {message}")]
    BumpFailure {
        order_id: String,
        attempts: u32,
        message: String,
    },

    #[error("Dispensing failed: {message}")]
    DispenseFailure { message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Shutdown requested")]
    Cancelled,
}

impl DispenserError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispenserError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, DispenserError>;
