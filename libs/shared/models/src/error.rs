use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("Booking error: {0}")]
    Booking(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Process exit code the scheduler binary reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::BadRequest(_) => 2,
            AppError::Config(_) | AppError::Schedule(_) => 78,
            AppError::Booking(_) => 1,
            AppError::Internal(_) => 70,
        }
    }

    pub fn report(&self) -> i32 {
        let code = self.exit_code();
        tracing::error!("Error: {}: {}", code, self);
        code
    }
}
