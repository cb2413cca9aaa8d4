pub mod error;
pub mod role;

pub use error::AppError;
pub use role::UserRole;
