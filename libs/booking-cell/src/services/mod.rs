pub mod lifecycle;
pub mod session;

pub use lifecycle::BookingLifecycle;
pub use session::BookingSession;
