//! Per-user conversation state with idle expiry.

pub mod clock;
pub mod error;
pub mod manager;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use manager::SessionStore;
pub use types::{DataValue, UserSession};
