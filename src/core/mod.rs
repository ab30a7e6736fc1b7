pub mod booking;
pub mod bulk;
pub mod directory;
pub mod email;
pub mod mailer;
pub mod scheduler;
pub mod template;

pub use crate::domain::model::{Booking, EmailMessage};
pub use crate::domain::ports::{BookingStore, Mailer};
pub use crate::utils::error::Result;
