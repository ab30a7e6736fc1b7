use crate::domain::model::{Booking, EmailMessage};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Outbound email transport. Implemented by the Resend API client and by the
/// demo mailer used when no API key is configured.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Booking lookup used by the reminder scheduler when a reminder comes due.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn booking(&self, booking_id: &str) -> Result<Option<Booking>>;
}
