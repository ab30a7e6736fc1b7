use crate::core::directory::{BookingState, BusinessDirectory};
use crate::core::email::EmailService;
use crate::core::scheduler::ReminderScheduler;
use crate::domain::model::{Booking, BusinessProfile};
use crate::domain::ports::Mailer;
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Incoming booking form data, before the business profile is stamped on.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service_name: String,
    pub service_price: Option<f64>,
    pub service_duration_minutes: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub notes: Option<String>,
}

impl Validate for BookingRequest {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("client_name", &self.client_name)?;
        validation::validate_email("client_email", &self.client_email)?;
        validation::validate_non_empty_string("client_phone", &self.client_phone)?;
        validation::validate_non_empty_string("service_name", &self.service_name)?;
        validation::validate_positive_number(
            "service_duration_minutes",
            self.service_duration_minutes as usize,
            1,
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailStatus {
    pub client_confirmation: bool,
    pub business_notification: bool,
    pub reminder_scheduled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingOutcome {
    pub success: bool,
    pub booking_id: String,
    pub message: String,
    pub email_status: EmailStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingStatus {
    pub id: String,
    pub state: BookingState,
    pub client_name: String,
    pub service_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Booking intake flow: record the booking, then best-effort confirmation
/// email, business notification and reminder scheduling. Email failures are
/// logged and reported in the outcome flags; they never sink the booking.
pub struct BookingService<M: Mailer + 'static> {
    email: EmailService<M>,
    scheduler: ReminderScheduler<M, BusinessDirectory>,
    directory: Arc<BusinessDirectory>,
    business: BusinessProfile,
    confirmations_enabled: bool,
    reminders_enabled: bool,
}

impl<M: Mailer + 'static> BookingService<M> {
    pub fn new(
        email: EmailService<M>,
        scheduler: ReminderScheduler<M, BusinessDirectory>,
        directory: Arc<BusinessDirectory>,
    ) -> Self {
        let business = directory.business().clone();
        Self {
            email,
            scheduler,
            directory,
            business,
            confirmations_enabled: true,
            reminders_enabled: true,
        }
    }

    /// Apply the notification channel toggles from configuration. A disabled
    /// channel is skipped entirely and reported as such in the outcome.
    pub fn with_notifications(mut self, confirmations: bool, reminders: bool) -> Self {
        self.confirmations_enabled = confirmations;
        self.reminders_enabled = reminders;
        self
    }

    pub async fn process_booking(&self, request: BookingRequest) -> Result<BookingOutcome> {
        request.validate()?;

        let booking_id = new_booking_id();
        let booking = Booking {
            id: booking_id.clone(),
            client_name: request.client_name,
            client_email: request.client_email,
            client_phone: request.client_phone,
            service_name: request.service_name,
            service_price: request.service_price,
            service_duration_minutes: request.service_duration_minutes,
            date: request.date,
            time: request.time,
            notes: request.notes,
            business_name: self.business.name.clone(),
            business_email: self.business.email.clone(),
            business_phone: self.business.phone.clone(),
            business_address: self.business.address.clone(),
        };

        self.directory.record_booking(booking.clone()).await;

        let client_confirmation = if self.confirmations_enabled {
            let sent = self.email.send_confirmation_email(&booking).await;
            if !sent {
                tracing::warn!("Failed to send client confirmation email for {}", booking_id);
            }
            sent
        } else {
            tracing::info!("Confirmation emails disabled, skipping for {}", booking_id);
            false
        };

        let business_notification = self.email.send_business_notification(&booking).await;
        if !business_notification {
            tracing::warn!("Failed to send business notification email for {}", booking_id);
        }

        let reminder_id = if self.reminders_enabled {
            self.scheduler.schedule_reminder(&booking).await
        } else {
            tracing::info!("Reminder emails disabled, skipping scheduling for {}", booking_id);
            None
        };

        tracing::info!(
            "Booking processed: id={} client_email_sent={} business_email_sent={} reminder={:?}",
            booking_id,
            client_confirmation,
            business_notification,
            reminder_id
        );

        Ok(BookingOutcome {
            success: true,
            booking_id,
            message: "Appointment booked successfully! Check your email for confirmation."
                .to_string(),
            email_status: EmailStatus {
                client_confirmation,
                business_notification,
                reminder_scheduled: reminder_id.is_some(),
            },
        })
    }

    pub async fn booking_status(&self, booking_id: &str) -> Option<BookingStatus> {
        let (booking, state) = self.directory.booking_state(booking_id).await?;
        Some(BookingStatus {
            id: booking.id,
            state,
            client_name: booking.client_name,
            service_name: booking.service_name,
            date: booking.date,
            time: booking.time,
        })
    }

    /// Cancel a booking and any pending reminders for it.
    pub async fn cancel_booking(&self, booking_id: &str) -> Result<()> {
        let cancelled_reminders = self.scheduler.cancel_for_booking(booking_id).await;
        if cancelled_reminders > 0 {
            tracing::info!(
                "Cancelled {} pending reminder(s) for booking {}",
                cancelled_reminders,
                booking_id
            );
        }

        if self.directory.cancel_booking(booking_id).await {
            tracing::info!("Booking {} cancelled", booking_id);
            Ok(())
        } else {
            Err(BookingError::UnknownBooking {
                booking_id: booking_id.to_string(),
            })
        }
    }
}

fn new_booking_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("booking_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}
