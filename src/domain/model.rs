use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientStatus {
    Active,
    Inactive,
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Confirmed,
    Pending,
    Completed,
    Cancelled,
    NoShow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommunicationKind {
    Email,
    Sms,
    Call,
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Failed,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    Email,
    Sms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateCategory {
    Reminder,
    Confirmation,
    Followup,
    Marketing,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderKind {
    Reminder,
    Followup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: ClientStatus,
    pub total_appointments: u32,
    pub last_appointment: Option<NaiveDate>,
    pub next_appointment: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: NaiveDate,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service_name: String,
    pub service_price: f64,
    pub service_duration_minutes: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDate,
    pub reminder_sent: bool,
    pub confirmation_sent: bool,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Communication {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub kind: CommunicationKind,
    pub subject: Option<String>,
    pub content: String,
    pub status: DeliveryStatus,
    pub sent_at: DateTime<Utc>,
    pub sent_by: String,
    pub appointment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: String,
    pub name: String,
    pub kind: TemplateKind,
    pub subject: Option<String>,
    pub content: String,
    pub variables: Vec<String>,
    pub category: TemplateCategory,
    pub created_at: NaiveDate,
    pub last_used: Option<NaiveDate>,
    pub usage_count: u32,
}

/// A reminder tracked by the scheduler until it is sent, fails or is cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub id: String,
    pub booking_id: String,
    pub scheduled_for: DateTime<Utc>,
    pub kind: ReminderKind,
    pub status: ReminderStatus,
    pub attempts: u32,
}

/// Business identity stamped onto outgoing emails and calendar invites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Fully-resolved booking payload handed to the email pipeline.
///
/// Carries both the client/service side (from the booking request or an
/// appointment record) and the business side (from configuration), so email
/// rendering never has to reach back into config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service_name: String,
    pub service_price: Option<f64>,
    pub service_duration_minutes: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub notes: Option<String>,
    pub business_name: String,
    pub business_email: String,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
}

impl Booking {
    /// Appointment start as UTC wall-clock time (single-timezone businesses).
    pub fn starts_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(self.time))
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at() + Duration::minutes(i64::from(self.service_duration_minutes))
    }

    /// Long-form date used in email bodies, e.g. "Saturday, January 20, 2024".
    pub fn long_date(&self) -> String {
        self.date.format("%A, %B %-d, %Y").to_string()
    }

    pub fn time_hhmm(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    pub fn from_appointment(appointment: &Appointment, business: &BusinessProfile) -> Self {
        Self {
            id: appointment.id.clone(),
            client_name: appointment.client_name.clone(),
            client_email: appointment.client_email.clone(),
            client_phone: appointment.client_phone.clone(),
            service_name: appointment.service_name.clone(),
            service_price: Some(appointment.service_price),
            service_duration_minutes: appointment.service_duration_minutes,
            date: appointment.date,
            time: appointment.time,
            notes: appointment.notes.clone(),
            business_name: business.name.clone(),
            business_email: business.email.clone(),
            business_phone: business.phone.clone(),
            business_address: business.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub filename: String,
    /// Base64-encoded body, as the email API expects.
    pub content: String,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_booking() -> Booking {
        Booking {
            id: "booking_1".to_string(),
            client_name: "John Smith".to_string(),
            client_email: "john.smith@example.com".to_string(),
            client_phone: "+1 (555) 123-4567".to_string(),
            service_name: "Consultation".to_string(),
            service_price: Some(100.0),
            service_duration_minutes: 30,
            date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            notes: None,
            business_name: "Bookline Demo Studio".to_string(),
            business_email: "appointments@bookline.local".to_string(),
            business_phone: None,
            business_address: None,
        }
    }

    #[test]
    fn test_booking_start_and_end() {
        let booking = sample_booking();
        assert_eq!(booking.starts_at().to_rfc3339(), "2024-01-20T10:00:00+00:00");
        assert_eq!(booking.ends_at().to_rfc3339(), "2024-01-20T10:30:00+00:00");
    }

    #[test]
    fn test_booking_long_date() {
        let booking = sample_booking();
        assert_eq!(booking.long_date(), "Saturday, January 20, 2024");
    }

    #[test]
    fn test_status_serialization_uses_kebab_case() {
        let status = serde_json::to_string(&AppointmentStatus::NoShow).unwrap();
        assert_eq!(status, "\"no-show\"");
    }
}
