use crate::domain::model::{
    Appointment, AppointmentStatus, Booking, BusinessProfile, Client, ClientStatus, Communication,
    CommunicationKind, DeliveryStatus, MessageTemplate, PaymentStatus, TemplateCategory,
    TemplateKind,
};
use crate::domain::ports::BookingStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingState {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone)]
struct StoredBooking {
    booking: Booking,
    state: BookingState,
}

/// In-memory data layer: seeded demo clients, appointments, communications
/// and message templates, plus bookings recorded at runtime. Seed dates are
/// relative to today so the upcoming/completed selections stay meaningful.
pub struct BusinessDirectory {
    business: BusinessProfile,
    clients: Vec<Client>,
    appointments: Vec<Appointment>,
    communications: Vec<Communication>,
    templates: Vec<MessageTemplate>,
    bookings: Mutex<HashMap<String, StoredBooking>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_clients: usize,
    pub total_appointments: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub reminders_outstanding: usize,
    pub upcoming_week: usize,
}

impl BusinessDirectory {
    pub fn new(business: BusinessProfile) -> Self {
        Self {
            business,
            clients: Vec::new(),
            appointments: Vec::new(),
            communications: Vec::new(),
            templates: Vec::new(),
            bookings: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_sample_data(business: BusinessProfile) -> Self {
        let mut directory = Self::new(business);
        directory.clients = sample_clients();
        directory.appointments = sample_appointments();
        directory.communications = sample_communications();
        directory.templates = sample_templates();
        directory
    }

    pub fn business(&self) -> &BusinessProfile {
        &self.business
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn client(&self, client_id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == client_id)
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn appointment(&self, appointment_id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == appointment_id)
    }

    /// Appointments for one client, newest first.
    pub fn appointments_for_client(&self, client_id: &str) -> Vec<&Appointment> {
        let mut appointments: Vec<&Appointment> = self
            .appointments
            .iter()
            .filter(|a| a.client_id == client_id)
            .collect();
        appointments.sort_by(|a, b| b.date.cmp(&a.date));
        appointments
    }

    pub fn communications(&self) -> &[Communication] {
        &self.communications
    }

    pub fn templates(&self) -> &[MessageTemplate] {
        &self.templates
    }

    pub fn template(&self, template_id: &str) -> Option<&MessageTemplate> {
        self.templates.iter().find(|t| t.id == template_id)
    }

    pub fn template_by_category(
        &self,
        category: TemplateCategory,
        kind: TemplateKind,
    ) -> Option<&MessageTemplate> {
        self.templates
            .iter()
            .find(|t| t.category == category && t.kind == kind)
    }

    pub async fn record_booking(&self, booking: Booking) {
        let mut bookings = self.bookings.lock().await;
        bookings.insert(
            booking.id.clone(),
            StoredBooking {
                booking,
                state: BookingState::Confirmed,
            },
        );
    }

    pub async fn booking_state(&self, booking_id: &str) -> Option<(Booking, BookingState)> {
        let bookings = self.bookings.lock().await;
        bookings
            .get(booking_id)
            .map(|stored| (stored.booking.clone(), stored.state))
    }

    /// Mark a recorded booking cancelled. Returns false when unknown.
    pub async fn cancel_booking(&self, booking_id: &str) -> bool {
        let mut bookings = self.bookings.lock().await;
        match bookings.get_mut(booking_id) {
            Some(stored) => {
                stored.state = BookingState::Cancelled;
                true
            }
            None => false,
        }
    }

    pub fn summary(&self) -> DashboardSummary {
        let today = Utc::now().date_naive();
        let week_ahead = today + Duration::days(7);

        let count_status = |status: AppointmentStatus| {
            self.appointments.iter().filter(|a| a.status == status).count()
        };

        DashboardSummary {
            total_clients: self.clients.len(),
            total_appointments: self.appointments.len(),
            confirmed: count_status(AppointmentStatus::Confirmed),
            pending: count_status(AppointmentStatus::Pending),
            completed: count_status(AppointmentStatus::Completed),
            cancelled: count_status(AppointmentStatus::Cancelled),
            reminders_outstanding: self
                .appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Confirmed && !a.reminder_sent)
                .count(),
            upcoming_week: self
                .appointments
                .iter()
                .filter(|a| {
                    a.status == AppointmentStatus::Confirmed
                        && a.date >= today
                        && a.date <= week_ahead
                })
                .count(),
        }
    }
}

#[async_trait]
impl BookingStore for BusinessDirectory {
    async fn booking(&self, booking_id: &str) -> Result<Option<Booking>> {
        // Runtime bookings first, then the seeded appointment book
        if let Some((booking, state)) = self.booking_state(booking_id).await {
            return Ok(match state {
                BookingState::Confirmed => Some(booking),
                BookingState::Cancelled => None,
            });
        }

        Ok(self
            .appointment(booking_id)
            .map(|appointment| Booking::from_appointment(appointment, &self.business)))
    }
}

fn hhmm(hours: u32, minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hours, minutes, 0).expect("valid seed time")
}

fn sample_clients() -> Vec<Client> {
    let today = Utc::now().date_naive();
    vec![
        Client {
            id: "client_1".to_string(),
            name: "John Smith".to_string(),
            email: "john.smith@example.com".to_string(),
            phone: "+1 (555) 123-4567".to_string(),
            status: ClientStatus::Active,
            total_appointments: 8,
            last_appointment: Some(today - Duration::days(10)),
            next_appointment: Some(today + Duration::days(1)),
            notes: Some("Prefers morning appointments".to_string()),
            created_at: today - Duration::days(220),
            tags: vec!["VIP".to_string(), "Regular".to_string()],
        },
        Client {
            id: "client_2".to_string(),
            name: "Sarah Johnson".to_string(),
            email: "sarah.j@example.com".to_string(),
            phone: "+1 (555) 234-5678".to_string(),
            status: ClientStatus::Active,
            total_appointments: 3,
            last_appointment: Some(today - Duration::days(12)),
            next_appointment: Some(today + Duration::days(5)),
            notes: Some("Referred by John Smith".to_string()),
            created_at: today - Duration::days(60),
            tags: vec!["New Client".to_string()],
        },
        Client {
            id: "client_3".to_string(),
            name: "Mike Davis".to_string(),
            email: "mike.davis@example.com".to_string(),
            phone: "+1 (555) 345-6789".to_string(),
            status: ClientStatus::Active,
            total_appointments: 12,
            last_appointment: Some(today - Duration::days(5)),
            next_appointment: None,
            notes: Some("Always punctual".to_string()),
            created_at: today - Duration::days(320),
            tags: vec!["Long-term".to_string(), "VIP".to_string()],
        },
        Client {
            id: "client_4".to_string(),
            name: "Emily Chen".to_string(),
            email: "emily.chen@example.com".to_string(),
            phone: "+1 (555) 456-7890".to_string(),
            status: ClientStatus::New,
            total_appointments: 1,
            last_appointment: None,
            next_appointment: Some(today + Duration::days(2)),
            notes: Some("First-time client".to_string()),
            created_at: today - Duration::days(3),
            tags: vec!["New Client".to_string()],
        },
    ]
}

fn sample_appointments() -> Vec<Appointment> {
    let today = Utc::now().date_naive();
    vec![
        // Tomorrow, reminder not yet sent: picked up by the bulk reminder action
        Appointment {
            id: "apt_1".to_string(),
            client_id: "client_1".to_string(),
            client_name: "John Smith".to_string(),
            client_email: "john.smith@example.com".to_string(),
            client_phone: "+1 (555) 123-4567".to_string(),
            service_name: "Consultation".to_string(),
            service_price: 100.0,
            service_duration_minutes: 30,
            date: today + Duration::days(1),
            time: hhmm(10, 0),
            status: AppointmentStatus::Confirmed,
            notes: Some("Follow-up consultation".to_string()),
            created_at: today - Duration::days(5),
            reminder_sent: false,
            confirmation_sent: true,
            payment_status: PaymentStatus::Paid,
        },
        Appointment {
            id: "apt_2".to_string(),
            client_id: "client_2".to_string(),
            client_name: "Sarah Johnson".to_string(),
            client_email: "sarah.j@example.com".to_string(),
            client_phone: "+1 (555) 234-5678".to_string(),
            service_name: "Assessment".to_string(),
            service_price: 150.0,
            service_duration_minutes: 45,
            date: today + Duration::days(5),
            time: hhmm(14, 30),
            status: AppointmentStatus::Pending,
            notes: None,
            created_at: today - Duration::days(2),
            reminder_sent: false,
            confirmation_sent: true,
            payment_status: PaymentStatus::Pending,
        },
        // Completed within the followup window
        Appointment {
            id: "apt_3".to_string(),
            client_id: "client_3".to_string(),
            client_name: "Mike Davis".to_string(),
            client_email: "mike.davis@example.com".to_string(),
            client_phone: "+1 (555) 345-6789".to_string(),
            service_name: "Treatment".to_string(),
            service_price: 200.0,
            service_duration_minutes: 60,
            date: today - Duration::days(5),
            time: hhmm(9, 30),
            status: AppointmentStatus::Completed,
            notes: Some("Treatment went well, schedule follow-up".to_string()),
            created_at: today - Duration::days(10),
            reminder_sent: true,
            confirmation_sent: true,
            payment_status: PaymentStatus::Paid,
        },
        Appointment {
            id: "apt_4".to_string(),
            client_id: "client_4".to_string(),
            client_name: "Emily Chen".to_string(),
            client_email: "emily.chen@example.com".to_string(),
            client_phone: "+1 (555) 456-7890".to_string(),
            service_name: "Consultation".to_string(),
            service_price: 100.0,
            service_duration_minutes: 30,
            date: today + Duration::days(2),
            time: hhmm(11, 0),
            status: AppointmentStatus::Confirmed,
            notes: None,
            created_at: today - Duration::days(1),
            reminder_sent: false,
            confirmation_sent: true,
            payment_status: PaymentStatus::Pending,
        },
    ]
}

fn sample_communications() -> Vec<Communication> {
    let now = Utc::now();
    vec![
        Communication {
            id: "comm_1".to_string(),
            client_id: "client_1".to_string(),
            client_name: "John Smith".to_string(),
            kind: CommunicationKind::Email,
            subject: Some("Appointment Confirmation".to_string()),
            content: "Your appointment has been confirmed".to_string(),
            status: DeliveryStatus::Delivered,
            sent_at: now - Duration::days(5),
            sent_by: "System".to_string(),
            appointment_id: Some("apt_1".to_string()),
        },
        Communication {
            id: "comm_2".to_string(),
            client_id: "client_2".to_string(),
            client_name: "Sarah Johnson".to_string(),
            kind: CommunicationKind::Email,
            subject: Some("Appointment Confirmation".to_string()),
            content: "Your assessment appointment has been confirmed".to_string(),
            status: DeliveryStatus::Delivered,
            sent_at: now - Duration::days(2),
            sent_by: "System".to_string(),
            appointment_id: Some("apt_2".to_string()),
        },
        Communication {
            id: "comm_3".to_string(),
            client_id: "client_3".to_string(),
            client_name: "Mike Davis".to_string(),
            kind: CommunicationKind::Email,
            subject: Some("Appointment Reminder".to_string()),
            content: "Reminder: you have an appointment tomorrow".to_string(),
            status: DeliveryStatus::Delivered,
            sent_at: now - Duration::days(6),
            sent_by: "System".to_string(),
            appointment_id: Some("apt_3".to_string()),
        },
        Communication {
            id: "comm_4".to_string(),
            client_id: "client_1".to_string(),
            client_name: "John Smith".to_string(),
            kind: CommunicationKind::Note,
            subject: None,
            content: "Client called to confirm appointment time; may be 5 minutes late".to_string(),
            status: DeliveryStatus::Sent,
            sent_at: now - Duration::days(1),
            sent_by: "Front Desk".to_string(),
            appointment_id: None,
        },
    ]
}

fn sample_templates() -> Vec<MessageTemplate> {
    let today = Utc::now().date_naive();
    vec![
        MessageTemplate {
            id: "template_1".to_string(),
            name: "Appointment Reminder".to_string(),
            kind: TemplateKind::Email,
            subject: Some("Reminder: {{serviceName}} appointment tomorrow".to_string()),
            content: "Dear {{clientName}},\n\nThis is a friendly reminder that you have a {{serviceName}} appointment scheduled for tomorrow, {{appointmentDate}} at {{appointmentTime}}.\n\nPlease arrive 5-10 minutes early and bring any relevant documents.\n\nIf you need to reschedule or cancel, please contact us at least 24 hours in advance.\n\nBest regards,\n{{businessName}}".to_string(),
            variables: vec![
                "clientName".to_string(),
                "serviceName".to_string(),
                "appointmentDate".to_string(),
                "appointmentTime".to_string(),
                "businessName".to_string(),
            ],
            category: TemplateCategory::Reminder,
            created_at: today - Duration::days(90),
            last_used: Some(today - Duration::days(6)),
            usage_count: 45,
        },
        MessageTemplate {
            id: "template_2".to_string(),
            name: "Appointment Confirmation".to_string(),
            kind: TemplateKind::Email,
            subject: Some("Appointment Confirmed - {{serviceName}}".to_string()),
            content: "Dear {{clientName}},\n\nThank you for booking an appointment with {{businessName}}. Your appointment has been confirmed.\n\nAppointment Details:\n- Service: {{serviceName}}\n- Date: {{appointmentDate}}\n- Time: {{appointmentTime}}\n- Duration: {{serviceDuration}} minutes\n- Price: {{servicePrice}}\n\nWe look forward to seeing you!\n\nBest regards,\n{{businessName}}".to_string(),
            variables: vec![
                "clientName".to_string(),
                "businessName".to_string(),
                "serviceName".to_string(),
                "appointmentDate".to_string(),
                "appointmentTime".to_string(),
                "serviceDuration".to_string(),
                "servicePrice".to_string(),
            ],
            category: TemplateCategory::Confirmation,
            created_at: today - Duration::days(90),
            last_used: Some(today - Duration::days(2)),
            usage_count: 89,
        },
        MessageTemplate {
            id: "template_3".to_string(),
            name: "Follow-up Message".to_string(),
            kind: TemplateKind::Email,
            subject: Some("How was your {{serviceName}} appointment?".to_string()),
            content: "Dear {{clientName}},\n\nWe hope your recent {{serviceName}} appointment went well. Your feedback is important to us.\n\nIf you have any questions or concerns, please don't hesitate to reach out.\n\nWe'd also appreciate if you could leave us a review to help other clients.\n\nThank you for choosing {{businessName}}!\n\nBest regards,\n{{businessName}}".to_string(),
            variables: vec![
                "clientName".to_string(),
                "serviceName".to_string(),
                "businessName".to_string(),
            ],
            category: TemplateCategory::Followup,
            created_at: today - Duration::days(75),
            last_used: Some(today - Duration::days(10)),
            usage_count: 23,
        },
        MessageTemplate {
            id: "template_4".to_string(),
            name: "SMS Reminder".to_string(),
            kind: TemplateKind::Sms,
            subject: None,
            content: "Hi {{clientName}}, reminder: {{serviceName}} appointment tomorrow at {{appointmentTime}}. Reply CONFIRM to confirm or CANCEL to cancel. - {{businessName}}".to_string(),
            variables: vec![
                "clientName".to_string(),
                "serviceName".to_string(),
                "appointmentTime".to_string(),
                "businessName".to_string(),
            ],
            category: TemplateCategory::Reminder,
            created_at: today - Duration::days(30),
            last_used: None,
            usage_count: 12,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile() -> BusinessProfile {
        BusinessProfile {
            name: "Bookline Demo Studio".to_string(),
            email: "appointments@bookline.local".to_string(),
            phone: None,
            address: None,
        }
    }

    #[test]
    fn test_sample_data_shape() {
        let directory = BusinessDirectory::with_sample_data(profile());
        assert_eq!(directory.clients().len(), 4);
        assert_eq!(directory.appointments().len(), 4);
        assert_eq!(directory.communications().len(), 4);
        assert_eq!(directory.templates().len(), 4);
    }

    #[test]
    fn test_template_lookup_by_category_prefers_matching_kind() {
        let directory = BusinessDirectory::with_sample_data(profile());

        let email_reminder = directory
            .template_by_category(TemplateCategory::Reminder, TemplateKind::Email)
            .unwrap();
        assert_eq!(email_reminder.id, "template_1");

        let sms_reminder = directory
            .template_by_category(TemplateCategory::Reminder, TemplateKind::Sms)
            .unwrap();
        assert_eq!(sms_reminder.id, "template_4");
    }

    #[test]
    fn test_appointments_for_client_newest_first() {
        let mut directory = BusinessDirectory::with_sample_data(profile());
        directory.appointments.push(Appointment {
            id: "apt_old".to_string(),
            client_id: "client_1".to_string(),
            client_name: "John Smith".to_string(),
            client_email: "john.smith@example.com".to_string(),
            client_phone: "+1 (555) 123-4567".to_string(),
            service_name: "Consultation".to_string(),
            service_price: 100.0,
            service_duration_minutes: 30,
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            time: hhmm(10, 0),
            status: AppointmentStatus::Completed,
            notes: None,
            created_at: NaiveDate::from_ymd_opt(2019, 12, 1).unwrap(),
            reminder_sent: true,
            confirmation_sent: true,
            payment_status: PaymentStatus::Paid,
        });

        let appointments = directory.appointments_for_client("client_1");
        assert_eq!(appointments.len(), 2);
        assert_eq!(appointments[0].id, "apt_1");
        assert_eq!(appointments[1].id, "apt_old");
    }

    #[tokio::test]
    async fn test_record_and_cancel_booking() {
        let directory = BusinessDirectory::with_sample_data(profile());
        let booking = Booking::from_appointment(
            directory.appointment("apt_1").unwrap(),
            directory.business(),
        );
        let mut booking = booking;
        booking.id = "booking_x".to_string();

        directory.record_booking(booking).await;
        assert!(directory.booking("booking_x").await.unwrap().is_some());

        assert!(directory.cancel_booking("booking_x").await);
        // Cancelled bookings are no longer visible to the scheduler
        assert!(directory.booking("booking_x").await.unwrap().is_none());

        assert!(!directory.cancel_booking("nope").await);
    }

    #[tokio::test]
    async fn test_booking_store_falls_back_to_appointments() {
        let directory = BusinessDirectory::with_sample_data(profile());

        let booking = directory.booking("apt_3").await.unwrap().unwrap();
        assert_eq!(booking.client_name, "Mike Davis");
        assert_eq!(booking.business_name, "Bookline Demo Studio");

        assert!(directory.booking("missing").await.unwrap().is_none());
    }

    #[test]
    fn test_summary_counts() {
        let directory = BusinessDirectory::with_sample_data(profile());
        let summary = directory.summary();

        assert_eq!(summary.total_clients, 4);
        assert_eq!(summary.total_appointments, 4);
        assert_eq!(summary.confirmed, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.reminders_outstanding, 2);
        assert_eq!(summary.upcoming_week, 2);
    }
}
