use crate::core::directory::BusinessDirectory;
use crate::core::email::{branded_shell, EmailService};
use crate::core::template::{booking_variables, TemplateEngine};
use crate::domain::model::{
    Appointment, AppointmentStatus, Booking, Client, EmailMessage, TemplateCategory, TemplateKind,
};
use crate::domain::ports::Mailer;
use chrono::{Duration, NaiveTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BulkStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkDetail {
    pub client_id: String,
    pub client_name: String,
    pub status: BulkStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkActionResult {
    pub success: bool,
    pub total_processed: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<String>,
    pub details: Vec<BulkDetail>,
}

impl BulkActionResult {
    fn empty() -> Self {
        Self {
            success: false,
            total_processed: 0,
            success_count: 0,
            failure_count: 0,
            errors: Vec::new(),
            details: Vec::new(),
        }
    }

    fn with_error(message: &str) -> Self {
        let mut result = Self::empty();
        result.errors.push(message.to_string());
        result
    }

    fn record_success(&mut self, client: &Client) {
        self.success_count += 1;
        self.details.push(BulkDetail {
            client_id: client.id.clone(),
            client_name: client.name.clone(),
            status: BulkStatus::Success,
            error: None,
        });
    }

    fn record_failure(&mut self, client_id: &str, client_name: &str, error: &str) {
        self.failure_count += 1;
        self.details.push(BulkDetail {
            client_id: client_id.to_string(),
            client_name: client_name.to_string(),
            status: BulkStatus::Failed,
            error: Some(error.to_string()),
        });
    }
}

/// Bulk email actions over the client directory: templated campaigns,
/// next-day reminders, post-appointment followups and confirmation resends.
pub struct BulkActionsService<M: Mailer + 'static> {
    email: EmailService<M>,
    directory: Arc<BusinessDirectory>,
    engine: TemplateEngine,
    followups_enabled: bool,
}

impl<M: Mailer + 'static> BulkActionsService<M> {
    pub fn new(email: EmailService<M>, directory: Arc<BusinessDirectory>) -> Self {
        Self {
            email,
            directory,
            engine: TemplateEngine::new(),
            followups_enabled: true,
        }
    }

    /// Apply the follow-up channel toggle from configuration.
    pub fn with_followups_enabled(mut self, enabled: bool) -> Self {
        self.followups_enabled = enabled;
        self
    }

    /// Render `template_id` for each targeted client and send. Variables come
    /// from the client's latest appointment, overlaid with `custom_vars`.
    pub async fn send_bulk_emails(
        &self,
        client_ids: &[String],
        template_id: &str,
        custom_vars: &HashMap<String, String>,
    ) -> BulkActionResult {
        let template = match self.directory.template(template_id) {
            Some(template) => template.clone(),
            None => return BulkActionResult::with_error("Template not found"),
        };

        let targets: Vec<Client> = self
            .directory
            .clients()
            .iter()
            .filter(|c| client_ids.contains(&c.id))
            .cloned()
            .collect();

        let mut result = BulkActionResult::empty();
        result.total_processed = targets.len();

        for client in &targets {
            let booking = self.booking_context(client);

            let mut variables = booking_variables(&booking);
            variables.insert("clientName".to_string(), client.name.clone());
            variables.insert("clientEmail".to_string(), client.email.clone());
            variables.insert("clientPhone".to_string(), client.phone.clone());
            for (key, value) in custom_vars {
                variables.insert(key.clone(), value.clone());
            }

            let subject = self.engine.render(
                template.subject.as_deref().unwrap_or("Message from {{businessName}}"),
                &variables,
            );
            let content = self.engine.render(&template.content, &variables);

            let sent = self
                .email
                .send_email(EmailMessage {
                    to: client.email.clone(),
                    subject,
                    html: branded_shell(&content, &booking.business_name),
                    attachments: vec![],
                })
                .await;

            if sent {
                result.record_success(client);
            } else {
                result.record_failure(&client.id, &client.name, "Email delivery failed");
            }
        }

        result.success = result.success_count > 0;
        result
    }

    /// Reminders for tomorrow's confirmed appointments that have not had one.
    pub async fn send_reminders_to_upcoming(&self) -> BulkActionResult {
        let tomorrow = Utc::now().date_naive() + Duration::days(1);
        let client_ids: Vec<String> = self
            .directory
            .appointments()
            .iter()
            .filter(|a| {
                a.date == tomorrow && !a.reminder_sent && a.status == AppointmentStatus::Confirmed
            })
            .map(|a| a.client_id.clone())
            .collect();

        let template = match self
            .directory
            .template_by_category(TemplateCategory::Reminder, TemplateKind::Email)
        {
            Some(template) => template.id.clone(),
            None => return BulkActionResult::with_error("No reminder template found"),
        };

        self.send_bulk_emails(&client_ids, &template, &HashMap::new()).await
    }

    /// Followups for appointments completed in the last week.
    pub async fn send_followups_to_completed(&self) -> BulkActionResult {
        if !self.followups_enabled {
            return BulkActionResult::with_error("Follow-up emails are disabled");
        }

        let last_week = Utc::now().date_naive() - Duration::days(7);
        let client_ids: Vec<String> = self
            .directory
            .appointments()
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed && a.date >= last_week)
            .map(|a| a.client_id.clone())
            .collect();

        let template = match self
            .directory
            .template_by_category(TemplateCategory::Followup, TemplateKind::Email)
        {
            Some(template) => template.id.clone(),
            None => return BulkActionResult::with_error("No follow-up template found"),
        };

        self.send_bulk_emails(&client_ids, &template, &HashMap::new()).await
    }

    /// Resend the full confirmation email (invite included) for each
    /// appointment id.
    pub async fn resend_confirmations(&self, appointment_ids: &[String]) -> BulkActionResult {
        let targets: Vec<Appointment> = self
            .directory
            .appointments()
            .iter()
            .filter(|a| appointment_ids.contains(&a.id))
            .cloned()
            .collect();

        let mut result = BulkActionResult::empty();
        result.total_processed = targets.len();

        for appointment in &targets {
            let booking = Booking::from_appointment(appointment, self.directory.business());

            if self.email.send_confirmation_email(&booking).await {
                result.success_count += 1;
                result.details.push(BulkDetail {
                    client_id: appointment.client_id.clone(),
                    client_name: appointment.client_name.clone(),
                    status: BulkStatus::Success,
                    error: None,
                });
            } else {
                result.record_failure(
                    &appointment.client_id,
                    &appointment.client_name,
                    "Email delivery failed",
                );
            }
        }

        result.success = result.success_count > 0;
        result
    }

    /// Latest appointment as template context; a placeholder booking when the
    /// client has none yet.
    fn booking_context(&self, client: &Client) -> Booking {
        let business = self.directory.business();

        match self.directory.appointments_for_client(&client.id).first() {
            Some(appointment) => Booking::from_appointment(appointment, business),
            None => Booking {
                id: format!("bulk_{}_{}", Utc::now().timestamp_millis(), client.id),
                client_name: client.name.clone(),
                client_email: client.email.clone(),
                client_phone: client.phone.clone(),
                service_name: "Service".to_string(),
                service_price: Some(0.0),
                service_duration_minutes: 30,
                date: Utc::now().date_naive(),
                time: NaiveTime::from_hms_opt(10, 0, 0).expect("valid default time"),
                notes: None,
                business_name: business.name.clone(),
                business_email: business.email.clone(),
                business_phone: business.phone.clone(),
                business_address: business.address.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mailer::DemoMailer;
    use crate::domain::model::BusinessProfile;

    fn profile() -> BusinessProfile {
        BusinessProfile {
            name: "Bookline Demo Studio".to_string(),
            email: "appointments@bookline.local".to_string(),
            phone: None,
            address: None,
        }
    }

    fn service_under_test(mailer: DemoMailer) -> BulkActionsService<DemoMailer> {
        let directory = Arc::new(BusinessDirectory::with_sample_data(profile()));
        BulkActionsService::new(EmailService::new(mailer), directory)
    }

    #[tokio::test]
    async fn test_bulk_send_renders_template_per_client() {
        let mailer = DemoMailer::new();
        let service = service_under_test(mailer.clone());

        let ids = vec!["client_1".to_string(), "client_3".to_string()];
        let result = service
            .send_bulk_emails(&ids, "template_3", &HashMap::new())
            .await;

        assert!(result.success);
        assert_eq!(result.total_processed, 2);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 0);

        let sent = mailer.sent_messages().await;
        assert_eq!(sent.len(), 2);

        let to_mike = sent.iter().find(|m| m.to == "mike.davis@example.com").unwrap();
        // client_3's latest appointment is the Treatment
        assert_eq!(to_mike.subject, "How was your Treatment appointment?");
        assert!(to_mike.html.contains("Dear Mike Davis"));
        assert!(to_mike.html.contains("Thank you for choosing Bookline Demo Studio!"));
    }

    #[tokio::test]
    async fn test_bulk_send_unknown_template() {
        let service = service_under_test(DemoMailer::new());

        let result = service
            .send_bulk_emails(&["client_1".to_string()], "nope", &HashMap::new())
            .await;

        assert!(!result.success);
        assert_eq!(result.errors, vec!["Template not found".to_string()]);
        assert_eq!(result.total_processed, 0);
    }

    #[tokio::test]
    async fn test_bulk_send_ignores_unknown_clients() {
        let mailer = DemoMailer::new();
        let service = service_under_test(mailer.clone());

        let ids = vec!["client_1".to_string(), "ghost".to_string()];
        let result = service
            .send_bulk_emails(&ids, "template_3", &HashMap::new())
            .await;

        assert_eq!(result.total_processed, 1);
        assert_eq!(mailer.sent_messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_variables_override_standard_ones() {
        let mailer = DemoMailer::new();
        let service = service_under_test(mailer.clone());

        let mut custom = HashMap::new();
        custom.insert("businessName".to_string(), "Override Inc".to_string());

        let result = service
            .send_bulk_emails(&["client_1".to_string()], "template_3", &custom)
            .await;
        assert!(result.success);

        let sent = mailer.sent_messages().await;
        assert!(sent[0].html.contains("Thank you for choosing Override Inc!"));
    }

    #[tokio::test]
    async fn test_reminders_to_upcoming_picks_tomorrows_unreminded() {
        let mailer = DemoMailer::new();
        let service = service_under_test(mailer.clone());

        let result = service.send_reminders_to_upcoming().await;

        // Seed data has exactly one confirmed, unreminded appointment tomorrow
        assert!(result.success);
        assert_eq!(result.total_processed, 1);

        let sent = mailer.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "john.smith@example.com");
        assert_eq!(sent[0].subject, "Reminder: Consultation appointment tomorrow");
    }

    #[tokio::test]
    async fn test_followups_to_completed_picks_recent_completions() {
        let mailer = DemoMailer::new();
        let service = service_under_test(mailer.clone());

        let result = service.send_followups_to_completed().await;

        assert!(result.success);
        assert_eq!(result.total_processed, 1);
        assert_eq!(mailer.sent_messages().await[0].to, "mike.davis@example.com");
    }

    #[tokio::test]
    async fn test_followups_respect_channel_toggle() {
        let mailer = DemoMailer::new();
        let service = service_under_test(mailer.clone()).with_followups_enabled(false);

        let result = service.send_followups_to_completed().await;

        assert!(!result.success);
        assert_eq!(result.errors, vec!["Follow-up emails are disabled".to_string()]);
        assert!(mailer.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_resend_confirmations_accounts_per_appointment() {
        let mailer = DemoMailer::new();
        let service = service_under_test(mailer.clone());

        let ids = vec!["apt_1".to_string(), "apt_3".to_string(), "missing".to_string()];
        let result = service.resend_confirmations(&ids).await;

        assert!(result.success);
        assert_eq!(result.total_processed, 2);
        assert_eq!(result.success_count, 2);

        let sent = mailer.sent_messages().await;
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.subject.contains("Appointment Confirmed")));
        assert!(sent.iter().all(|m| m.attachments.len() == 1));
    }
}
