use bookline::core::booking::{BookingRequest, BookingService};
use bookline::domain::model::{Booking, BusinessProfile, ReminderStatus};
use bookline::{BusinessDirectory, EmailService, ReminderScheduler, ResendMailer, SchedulerConfig};
use chrono::{Duration, NaiveTime, Utc};
use httpmock::prelude::*;
use std::sync::Arc;

fn profile() -> BusinessProfile {
    BusinessProfile {
        name: "Bookline Demo Studio".to_string(),
        email: "appointments@bookline.local".to_string(),
        phone: Some("+1 (555) 123-4567".to_string()),
        address: Some("123 Business Street, City, State 12345".to_string()),
    }
}

fn build_service(
    base_url: String,
) -> (
    BookingService<ResendMailer>,
    ReminderScheduler<ResendMailer, BusinessDirectory>,
) {
    let directory = Arc::new(BusinessDirectory::with_sample_data(profile()));
    let mailer =
        ResendMailer::new("re_test_key", "appointments@bookline.local").with_base_url(base_url);
    let email = EmailService::new(mailer);
    let scheduler = ReminderScheduler::new(
        email.clone(),
        Arc::clone(&directory),
        SchedulerConfig::default(),
    );
    (
        BookingService::new(email, scheduler.clone(), directory),
        scheduler,
    )
}

fn booking_request() -> BookingRequest {
    BookingRequest {
        client_name: "Jane Roe".to_string(),
        client_email: "jane.roe@example.com".to_string(),
        client_phone: "+1 (555) 777-8888".to_string(),
        service_name: "Assessment".to_string(),
        service_price: Some(150.0),
        service_duration_minutes: 45,
        date: (Utc::now() + Duration::days(3)).date_naive(),
        time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        notes: Some("First visit".to_string()),
    }
}

#[tokio::test]
async fn test_booking_flow_sends_confirmation_and_notification_over_http() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/emails")
            .header("authorization", "Bearer re_test_key");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"id": "email_1"}));
    });

    let (service, scheduler) = build_service(server.base_url());

    let outcome = service.process_booking(booking_request()).await.unwrap();

    assert!(outcome.success);
    assert!(outcome.email_status.client_confirmation);
    assert!(outcome.email_status.business_notification);
    assert!(outcome.email_status.reminder_scheduled);

    // One call for the client confirmation, one for the business notification
    api_mock.assert_hits(2);

    // Drive the scheduler past the reminder fire time: third call
    let reminders = scheduler.scheduled_reminders().await;
    assert_eq!(reminders.len(), 1);
    let fire_at = reminders[0].scheduled_for;

    scheduler.process_due(fire_at + Duration::seconds(1)).await;

    api_mock.assert_hits(3);
    let reminder = scheduler.reminder(&reminders[0].id).await.unwrap();
    assert_eq!(reminder.status, ReminderStatus::Sent);
}

#[tokio::test]
async fn test_booking_survives_email_api_outage() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(500);
    });

    let (service, scheduler) = build_service(server.base_url());

    let outcome = service.process_booking(booking_request()).await.unwrap();

    // Email delivery failed but the booking itself went through
    assert!(outcome.success);
    assert!(!outcome.email_status.client_confirmation);
    assert!(!outcome.email_status.business_notification);
    assert!(outcome.email_status.reminder_scheduled);
    api_mock.assert_hits(2);

    let status = service.booking_status(&outcome.booking_id).await.unwrap();
    assert_eq!(status.client_name, "Jane Roe");
    assert!(!scheduler.scheduled_reminders().await.is_empty());
}

#[tokio::test]
async fn test_reminder_retries_until_api_recovers() {
    let server = MockServer::start();
    let mut failing_mock = server.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(500);
    });

    let directory = Arc::new(BusinessDirectory::with_sample_data(profile()));
    let mailer = ResendMailer::new("re_test_key", "appointments@bookline.local")
        .with_base_url(server.base_url());
    let email = EmailService::new(mailer);
    let scheduler = ReminderScheduler::new(
        email,
        Arc::clone(&directory),
        SchedulerConfig::default(),
    );

    let when = Utc::now() + Duration::days(3);
    let booking = Booking {
        id: "booking_retry".to_string(),
        client_name: "Jane Roe".to_string(),
        client_email: "jane.roe@example.com".to_string(),
        client_phone: "+1 (555) 777-8888".to_string(),
        service_name: "Assessment".to_string(),
        service_price: Some(150.0),
        service_duration_minutes: 45,
        date: when.date_naive(),
        time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        notes: None,
        business_name: "Bookline Demo Studio".to_string(),
        business_email: "appointments@bookline.local".to_string(),
        business_phone: None,
        business_address: None,
    };
    directory.record_booking(booking.clone()).await;

    let reminder_id = scheduler.schedule_reminder(&booking).await.unwrap();
    let fire_at = scheduler.reminder(&reminder_id).await.unwrap().scheduled_for;

    // First attempt fails and is rescheduled
    scheduler.process_due(fire_at + Duration::seconds(1)).await;
    failing_mock.assert_hits(1);
    let reminder = scheduler.reminder(&reminder_id).await.unwrap();
    assert_eq!(reminder.status, ReminderStatus::Pending);
    assert_eq!(reminder.attempts, 1);

    // API comes back up before the retry fires
    failing_mock.delete();
    let ok_mock = server.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"id": "email_2"}));
    });

    scheduler
        .process_due(fire_at + Duration::seconds(302))
        .await;

    ok_mock.assert();
    let reminder = scheduler.reminder(&reminder_id).await.unwrap();
    assert_eq!(reminder.status, ReminderStatus::Sent);
    assert_eq!(reminder.attempts, 1);
}
