use crate::domain::model::{Attachment, Booking, EmailMessage};
use crate::domain::ports::Mailer;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::sync::Arc;

/// Templated-email pipeline over a [`Mailer`] transport.
///
/// Delivery follows the catch-and-log design of the booking flow: failures
/// are logged and reported as `false`, never propagated, so one bounced
/// email cannot fail an otherwise good booking.
pub struct EmailService<M: Mailer> {
    mailer: Arc<M>,
}

impl<M: Mailer> Clone for EmailService<M> {
    fn clone(&self) -> Self {
        Self {
            mailer: Arc::clone(&self.mailer),
        }
    }
}

impl<M: Mailer> EmailService<M> {
    pub fn new(mailer: M) -> Self {
        Self {
            mailer: Arc::new(mailer),
        }
    }

    pub fn from_arc(mailer: Arc<M>) -> Self {
        Self { mailer }
    }

    /// Send one message, reporting success as a boolean.
    pub async fn send_email(&self, message: EmailMessage) -> bool {
        match self.mailer.send(&message).await {
            Ok(()) => {
                tracing::info!("Email sent to {}: {}", message.to, message.subject);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to send email to {}: {}", message.to, e);
                false
            }
        }
    }

    /// Confirmation email to the client, with the `.ics` invite attached.
    pub async fn send_confirmation_email(&self, booking: &Booking) -> bool {
        let mut rows = vec![
            detail_row("Service", &booking.service_name),
            detail_row("Date", &booking.long_date()),
            detail_row("Time", &booking.time_hhmm()),
            detail_row(
                "Duration",
                &format!("{} minutes", booking.service_duration_minutes),
            ),
        ];
        if let Some(price) = booking.service_price {
            rows.push(detail_row("Price", &format!("${}", price)));
        }
        rows.push(detail_row("Booking ID", &booking.id));

        let notes_block = booking
            .notes
            .as_deref()
            .map(|notes| {
                format!(
                    "<div style=\"margin: 20px 0;\"><h4>Additional Notes:</h4>\
                     <p style=\"background-color: #f9f9f9; padding: 15px; border-radius: 6px; margin: 0;\">{}</p></div>",
                    notes
                )
            })
            .unwrap_or_default();

        let body = format!(
            r#"<p>Dear {client},</p>
<p>Thank you for booking an appointment with <strong>{business}</strong>. Your appointment has been confirmed and we look forward to seeing you.</p>
<div class="appointment-card">
    <h3 style="margin-top: 0; color: #000;">Appointment Details</h3>
    {rows}
</div>
{notes}
<div style="margin: 30px 0; text-align: center;">
    <p><strong>Add to your calendar:</strong></p>
    <p style="font-size: 14px; color: #666;">A calendar invite (.ics file) is attached to this email. Click on it to add this appointment to your calendar.</p>
</div>
{contact}
<div style="margin: 30px 0; padding: 20px; background-color: #f0f9ff; border-radius: 6px;">
    <h4 style="margin-top: 0; color: #0369a1;">Important Reminders:</h4>
    <ul style="margin: 0; padding-left: 20px;">
        <li>Please arrive 5-10 minutes before your scheduled time</li>
        <li>You will receive a reminder email before your appointment</li>
        <li>If you need to reschedule or cancel, please contact us at least 24 hours in advance</li>
        <li>Bring any relevant documents or information related to your appointment</li>
    </ul>
</div>"#,
            client = booking.client_name,
            business = booking.business_name,
            rows = rows.join("\n    "),
            notes = notes_block,
            contact = contact_block(booking),
        );

        let html = email_shell(
            "Appointment Confirmation",
            "#000",
            "Appointment Confirmed",
            "Your appointment has been successfully booked",
            &body,
            &automated_footer(booking, "confirmation email"),
        );

        self.send_email(EmailMessage {
            to: booking.client_email.clone(),
            subject: format!(
                "Appointment Confirmed - {} on {}",
                booking.service_name,
                booking.date.format("%m/%d/%Y")
            ),
            html,
            attachments: vec![ics_attachment(booking)],
        })
        .await
    }

    /// "Appointment tomorrow" reminder sent by the scheduler.
    pub async fn send_reminder_email(&self, booking: &Booking) -> bool {
        let rows = [
            detail_row("Service", &booking.service_name),
            detail_row("Date", &booking.long_date()),
            detail_row("Time", &booking.time_hhmm()),
            detail_row(
                "Duration",
                &format!("{} minutes", booking.service_duration_minutes),
            ),
            detail_row("Booking ID", &booking.id),
        ];

        let body = format!(
            r#"<div class="reminder-card" style="background-color: #fef3c7; border: 1px solid #f59e0b; border-radius: 8px; padding: 20px; margin: 20px 0;">
    <h3 style="margin-top: 0; color: #92400e;">Reminder: Appointment Tomorrow</h3>
    <p style="margin-bottom: 0; color: #92400e;">This is a friendly reminder that you have an appointment scheduled for tomorrow.</p>
</div>
<p>Dear {client},</p>
<p>We wanted to remind you about your upcoming appointment with <strong>{business}</strong>.</p>
<div class="appointment-card">
    <h3 style="margin-top: 0; color: #000;">Appointment Details</h3>
    {rows}
</div>
<div style="margin: 30px 0; text-align: center;">
    <a href="mailto:{business_email}?subject=Appointment%20Confirmation%20-%20{id}" class="button">Confirm Appointment</a>
    <a href="mailto:{business_email}?subject=Reschedule%20Request%20-%20{id}" class="button button-secondary">Reschedule</a>
</div>
{contact}
<div style="margin: 30px 0; padding: 20px; background-color: #f0f9ff; border-radius: 6px;">
    <h4 style="margin-top: 0; color: #0369a1;">Preparation Checklist:</h4>
    <ul style="margin: 0; padding-left: 20px;">
        <li>Arrive 5-10 minutes early</li>
        <li>Bring any relevant documents</li>
        <li>Have your booking ID ready: <strong>{id}</strong></li>
        <li>Contact us if you need to make any changes</li>
    </ul>
</div>
<div style="margin: 30px 0; padding: 15px; background-color: #fee2e2; border-radius: 6px; border-left: 4px solid #ef4444;">
    <p style="margin: 0; color: #991b1b;"><strong>Cancellation Policy:</strong> Please provide at least 24 hours notice for cancellations or rescheduling to avoid any fees.</p>
</div>"#,
            client = booking.client_name,
            business = booking.business_name,
            business_email = booking.business_email,
            id = booking.id,
            rows = rows.join("\n    "),
            contact = contact_block(booking),
        );

        let html = email_shell(
            "Appointment Reminder",
            "#1f2937",
            "⏰ Appointment Reminder",
            "Your appointment is coming up soon",
            &body,
            &automated_footer(booking, "reminder"),
        );

        self.send_email(EmailMessage {
            to: booking.client_email.clone(),
            subject: format!(
                "Reminder: {} appointment tomorrow at {}",
                booking.service_name,
                booking.time_hhmm()
            ),
            html,
            attachments: vec![],
        })
        .await
    }

    /// New-booking alert to the business inbox, invite attached.
    pub async fn send_business_notification(&self, booking: &Booking) -> bool {
        let rows = [
            detail_row("Service", &booking.service_name),
            detail_row("Date", &booking.long_date()),
            detail_row("Time", &booking.time_hhmm()),
            detail_row(
                "Duration",
                &format!("{} minutes", booking.service_duration_minutes),
            ),
            detail_row("Booking ID", &booking.id),
        ];

        let notes_line = booking
            .notes
            .as_deref()
            .map(|notes| format!("<p><strong>Notes:</strong> {}</p>", notes))
            .unwrap_or_default();

        let body = format!(
            r#"<div style="background-color: #f0fdf4; border: 1px solid #22c55e; border-radius: 8px; padding: 20px; margin: 20px 0;">
    <h3 style="margin-top: 0; color: #059669;">New Booking Alert</h3>
    <p style="margin-bottom: 0; color: #059669;">A new appointment has been scheduled through your booking system.</p>
</div>
<h3>Appointment Details</h3>
{rows}
<div style="background-color: #f9f9f9; border-radius: 6px; padding: 15px; margin: 15px 0;">
    <h4 style="margin-top: 0;">Client Information</h4>
    <p><strong>Name:</strong> {client}</p>
    <p><strong>Email:</strong> {client_email}</p>
    <p><strong>Phone:</strong> {client_phone}</p>
    {notes}
</div>
<div style="margin: 30px 0; padding: 15px; background-color: #eff6ff; border-radius: 6px;">
    <h4 style="margin-top: 0; color: #1d4ed8;">Next Steps:</h4>
    <ul style="margin: 0; padding-left: 20px;">
        <li>The client has been sent a confirmation email with calendar invite</li>
        <li>A reminder email will be sent before the appointment</li>
        <li>Add this appointment to your calendar using the attached .ics file</li>
        <li>Contact the client if you need to confirm any details</li>
    </ul>
</div>"#,
            rows = rows.join("\n"),
            client = booking.client_name,
            client_email = booking.client_email,
            client_phone = booking.client_phone,
            notes = notes_line,
        );

        let html = email_shell(
            "New Appointment Booking",
            "#059669",
            "🎉 New Appointment Booked",
            "You have received a new appointment booking",
            &body,
            "",
        );

        self.send_email(EmailMessage {
            to: booking.business_email.clone(),
            subject: format!(
                "New Appointment: {} - {}",
                booking.client_name, booking.service_name
            ),
            html,
            attachments: vec![ics_attachment(booking)],
        })
        .await
    }
}

/// VCALENDAR/VEVENT invite for a booking. Newlines inside DESCRIPTION are
/// escaped as literal `\n` per RFC 5545.
pub fn calendar_invite(booking: &Booking) -> String {
    let start = booking.starts_at().format("%Y%m%dT%H%M%SZ");
    let end = booking.ends_at().format("%Y%m%dT%H%M%SZ");

    let uid_domain = booking
        .business_email
        .split_once('@')
        .map(|(_, domain)| domain)
        .unwrap_or("bookline.local");

    let mut description = format!(
        "Appointment Details:\\n\\nService: {}\\nDuration: {} minutes\\nClient: {}\\nPhone: {}",
        booking.service_name,
        booking.service_duration_minutes,
        booking.client_name,
        booking.client_phone
    );
    if let Some(notes) = &booking.notes {
        description.push_str(&format!("\\nNotes: {}", notes));
    }

    let location = booking
        .business_address
        .as_deref()
        .unwrap_or(&booking.business_name);

    format!(
        "BEGIN:VCALENDAR\n\
         VERSION:2.0\n\
         PRODID:-//{business}//Appointment System//EN\n\
         CALSCALE:GREGORIAN\n\
         METHOD:REQUEST\n\
         BEGIN:VEVENT\n\
         UID:{id}@{uid_domain}\n\
         DTSTART:{start}\n\
         DTEND:{end}\n\
         SUMMARY:{service} - {business}\n\
         DESCRIPTION:{description}\n\
         LOCATION:{location}\n\
         ORGANIZER;CN={business}:mailto:{business_email}\n\
         ATTENDEE;CN={client};RSVP=TRUE:mailto:{client_email}\n\
         STATUS:CONFIRMED\n\
         SEQUENCE:0\n\
         END:VEVENT\n\
         END:VCALENDAR",
        business = booking.business_name,
        id = booking.id,
        uid_domain = uid_domain,
        start = start,
        end = end,
        service = booking.service_name,
        description = description,
        location = location,
        business_email = booking.business_email,
        client = booking.client_name,
        client_email = booking.client_email,
    )
}

fn ics_attachment(booking: &Booking) -> Attachment {
    Attachment {
        filename: "appointment.ics".to_string(),
        content: BASE64.encode(calendar_invite(booking)),
        content_type: "text/calendar".to_string(),
    }
}

/// Branded HTML shell for free-form (bulk/template) message content. The
/// content keeps its line breaks via `white-space: pre-wrap`.
pub fn branded_shell(content: &str, business_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Message from {business}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }}
        .container {{ max-width: 600px; margin: 0 auto; background-color: white; }}
        .header {{ background-color: #000; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 30px; white-space: pre-wrap; }}
        .footer {{ background-color: #f9f9f9; padding: 20px; text-align: center; color: #666; font-size: 14px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{business}</h1>
        </div>
        <div class="content">{content}</div>
        <div class="footer">
            <p>This message was sent by {business}</p>
            <p>If you have any questions, please contact us directly.</p>
        </div>
    </div>
</body>
</html>"#,
        business = business_name,
        content = content,
    )
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        "<div class=\"detail-row\"><span class=\"detail-label\">{}:</span>\
         <span class=\"detail-value\">{}</span></div>",
        label, value
    )
}

fn contact_block(booking: &Booking) -> String {
    let phone_line = booking
        .business_phone
        .as_deref()
        .map(|phone| format!("Phone: {}<br>", phone))
        .unwrap_or_default();
    let address_line = booking
        .business_address
        .as_deref()
        .map(|address| format!("Address: {}", address))
        .unwrap_or_default();

    format!(
        r#"<div style="margin: 30px 0;">
    <h4>Contact Information:</h4>
    <p>
        <strong>{business}</strong><br>
        Email: {email}<br>
        {phone}{address}
    </p>
</div>"#,
        business = booking.business_name,
        email = booking.business_email,
        phone = phone_line,
        address = address_line,
    )
}

fn automated_footer(booking: &Booking, kind: &str) -> String {
    format!(
        "<p>This is an automated {} from {}</p>\
         <p>If you have any questions, please contact us at {}</p>",
        kind, booking.business_name, booking.business_email
    )
}

fn email_shell(
    title: &str,
    header_color: &str,
    heading: &str,
    tagline: &str,
    body: &str,
    footer: &str,
) -> String {
    let footer_div = if footer.is_empty() {
        String::new()
    } else {
        format!("<div class=\"footer\">{}</div>", footer)
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }}
        .container {{ max-width: 600px; margin: 0 auto; background-color: white; }}
        .header {{ background-color: {header_color}; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 30px; }}
        .appointment-card {{ background-color: #f9f9f9; border: 1px solid #e0e0e0; border-radius: 8px; padding: 20px; margin: 20px 0; }}
        .detail-row {{ display: flex; justify-content: space-between; margin: 10px 0; padding: 8px 0; border-bottom: 1px solid #eee; }}
        .detail-label {{ font-weight: 600; color: #666; }}
        .detail-value {{ font-weight: 500; color: #000; }}
        .button {{ display: inline-block; background-color: #000; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 10px 5px; }}
        .button-secondary {{ background-color: #6b7280; }}
        .footer {{ background-color: #f9f9f9; padding: 20px; text-align: center; color: #666; font-size: 14px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{heading}</h1>
            <p>{tagline}</p>
        </div>
        <div class="content">
{body}
        </div>
        {footer_div}
    </div>
</body>
</html>"#,
        title = title,
        header_color = header_color,
        heading = heading,
        tagline = tagline,
        body = body,
        footer_div = footer_div,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mailer::DemoMailer;
    use chrono::{NaiveDate, NaiveTime};

    fn sample_booking() -> Booking {
        Booking {
            id: "booking_42".to_string(),
            client_name: "Mike Davis".to_string(),
            client_email: "mike.davis@example.com".to_string(),
            client_phone: "+1 (555) 345-6789".to_string(),
            service_name: "Treatment".to_string(),
            service_price: Some(200.0),
            service_duration_minutes: 60,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            notes: Some("Bring previous scans".to_string()),
            business_name: "Bookline Demo Studio".to_string(),
            business_email: "appointments@bookline.local".to_string(),
            business_phone: Some("+1 (555) 123-4567".to_string()),
            business_address: Some("123 Business Street, City, State 12345".to_string()),
        }
    }

    #[test]
    fn test_calendar_invite_structure() {
        let ics = calendar_invite(&sample_booking());

        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert!(ics.ends_with("END:VCALENDAR"));
        assert!(ics.contains("UID:booking_42@bookline.local"));
        assert!(ics.contains("DTSTART:20240115T093000Z"));
        assert!(ics.contains("DTEND:20240115T103000Z"));
        assert!(ics.contains("SUMMARY:Treatment - Bookline Demo Studio"));
        assert!(ics.contains("\\nNotes: Bring previous scans"));
        assert!(ics.contains("LOCATION:123 Business Street, City, State 12345"));
        assert!(ics.contains("STATUS:CONFIRMED"));
    }

    #[test]
    fn test_calendar_invite_without_address_uses_business_name() {
        let mut booking = sample_booking();
        booking.business_address = None;

        let ics = calendar_invite(&booking);
        assert!(ics.contains("LOCATION:Bookline Demo Studio"));
    }

    #[tokio::test]
    async fn test_confirmation_email_has_invite_attachment() {
        let mailer = DemoMailer::new();
        let service = EmailService::new(mailer.clone());

        let sent = service.send_confirmation_email(&sample_booking()).await;
        assert!(sent);

        let messages = mailer.sent_messages().await;
        assert_eq!(messages.len(), 1);
        let message = &messages[0];

        assert_eq!(message.to, "mike.davis@example.com");
        assert!(message.subject.contains("Appointment Confirmed - Treatment"));
        assert!(message.html.contains("Mike Davis"));
        assert!(message.html.contains("$200"));
        assert!(message.html.contains("Bring previous scans"));

        assert_eq!(message.attachments.len(), 1);
        assert_eq!(message.attachments[0].filename, "appointment.ics");
        assert_eq!(message.attachments[0].content_type, "text/calendar");
        let decoded = BASE64.decode(&message.attachments[0].content).unwrap();
        assert!(String::from_utf8(decoded).unwrap().contains("BEGIN:VCALENDAR"));
    }

    #[tokio::test]
    async fn test_reminder_email_targets_client_without_attachment() {
        let mailer = DemoMailer::new();
        let service = EmailService::new(mailer.clone());

        assert!(service.send_reminder_email(&sample_booking()).await);

        let messages = mailer.sent_messages().await;
        assert_eq!(messages[0].to, "mike.davis@example.com");
        assert_eq!(
            messages[0].subject,
            "Reminder: Treatment appointment tomorrow at 09:30"
        );
        assert!(messages[0].attachments.is_empty());
        assert!(messages[0].html.contains("Cancellation Policy"));
    }

    #[tokio::test]
    async fn test_business_notification_targets_business_inbox() {
        let mailer = DemoMailer::new();
        let service = EmailService::new(mailer.clone());

        assert!(service.send_business_notification(&sample_booking()).await);

        let messages = mailer.sent_messages().await;
        assert_eq!(messages[0].to, "appointments@bookline.local");
        assert_eq!(messages[0].subject, "New Appointment: Mike Davis - Treatment");
        assert_eq!(messages[0].attachments.len(), 1);
        assert!(messages[0].html.contains("Client Information"));
    }

    #[test]
    fn test_branded_shell_preserves_line_breaks() {
        let html = branded_shell("Line one\nLine two", "Acme");
        assert!(html.contains("white-space: pre-wrap"));
        assert!(html.contains("Line one\nLine two"));
        assert!(html.contains("<h1>Acme</h1>"));
    }
}
