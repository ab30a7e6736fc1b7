use crate::core::email::EmailService;
use crate::domain::model::{Booking, ReminderKind, ReminderStatus, ScheduledReminder};
use crate::domain::ports::{BookingStore, Mailer};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: i64,
    /// Hours before the appointment at which the reminder fires.
    pub lead_hours: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            max_attempts: 3,
            retry_delay_secs: 300,
            lead_hours: 24,
        }
    }
}

struct Inner<M: Mailer, B: BookingStore> {
    reminders: Mutex<HashMap<String, ScheduledReminder>>,
    email: EmailService<M>,
    bookings: Arc<B>,
    config: SchedulerConfig,
}

/// Reminder scheduler: an in-memory pending-reminder map drained by a
/// periodic polling task. Sends go through [`EmailService`]; failures are
/// retried after a delay up to `max_attempts`, then marked failed.
pub struct ReminderScheduler<M: Mailer + 'static, B: BookingStore + 'static> {
    inner: Arc<Inner<M, B>>,
    handle: Arc<StdMutex<Option<JoinHandle<()>>>>,
}

impl<M: Mailer + 'static, B: BookingStore + 'static> Clone for ReminderScheduler<M, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<M: Mailer + 'static, B: BookingStore + 'static> ReminderScheduler<M, B> {
    pub fn new(email: EmailService<M>, bookings: Arc<B>, config: SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                reminders: Mutex::new(HashMap::new()),
                email,
                bookings,
                config,
            }),
            handle: Arc::new(StdMutex::new(None)),
        }
    }

    /// Schedule the pre-appointment reminder for a booking. Returns the
    /// reminder id, or None when the appointment is already inside the lead
    /// window (no point reminding about tomorrow's appointment today).
    pub async fn schedule_reminder(&self, booking: &Booking) -> Option<String> {
        let fire_at = booking.starts_at() - Duration::hours(self.inner.config.lead_hours);

        if fire_at <= Utc::now() {
            tracing::info!(
                "Appointment {} is within {}h, skipping reminder scheduling",
                booking.id,
                self.inner.config.lead_hours
            );
            return None;
        }

        let reminder_id = format!("reminder_{}_{}", booking.id, Utc::now().timestamp_millis());
        let reminder = ScheduledReminder {
            id: reminder_id.clone(),
            booking_id: booking.id.clone(),
            scheduled_for: fire_at,
            kind: ReminderKind::Reminder,
            status: ReminderStatus::Pending,
            attempts: 0,
        };

        self.inner
            .reminders
            .lock()
            .await
            .insert(reminder_id.clone(), reminder);
        tracing::info!(
            "Reminder scheduled for {} for booking {}",
            fire_at.to_rfc3339(),
            booking.id
        );

        Some(reminder_id)
    }

    /// Start the polling task. Idempotent: a second call while running is a
    /// no-op.
    pub fn start(&self) {
        let mut guard = self.handle.lock().expect("scheduler handle lock poisoned");
        if guard.is_some() {
            return;
        }

        tracing::info!(
            "Starting reminder scheduler (poll interval {}s)",
            self.inner.config.poll_interval_secs
        );
        let inner = Arc::clone(&self.inner);
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
                inner.config.poll_interval_secs,
            ));
            // First tick fires immediately; skip it so a fresh start doesn't
            // double-process with a caller-driven process_due.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                Inner::process_due(&inner, Utc::now()).await;
            }
        }));
    }

    pub fn stop(&self) {
        let mut guard = self.handle.lock().expect("scheduler handle lock poisoned");
        if let Some(handle) = guard.take() {
            handle.abort();
            tracing::info!("Reminder scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .expect("scheduler handle lock poisoned")
            .is_some()
    }

    /// Process reminders due at `now`. The polling task calls this every
    /// tick; tests call it directly with a chosen clock.
    pub async fn process_due(&self, now: DateTime<Utc>) {
        Inner::process_due(&self.inner, now).await;
    }

    pub async fn scheduled_reminders(&self) -> Vec<ScheduledReminder> {
        self.inner.reminders.lock().await.values().cloned().collect()
    }

    pub async fn reminder(&self, reminder_id: &str) -> Option<ScheduledReminder> {
        self.inner.reminders.lock().await.get(reminder_id).cloned()
    }

    /// Cancel a pending reminder. Sent or already-failed reminders are left
    /// alone.
    pub async fn cancel_reminder(&self, reminder_id: &str) -> bool {
        let mut reminders = self.inner.reminders.lock().await;
        match reminders.get_mut(reminder_id) {
            Some(reminder) if reminder.status == ReminderStatus::Pending => {
                reminder.status = ReminderStatus::Failed; // cancelled
                true
            }
            _ => false,
        }
    }

    /// Cancel every pending reminder for a booking; returns how many.
    pub async fn cancel_for_booking(&self, booking_id: &str) -> usize {
        let mut reminders = self.inner.reminders.lock().await;
        let mut cancelled = 0;
        for reminder in reminders.values_mut() {
            if reminder.booking_id == booking_id && reminder.status == ReminderStatus::Pending {
                reminder.status = ReminderStatus::Failed;
                cancelled += 1;
            }
        }
        cancelled
    }
}

impl<M: Mailer, B: BookingStore> Inner<M, B> {
    async fn process_due(inner: &Arc<Self>, now: DateTime<Utc>) {
        let due: Vec<ScheduledReminder> = {
            let reminders = inner.reminders.lock().await;
            reminders
                .values()
                .filter(|r| {
                    r.status == ReminderStatus::Pending
                        && r.scheduled_for <= now
                        && r.attempts < inner.config.max_attempts
                })
                .cloned()
                .collect()
        };

        for reminder in due {
            tracing::debug!(
                "Processing reminder {} for booking {}",
                reminder.id,
                reminder.booking_id
            );

            match inner.bookings.booking(&reminder.booking_id).await {
                Ok(Some(booking)) => {
                    if inner.email.send_reminder_email(&booking).await {
                        Self::update(inner, &reminder.id, |r| {
                            r.status = ReminderStatus::Sent;
                        })
                        .await;
                        tracing::info!(
                            "Reminder sent successfully for booking {}",
                            reminder.booking_id
                        );
                    } else {
                        Self::record_failure(inner, &reminder, now).await;
                    }
                }
                Ok(None) => {
                    Self::update(inner, &reminder.id, |r| {
                        r.status = ReminderStatus::Failed;
                    })
                    .await;
                    tracing::error!("Booking data not found for reminder {}", reminder.id);
                }
                Err(e) => {
                    tracing::error!("Error processing reminder {}: {}", reminder.id, e);
                    Self::record_failure(inner, &reminder, now).await;
                }
            }
        }
    }

    async fn record_failure(inner: &Arc<Self>, reminder: &ScheduledReminder, now: DateTime<Utc>) {
        let max_attempts = inner.config.max_attempts;
        let retry_delay = Duration::seconds(inner.config.retry_delay_secs);
        let booking_id = reminder.booking_id.clone();

        Self::update(inner, &reminder.id, |r| {
            r.attempts += 1;
            if r.attempts >= max_attempts {
                r.status = ReminderStatus::Failed;
                tracing::error!(
                    "Failed to send reminder for booking {} after {} attempts",
                    booking_id,
                    max_attempts
                );
            } else {
                r.scheduled_for = now + retry_delay;
                tracing::warn!(
                    "Retrying reminder for booking {} in {}s",
                    booking_id,
                    retry_delay.num_seconds()
                );
            }
        })
        .await;
    }

    async fn update<F: FnOnce(&mut ScheduledReminder)>(inner: &Arc<Self>, id: &str, f: F) {
        let mut reminders = inner.reminders.lock().await;
        if let Some(reminder) = reminders.get_mut(id) {
            f(reminder);
        }
    }
}
