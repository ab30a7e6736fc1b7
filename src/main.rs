use bookline::core::booking::{BookingRequest, BookingService};
use bookline::domain::ports::Mailer;
use bookline::utils::error::ErrorSeverity;
use bookline::utils::monitor::SystemMonitor;
use bookline::utils::validation::{self, Validate};
use bookline::utils::{error::BookingError, logger};
use bookline::{
    BookingConfig, BusinessDirectory, CliConfig, DemoMailer, EmailService, ReminderScheduler,
    ResendMailer, SchedulerConfig,
};
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting bookline CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = if Path::new(&cli.config).exists() {
        match BookingConfig::from_file(&cli.config) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("❌ Failed to load configuration: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(1);
            }
        }
    } else {
        tracing::info!("No configuration file at {}, using defaults", cli.config);
        BookingConfig::default()
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let monitor = SystemMonitor::new(cli.monitor);
    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let result = match config.resend_api_key() {
        Some(api_key) => {
            tracing::info!("📧 Email API key configured, sending real email");
            let mut mailer = ResendMailer::new(api_key, config.email.from_address.clone());
            if let Some(base_url) = &config.email.base_url {
                mailer = mailer.with_base_url(base_url.clone());
            }
            run(mailer, &config, &cli).await
        }
        None => {
            tracing::info!("📧 No email API key configured, running in demo mode");
            run(DemoMailer::new(), &config, &cli).await
        }
    };

    match result {
        Ok(()) => {
            tracing::info!("✅ Booking flow completed successfully!");
        }
        Err(e) => {
            tracing::error!(
                "❌ Booking flow failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    monitor.log_stats();

    Ok(())
}

async fn run<M: Mailer + 'static>(
    mailer: M,
    config: &BookingConfig,
    cli: &CliConfig,
) -> bookline::Result<()> {
    let directory = Arc::new(BusinessDirectory::with_sample_data(config.business_profile()));
    let email = EmailService::new(mailer);
    let scheduler = ReminderScheduler::new(
        email.clone(),
        Arc::clone(&directory),
        SchedulerConfig {
            poll_interval_secs: config.poll_interval_secs(),
            max_attempts: config.max_attempts(),
            retry_delay_secs: config.retry_delay_secs(),
            lead_hours: config.reminder_lead_hours(),
        },
    );
    let service = BookingService::new(email, scheduler.clone(), Arc::clone(&directory))
        .with_notifications(config.confirmations_enabled(), config.reminders_enabled());

    let request = booking_request_from_cli(cli, config)?;
    let outcome = service.process_booking(request).await?;

    println!("✅ {}", outcome.message);
    println!("📋 Booking ID: {}", outcome.booking_id);
    println!(
        "📧 Client confirmation: {} | Business notification: {} | Reminder scheduled: {}",
        outcome.email_status.client_confirmation,
        outcome.email_status.business_notification,
        outcome.email_status.reminder_scheduled,
    );

    let summary = directory.summary();
    tracing::info!(
        "📊 Dashboard: {} clients, {} appointments ({} confirmed, {} pending, {} completed), {} upcoming this week",
        summary.total_clients,
        summary.total_appointments,
        summary.confirmed,
        summary.pending,
        summary.completed,
        summary.upcoming_week,
    );

    if cli.watch {
        scheduler.start();
        println!(
            "⏰ Reminder scheduler running (polling every {}s). Press Ctrl-C to stop.",
            config.poll_interval_secs()
        );
        tokio::signal::ctrl_c().await.map_err(BookingError::IoError)?;
        scheduler.stop();
        println!("⏰ Reminder scheduler stopped.");
    }

    Ok(())
}

fn booking_request_from_cli(cli: &CliConfig, config: &BookingConfig) -> bookline::Result<BookingRequest> {
    let date = match &cli.date {
        Some(raw) => {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| BookingError::ValidationError {
                message: format!("Invalid date '{}', expected YYYY-MM-DD", raw),
            })?
        }
        None => (Utc::now() + Duration::days(3)).date_naive(),
    };
    let time = validation::validate_time_hhmm("time", &cli.time)?;

    // When no price is given on the command line, fall back to the configured
    // service catalog.
    let price = cli.price.or_else(|| {
        config
            .business
            .services
            .as_ref()
            .and_then(|services| services.iter().find(|s| s.name == cli.service))
            .map(|s| s.price)
    });

    Ok(BookingRequest {
        client_name: cli.client_name.clone(),
        client_email: cli.client_email.clone(),
        client_phone: cli.client_phone.clone(),
        service_name: cli.service.clone(),
        service_price: price,
        service_duration_minutes: cli.duration_minutes,
        date,
        time,
        notes: cli.notes.clone(),
    })
}
