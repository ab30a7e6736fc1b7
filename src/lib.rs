pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::BookingConfig;
pub use core::booking::BookingService;
pub use core::bulk::BulkActionsService;
pub use core::directory::BusinessDirectory;
pub use core::email::EmailService;
pub use core::mailer::{DemoMailer, ResendMailer};
pub use core::scheduler::{ReminderScheduler, SchedulerConfig};
pub use utils::error::{BookingError, Result};
