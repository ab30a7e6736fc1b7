use crate::domain::model::BusinessProfile;
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Placeholder value shipped in sample configs; treated the same as no key.
const API_KEY_PLACEHOLDER: &str = "your_resend_api_key_here";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    pub business: BusinessConfig,
    pub notifications: Option<NotificationConfig>,
    pub email: EmailConfig,
    pub scheduler: Option<SchedulerSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub timezone: Option<String>,
    pub currency: Option<String>,
    pub services: Option<Vec<ServiceConfig>>,
    pub hours: Option<HashMap<String, BusinessHours>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub id: String,
    pub name: String,
    pub duration_minutes: u32,
    pub price: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHours {
    pub open: String,
    pub close: String,
    pub closed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub email_enabled: Option<bool>,
    pub confirmations: Option<bool>,
    pub reminders: Option<bool>,
    pub followups: Option<bool>,
    /// Hours before the appointment at which the reminder fires.
    pub reminder_lead_hours: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Resend API key, usually `${RESEND_API_KEY}` in the config file.
    pub api_key: Option<String>,
    pub from_address: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSection {
    pub poll_interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub retry_delay_secs: Option<i64>,
}

impl BookingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BookingError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BookingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR_NAME}` references with environment values. Unset
    /// variables are left as-is so `resend_api_key()` can spot them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("business.name", &self.business.name)?;
        validation::validate_email("business.email", &self.business.email)?;
        validation::validate_email("email.from_address", &self.email.from_address)?;

        if let Some(base_url) = &self.email.base_url {
            validation::validate_url("email.base_url", base_url)?;
        }

        if let Some(hours) = &self.business.hours {
            for (day, window) in hours {
                validation::validate_time_hhmm(&format!("business.hours.{}.open", day), &window.open)?;
                validation::validate_time_hhmm(&format!("business.hours.{}.close", day), &window.close)?;
            }
        }

        if let Some(services) = &self.business.services {
            for service in services {
                validation::validate_non_empty_string("business.services.name", &service.name)?;
                validation::validate_positive_number(
                    "business.services.duration_minutes",
                    service.duration_minutes as usize,
                    1,
                )?;
            }
        }

        if let Some(notifications) = &self.notifications {
            if let Some(lead) = notifications.reminder_lead_hours {
                // A week of lead time is already generous
                validation::validate_range("notifications.reminder_lead_hours", lead, 1, 168)?;
            }
        }

        if let Some(scheduler) = &self.scheduler {
            if let Some(interval) = scheduler.poll_interval_secs {
                validation::validate_positive_number(
                    "scheduler.poll_interval_secs",
                    interval as usize,
                    1,
                )?;
            }
            if let Some(attempts) = scheduler.max_attempts {
                validation::validate_positive_number(
                    "scheduler.max_attempts",
                    attempts as usize,
                    1,
                )?;
            }
        }

        Ok(())
    }

    /// API key if actually configured; placeholder values and unresolved
    /// `${...}` references count as unconfigured (demo mode).
    pub fn resend_api_key(&self) -> Option<&str> {
        match self.email.api_key.as_deref() {
            Some(key) if !key.is_empty() && key != API_KEY_PLACEHOLDER && !key.starts_with("${") => {
                Some(key)
            }
            _ => None,
        }
    }

    pub fn business_profile(&self) -> BusinessProfile {
        BusinessProfile {
            name: self.business.name.clone(),
            email: self.business.email.clone(),
            phone: self.business.phone.clone(),
            address: self.business.address.clone(),
        }
    }

    pub fn reminder_lead_hours(&self) -> i64 {
        self.notifications
            .as_ref()
            .and_then(|n| n.reminder_lead_hours)
            .unwrap_or(24)
    }

    pub fn reminders_enabled(&self) -> bool {
        let notifications = match &self.notifications {
            Some(n) => n,
            None => return true,
        };
        notifications.email_enabled.unwrap_or(true) && notifications.reminders.unwrap_or(true)
    }

    pub fn confirmations_enabled(&self) -> bool {
        let notifications = match &self.notifications {
            Some(n) => n,
            None => return true,
        };
        notifications.email_enabled.unwrap_or(true) && notifications.confirmations.unwrap_or(true)
    }

    pub fn followups_enabled(&self) -> bool {
        let notifications = match &self.notifications {
            Some(n) => n,
            None => return true,
        };
        notifications.email_enabled.unwrap_or(true) && notifications.followups.unwrap_or(true)
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.scheduler
            .as_ref()
            .and_then(|s| s.poll_interval_secs)
            .unwrap_or(60)
    }

    pub fn max_attempts(&self) -> u32 {
        self.scheduler.as_ref().and_then(|s| s.max_attempts).unwrap_or(3)
    }

    pub fn retry_delay_secs(&self) -> i64 {
        self.scheduler
            .as_ref()
            .and_then(|s| s.retry_delay_secs)
            .unwrap_or(300)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            business: BusinessConfig {
                name: "Bookline Demo Studio".to_string(),
                email: "appointments@bookline.local".to_string(),
                phone: Some("+1 (555) 123-4567".to_string()),
                address: Some("123 Business Street, City, State 12345".to_string()),
                timezone: Some("America/New_York".to_string()),
                currency: Some("USD".to_string()),
                services: Some(vec![
                    ServiceConfig {
                        id: "consultation".to_string(),
                        name: "Consultation".to_string(),
                        duration_minutes: 30,
                        price: 100.0,
                        description: Some("Initial consultation with our experts".to_string()),
                    },
                    ServiceConfig {
                        id: "followup".to_string(),
                        name: "Follow-up".to_string(),
                        duration_minutes: 15,
                        price: 50.0,
                        description: Some("Quick follow-up appointment".to_string()),
                    },
                    ServiceConfig {
                        id: "assessment".to_string(),
                        name: "Assessment".to_string(),
                        duration_minutes: 45,
                        price: 150.0,
                        description: Some("Comprehensive assessment session".to_string()),
                    },
                    ServiceConfig {
                        id: "treatment".to_string(),
                        name: "Treatment".to_string(),
                        duration_minutes: 60,
                        price: 200.0,
                        description: Some("Full treatment session".to_string()),
                    },
                ]),
                hours: None,
            },
            notifications: None,
            email: EmailConfig {
                api_key: None,
                from_address: "appointments@bookline.local".to_string(),
                base_url: None,
            },
            scheduler: None,
        }
    }
}

impl Validate for BookingConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC_CONFIG: &str = r#"
[business]
name = "Riverside Clinic"
email = "front-desk@riverside.example"

[notifications]
reminder_lead_hours = 48

[email]
from_address = "bookings@riverside.example"

[scheduler]
poll_interval_secs = 30
max_attempts = 5
"#;

    #[test]
    fn test_parse_basic_config() {
        let config = BookingConfig::from_toml_str(BASIC_CONFIG).unwrap();

        assert_eq!(config.business.name, "Riverside Clinic");
        assert_eq!(config.reminder_lead_hours(), 48);
        assert_eq!(config.poll_interval_secs(), 30);
        assert_eq!(config.max_attempts(), 5);
        assert_eq!(config.retry_delay_secs(), 300);
        assert!(config.resend_api_key().is_none());
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BOOKLINE_TEST_KEY", "re_live_abc123");

        let content = r#"
[business]
name = "Test"
email = "a@b.co"

[email]
api_key = "${BOOKLINE_TEST_KEY}"
from_address = "a@b.co"
"#;

        let config = BookingConfig::from_toml_str(content).unwrap();
        assert_eq!(config.resend_api_key(), Some("re_live_abc123"));

        std::env::remove_var("BOOKLINE_TEST_KEY");
    }

    #[test]
    fn test_unresolved_env_var_counts_as_unconfigured() {
        let content = r#"
[business]
name = "Test"
email = "a@b.co"

[email]
api_key = "${BOOKLINE_DEFINITELY_UNSET_KEY}"
from_address = "a@b.co"
"#;

        let config = BookingConfig::from_toml_str(content).unwrap();
        assert!(config.resend_api_key().is_none());
    }

    #[test]
    fn test_placeholder_key_counts_as_unconfigured() {
        let content = r#"
[business]
name = "Test"
email = "a@b.co"

[email]
api_key = "your_resend_api_key_here"
from_address = "a@b.co"
"#;

        let config = BookingConfig::from_toml_str(content).unwrap();
        assert!(config.resend_api_key().is_none());
    }

    #[test]
    fn test_notification_toggles() {
        let content = r#"
[business]
name = "Test"
email = "a@b.co"

[notifications]
confirmations = false
reminders = false
followups = true

[email]
from_address = "a@b.co"
"#;

        let config = BookingConfig::from_toml_str(content).unwrap();
        assert!(!config.confirmations_enabled());
        assert!(!config.reminders_enabled());
        assert!(config.followups_enabled());
    }

    #[test]
    fn test_email_enabled_false_disables_all_channels() {
        let content = r#"
[business]
name = "Test"
email = "a@b.co"

[notifications]
email_enabled = false
confirmations = true
reminders = true

[email]
from_address = "a@b.co"
"#;

        let config = BookingConfig::from_toml_str(content).unwrap();
        assert!(!config.confirmations_enabled());
        assert!(!config.reminders_enabled());
        assert!(!config.followups_enabled());
    }

    #[test]
    fn test_invalid_business_email_rejected() {
        let content = r#"
[business]
name = "Test"
email = "not-an-email"

[email]
from_address = "a@b.co"
"#;

        let config = BookingConfig::from_toml_str(content).unwrap();
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_invalid_business_hours_rejected() {
        let content = r#"
[business]
name = "Test"
email = "a@b.co"

[business.hours.monday]
open = "9am"
close = "17:00"

[email]
from_address = "a@b.co"
"#;

        let config = BookingConfig::from_toml_str(content).unwrap();
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(BASIC_CONFIG.as_bytes()).unwrap();

        let config = BookingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.business.name, "Riverside Clinic");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = BookingConfig::default();
        assert!(config.validate_config().is_ok());
        assert!(config.reminders_enabled());
        assert!(config.confirmations_enabled());
        assert!(config.followups_enabled());
        assert_eq!(config.reminder_lead_hours(), 24);
    }
}
