use clap::Parser;

/// Command-line driver flags. Booking fields default to a demo booking so
/// `bookline` runs end-to-end out of the box.
#[derive(Debug, Clone, Parser)]
#[command(name = "bookline")]
#[command(about = "Appointment booking and reminder service")]
pub struct CliConfig {
    #[arg(long, default_value = "bookline.toml", help = "Path to the TOML configuration file")]
    pub config: String,

    #[arg(long, default_value = "John Doe")]
    pub client_name: String,

    #[arg(long, default_value = "john@example.com")]
    pub client_email: String,

    #[arg(long, default_value = "+1 (555) 000-1111")]
    pub client_phone: String,

    #[arg(long, default_value = "Consultation")]
    pub service: String,

    #[arg(long, help = "Service price; omitted from the confirmation email when unset")]
    pub price: Option<f64>,

    #[arg(long, default_value = "30")]
    pub duration_minutes: u32,

    #[arg(long, help = "Appointment date (YYYY-MM-DD); defaults to three days from now")]
    pub date: Option<String>,

    #[arg(long, default_value = "10:00")]
    pub time: String,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long, help = "Keep the reminder scheduler running until Ctrl-C")]
    pub watch: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON instead of the compact format")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU/memory stats after the run")]
    pub monitor: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::parse_from(["bookline"]);
        assert_eq!(config.config, "bookline.toml");
        assert_eq!(config.service, "Consultation");
        assert!(!config.verbose);
        assert!(!config.log_json);
        assert!(!config.watch);
    }

    #[test]
    fn test_logging_flags() {
        let config = CliConfig::parse_from(["bookline", "--log-json", "--verbose"]);
        assert!(config.log_json);
        assert!(config.verbose);
    }
}
