use crate::domain::model::Booking;
use regex::Regex;
use std::collections::HashMap;

/// `{{variable}}` substitution over template subjects and bodies. Unknown
/// placeholders are left in place rather than erased, so a typo in a template
/// is visible in the preview instead of silently vanishing.
pub struct TemplateEngine {
    pattern: Regex,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"\{\{(\w+)\}\}").unwrap(),
        }
    }

    pub fn render(&self, template: &str, variables: &HashMap<String, String>) -> String {
        self.pattern
            .replace_all(template, |caps: &regex::Captures| {
                variables
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .to_string()
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard variable map exposed to message templates.
pub fn booking_variables(booking: &Booking) -> HashMap<String, String> {
    let mut variables = HashMap::new();
    variables.insert("clientName".to_string(), booking.client_name.clone());
    variables.insert("clientEmail".to_string(), booking.client_email.clone());
    variables.insert("clientPhone".to_string(), booking.client_phone.clone());
    variables.insert("businessName".to_string(), booking.business_name.clone());
    variables.insert("businessEmail".to_string(), booking.business_email.clone());
    variables.insert(
        "businessPhone".to_string(),
        booking.business_phone.clone().unwrap_or_default(),
    );
    variables.insert("serviceName".to_string(), booking.service_name.clone());
    variables.insert(
        "servicePrice".to_string(),
        format!("{}", booking.service_price.unwrap_or(0.0)),
    );
    variables.insert(
        "serviceDuration".to_string(),
        booking.service_duration_minutes.to_string(),
    );
    variables.insert("appointmentDate".to_string(), booking.long_date());
    variables.insert("appointmentTime".to_string(), booking.time_hhmm());
    variables.insert("appointmentId".to_string(), booking.id.clone());
    variables
}
