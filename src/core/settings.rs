use serde::{Deserialize, Serialize};

/// Service URL used when neither the settings file nor a flag provides one
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Json struct for board settings
#[derive(Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Base URL of the sign-up service
    pub service_url: String,

    /// Email to pre-fill the sign-up form with
    pub email: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            service_url: DEFAULT_SERVICE_URL.to_owned(),
            email: None,
        }
    }
}
