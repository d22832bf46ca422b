use std::env;

use serde::Deserialize;
use tracing::{info, warn};

/// Application settings extracted from the Rocket figment (`Rocket.toml`, `ROCKET_*`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub admin_token: String,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    /// failed token lookups tolerated per client within the window
    #[serde(default = "default_limit")]
    pub max_failures: i64,
    /// submissions tolerated per token within the window
    #[serde(default = "default_limit")]
    pub max_submissions: i64,
    #[serde(default = "default_window")]
    pub window_secs: i64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_failures: default_limit(),
            max_submissions: default_limit(),
            window_secs: default_window(),
        }
    }
}

fn default_limit() -> i64 {
    5
}

fn default_window() -> i64 {
    86400
}

/// SMTP settings for RSVP notices. The password is read from `SMTP_PASSWORD`.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub relay: String,
    pub username: String,
    pub from: String,
    pub to: String,
}

pub fn smtp_password() -> Option<String> {
    match env::var("SMTP_PASSWORD") {
        Ok(password) => Some(password),
        Err(_) => {
            warn!("SMTP_PASSWORD not set, RSVP notices will only be logged");
            None
        }
    }
}

impl AppConfig {
    pub fn log_summary(&self) {
        if self.admin_token.is_empty() {
            warn!("admin_token is empty, administrative routes will reject every request");
        }
        info!(
            max_failures = self.throttle.max_failures,
            max_submissions = self.throttle.max_submissions,
            window_secs = self.throttle.window_secs,
            smtp = self.notify.is_some(),
            "configuration loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::providers::{Format, Toml};
    use rocket::figment::Figment;

    use super::*;

    #[test]
    fn throttle_defaults_apply_when_omitted() {
        let config: AppConfig = Figment::new()
            .merge(Toml::string(r#"admin_token = "secret""#))
            .extract()
            .unwrap();
        assert_eq!(config.admin_token, "secret");
        assert_eq!(config.throttle.max_failures, 5);
        assert_eq!(config.throttle.window_secs, 86400);
        assert!(config.notify.is_none());
    }

    #[test]
    fn notify_section_is_read() {
        let config: AppConfig = Figment::new()
            .merge(Toml::string(
                r#"
                [throttle]
                max_submissions = 9

                [notify]
                relay = "smtp.example.com"
                username = "noreply@example.com"
                from = "RSVP <noreply@example.com>"
                to = "Couple <couple@example.com>"
                "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(config.throttle.max_submissions, 9);
        assert_eq!(config.throttle.max_failures, 5);
        assert_eq!(config.notify.unwrap().relay, "smtp.example.com");
    }
}
