use lettre::message::header::ContentType;
use lettre::message::{header, Mailbox, Mailboxes};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

use crate::config::{smtp_password, NotifyConfig};

/// What the couple is told after a committed RSVP.
#[derive(Debug, Clone, PartialEq)]
pub struct RsvpNotice {
    pub guest_name: String,
    pub attending: bool,
    pub dietary_restrictions: Option<String>,
    /// name and dietary restrictions of the plus-one, when one is coming
    pub plus_one: Option<(String, Option<String>)>,
    pub is_update: bool,
}

impl RsvpNotice {
    fn response(&self) -> &'static str {
        if self.attending {
            "accepted"
        } else {
            "declined"
        }
    }

    pub fn subject(&self) -> String {
        if self.is_update {
            format!("{} has updated their RSVP", self.guest_name)
        } else {
            format!("{} has {} your invitation.", self.guest_name, self.response())
        }
    }

    pub fn body(&self) -> String {
        let diet = self.dietary_restrictions.as_deref().unwrap_or("N/A");
        let mut body = format!(
            "{} has {} your invitation.\nDietary restrictions: {}\n",
            self.guest_name,
            self.response(),
            diet
        );

        if let Some((name, diet)) = &self.plus_one {
            body.push_str(&format!(
                "Plus one name: {}\nPlus one dietary restrictions: {}\n",
                name,
                diet.as_deref().unwrap_or("N/A")
            ));
        }
        body
    }
}

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailboxes,
}

impl Mailer {
    pub fn new(config: &NotifyConfig, password: String) -> Result<Self, String> {
        let credentials = Credentials::new(config.username.clone(), password);
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.relay)
            .map_err(|e| format!("invalid SMTP relay {}: {e}", config.relay))?
            .credentials(credentials)
            .build();
        let from = config
            .from
            .parse()
            .map_err(|e| format!("invalid sender {}: {e}", config.from))?;
        let to = config
            .to
            .parse()
            .map_err(|e| format!("invalid recipients {}: {e}", config.to))?;

        Ok(Self { transport, from, to })
    }

    fn message(&self, notice: &RsvpNotice) -> Result<Message, lettre::error::Error> {
        let to_header: header::To = self.to.clone().into();
        Message::builder()
            .mailbox(to_header)
            .from(self.from.clone())
            .subject(notice.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notice.body())
    }
}

/// Delivery channel for RSVP notices, held as managed state.
pub enum Notifier {
    Smtp(Mailer),
    Log,
}

impl Notifier {
    pub fn from_config(config: Option<&NotifyConfig>) -> Self {
        let Some(config) = config else {
            return Notifier::Log;
        };
        let Some(password) = smtp_password() else {
            return Notifier::Log;
        };

        match Mailer::new(config, password) {
            Ok(mailer) => Notifier::Smtp(mailer),
            Err(e) => {
                warn!("SMTP notifier disabled: {e}");
                Notifier::Log
            }
        }
    }

    /// Delivers a notice. Failures are logged and never reach the caller.
    pub async fn notify(&self, notice: &RsvpNotice) {
        match self {
            Notifier::Log => info!(subject = %notice.subject(), "rsvp notice"),
            Notifier::Smtp(mailer) => {
                let message = match mailer.message(notice) {
                    Ok(message) => message,
                    Err(e) => {
                        error!("could not build rsvp notice: {e}");
                        return;
                    }
                };
                match mailer.transport.send(message).await {
                    Ok(_) => info!(subject = %notice.subject(), "rsvp notice sent"),
                    Err(e) => error!("could not send rsvp notice: {e:?}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> RsvpNotice {
        RsvpNotice {
            guest_name: "Ada Lovelace".into(),
            attending: true,
            dietary_restrictions: None,
            plus_one: Some(("Charles Babbage".into(), Some("vegetarian".into()))),
            is_update: false,
        }
    }

    #[test]
    fn subject_names_the_answer() {
        assert_eq!(notice().subject(), "Ada Lovelace has accepted your invitation.");

        let declined = RsvpNotice {
            attending: false,
            ..notice()
        };
        assert_eq!(declined.subject(), "Ada Lovelace has declined your invitation.");
    }

    #[test]
    fn resubmission_is_flagged_as_update() {
        let update = RsvpNotice {
            is_update: true,
            ..notice()
        };
        assert_eq!(update.subject(), "Ada Lovelace has updated their RSVP");
    }

    #[test]
    fn body_lists_plus_one() {
        let body = notice().body();
        assert!(body.contains("Dietary restrictions: N/A"));
        assert!(body.contains("Plus one name: Charles Babbage"));
        assert!(body.contains("Plus one dietary restrictions: vegetarian"));
    }

    #[test]
    fn missing_config_falls_back_to_log() {
        assert!(matches!(Notifier::from_config(None), Notifier::Log));
    }
}
