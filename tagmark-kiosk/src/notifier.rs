//! EmailJS notifier
//!
//! Sends one transactional email per attendance event. Best-effort: a failed
//! send is logged by the caller and otherwise ignored; it never blocks or
//! rolls back the attendance record already written.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use tagmark_common::config::EmailConfig;
use tagmark_common::db::User;
use tagmark_common::events::AttendanceAction;
use tagmark_common::time;

const USER_AGENT: &str = concat!("tagmark/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Notifier errors
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),
}

/// Request body for the EmailJS send endpoint
#[derive(Debug, Clone, Serialize)]
struct SendEmailRequest {
    service_id: String,
    template_id: String,
    user_id: String,
    template_params: TemplateParams,
}

#[derive(Debug, Clone, Serialize)]
struct TemplateParams {
    to_name: String,
    from_name: String,
    message: String,
    to_email: String,
    reply_to: String,
}

/// EmailJS API client
pub struct EmailNotifier {
    http_client: reqwest::Client,
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Result<Self, NotifierError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifierError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Send the notification for one attendance event.
    ///
    /// Success is any non-error HTTP status.
    pub async fn send(
        &self,
        user: &User,
        at: NaiveDateTime,
        action: AttendanceAction,
    ) -> Result<(), NotifierError> {
        let body = self.build_request(user, at, action);

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifierError::Api(status.as_u16(), error_text));
        }

        info!(to = %user.email, event = action.label(), "Email notification sent");
        Ok(())
    }

    fn build_request(
        &self,
        user: &User,
        at: NaiveDateTime,
        action: AttendanceAction,
    ) -> SendEmailRequest {
        let message = format!(
            "Dear {},\n\nYou have successfully {} at {}.",
            user.name,
            action.label(),
            time::format_wall_time(at)
        );

        SendEmailRequest {
            service_id: self.config.service_id.clone(),
            template_id: self.config.template_id.clone(),
            user_id: self.config.user_id.clone(),
            template_params: TemplateParams {
                to_name: user.name.clone(),
                from_name: self.config.from_name.clone(),
                message,
                to_email: user.email.clone(),
                reply_to: self.config.reply_to.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_config() -> EmailConfig {
        EmailConfig {
            service_id: "service_abc".to_string(),
            template_id: "template_def".to_string(),
            user_id: "user_ghi".to_string(),
            reply_to: "front-desk@example.com".to_string(),
            from_name: "RFID System".to_string(),
            endpoint: "https://api.emailjs.com/api/v1.0/email/send".to_string(),
        }
    }

    fn test_user() -> User {
        User {
            hexcode: "04A1B2C3".to_string(),
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        assert!(EmailNotifier::new(test_config()).is_ok());
    }

    #[test]
    fn test_request_body_shape() {
        let notifier = EmailNotifier::new(test_config()).unwrap();
        let at = NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();

        let body = notifier.build_request(&test_user(), at, AttendanceAction::TimeIn);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["service_id"], "service_abc");
        assert_eq!(json["template_id"], "template_def");
        assert_eq!(json["user_id"], "user_ghi");

        let params = &json["template_params"];
        assert_eq!(params["to_name"], "Alice");
        assert_eq!(params["from_name"], "RFID System");
        assert_eq!(params["to_email"], "alice@x.com");
        assert_eq!(params["reply_to"], "front-desk@example.com");
        assert_eq!(
            params["message"],
            "Dear Alice,\n\nYou have successfully Time In at Mar 04, 2025 09:15 AM."
        );
    }

    #[test]
    fn test_time_out_message() {
        let notifier = EmailNotifier::new(test_config()).unwrap();
        let at = NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(17, 30, 0)
            .unwrap();

        let body = notifier.build_request(&test_user(), at, AttendanceAction::TimeOut);
        assert!(body
            .template_params
            .message
            .contains("Time Out at Mar 04, 2025 05:30 PM"));
    }
}
