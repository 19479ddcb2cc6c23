use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use crate::users::User;

pub mod mailer;
pub mod template;

pub use mailer::{Mailer, OutgoingMail, SmtpMailer};

pub const WELCOME_TEMPLATE: &str = "welcome-email";

/// Settings the notifier is built with; constructed once at startup.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    /// Full sender mailbox, e.g. `"CRI Simulator" <noreply@example.com>`.
    pub sender: String,
    pub frontend_url: String,
    pub template_dir: PathBuf,
}

pub fn subject_for(template_name: &str) -> &'static str {
    match template_name {
        "approval-email" => "🎉 Your CRI Simulator Account is Approved!",
        "rejection-email" => "CRI Simulator Account Status Update",
        "welcome-email" => "👋 Welcome to Climate Readiness Index Simulator",
        "password-reset" => "🔐 Reset Your CRI Simulator Password",
        _ => "CRI Simulator Notification",
    }
}

pub struct Notifier {
    settings: NotifierSettings,
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(settings: NotifierSettings, mailer: Arc<dyn Mailer>) -> Self {
        Self { settings, mailer }
    }

    /// Renders `template_name` for `user` and sends it. Never fails: any
    /// error is logged and reported as `false`.
    pub async fn notify(
        &self,
        template_name: &str,
        user: &User,
        extra: &HashMap<String, String>,
    ) -> bool {
        match self.try_notify(template_name, user, extra).await {
            Ok(()) => {
                info!(template = template_name, to = %user.email, "email sent");
                true
            }
            Err(e) => {
                error!(error = ?e, template = template_name, to = %user.email, "email sending failed");
                false
            }
        }
    }

    async fn try_notify(
        &self,
        template_name: &str,
        user: &User,
        extra: &HashMap<String, String>,
    ) -> anyhow::Result<()> {
        let path = self.settings.template_dir.join(format!("{template_name}.html"));
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("read template {}", path.display()))?;

        let html_body = template::render(&raw, |key| match key {
            "name" => Some(user.name.as_str()),
            "email" => Some(user.email.as_str()),
            "frontendUrl" => Some(self.settings.frontend_url.as_str()),
            other => extra.get(other).map(String::as_str),
        });

        self.mailer
            .send(OutgoingMail {
                from: self.settings.sender.clone(),
                to: user.email.clone(),
                subject: subject_for(template_name).to_string(),
                html_body,
            })
            .await
    }
}
