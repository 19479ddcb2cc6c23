use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use crate::notify::NotifierSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Outbound SMTP settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
}

impl MailConfig {
    pub fn sender(&self) -> String {
        format!("\"{}\" <{}>", self.from_name, self.from_address)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub frontend_url: String,
    pub template_dir: PathBuf,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: var_or("JWT_ISSUER", "cri-accounts"),
            audience: var_or("JWT_AUDIENCE", "cri-users"),
            ttl_minutes: parsed_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: parsed_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };

        let username = std::env::var("EMAIL_USER").ok().filter(|v| !v.is_empty());
        let from_address = std::env::var("EMAIL_FROM")
            .ok()
            .or_else(|| username.clone())
            .unwrap_or_else(|| "no-reply@localhost".into());
        let mail = MailConfig {
            host: var_or("EMAIL_HOST", "smtp.gmail.com"),
            port: parsed_or("EMAIL_PORT", 587),
            username,
            password: std::env::var("EMAIL_PASS").ok(),
            from_address,
            from_name: var_or("EMAIL_FROM_NAME", "CRI Simulator"),
        };

        Ok(Self {
            database_url,
            jwt,
            mail,
            frontend_url: var_or("FRONTEND_URL", "http://localhost:3000"),
            template_dir: PathBuf::from(var_or("TEMPLATE_DIR", "templates")),
        })
    }

    pub fn notifier_settings(&self) -> NotifierSettings {
        NotifierSettings {
            sender: self.mail.sender(),
            frontend_url: self.frontend_url.clone(),
            template_dir: self.template_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_quotes_display_name() {
        let mail = MailConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: None,
            password: None,
            from_address: "noreply@example.com".into(),
            from_name: "CRI Simulator".into(),
        };
        assert_eq!(mail.sender(), "\"CRI Simulator\" <noreply@example.com>");
    }
}
