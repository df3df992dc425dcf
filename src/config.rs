use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Process configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub frontend_url: String,
    pub upload_dir: PathBuf,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub smtp_host: String,
    pub google_client_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let port = match env::var("PORT") {
            Ok(p) => p.parse().context("PORT must be a number")?,
            Err(_) => 4000,
        };

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into());
        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".into());

        Ok(Config {
            database_url,
            jwt_secret,
            port,
            frontend_url,
            upload_dir: PathBuf::from(upload_dir),
            email_user: env::var("EMAIL_USER").ok().filter(|v| !v.is_empty()),
            email_pass: env::var("EMAIL_PASS").ok().filter(|v| !v.is_empty()),
            smtp_host,
            google_client_id: env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty()),
        })
    }

    /// True when both SMTP credentials are present.
    pub fn mail_configured(&self) -> bool {
        self.email_user.is_some() && self.email_pass.is_some()
    }
}
