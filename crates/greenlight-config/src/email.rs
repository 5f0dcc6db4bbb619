use clap::{ArgAction, Args};

/// SMTP settings. With `enabled = false` mail is only logged.
#[derive(Clone, Debug, PartialEq, Eq, Args)]
pub struct EmailConfig {
    #[arg(
        id = "smtp_enabled",
        long = "smtp-enabled",
        env = "SMTP_ENABLED",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub enabled: bool,

    #[arg(long = "smtp-host", env = "SMTP_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(
        id = "smtp_port",
        long = "smtp-port",
        env = "SMTP_PORT",
        default_value_t = 1025
    )]
    pub port: u16,

    #[arg(long = "smtp-username", env = "SMTP_USERNAME", default_value = "")]
    pub username: String,

    #[arg(
        long = "smtp-password",
        env = "SMTP_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub password: String,

    #[arg(
        long = "smtp-sender",
        env = "SMTP_SENDER",
        default_value = "Greenlight <no-reply@greenlight.local>"
    )]
    pub sender: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 1025,
            username: String::new(),
            password: String::new(),
            sender: "Greenlight <no-reply@greenlight.local>".to_string(),
        }
    }
}
