use clap::Args;

/// Origins allowed to make cross-origin requests. Empty disables CORS.
#[derive(Clone, Debug, Default, PartialEq, Eq, Args)]
pub struct CorsConfig {
    #[arg(
        long = "cors-trusted-origins",
        env = "CORS_TRUSTED_ORIGINS",
        value_delimiter = ','
    )]
    pub trusted_origins: Vec<String>,
}

impl CorsConfig {
    pub fn is_enabled(&self) -> bool {
        self.trusted_origins.iter().any(|origin| !origin.trim().is_empty())
    }
}
