//! Application configuration management.
//!
//! All runtime configuration comes from environment variables, loaded once at
//! startup into a process-wide static. External-service credentials default to
//! empty strings so the server can boot unconfigured; the status endpoint
//! reports which integrations are actually set up.
//!
//! # Security Notes
//! - Sensitive fields are clearly marked and should never be logged
//! - Production environments should use secure secret management systems

use anyhow::Context;
use envconfig::Envconfig;
use std::sync::OnceLock;

/// Application configuration loaded from the environment.
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub web_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(default = "3001")]
    pub web_server_port: u64,

    /// Timeout in seconds applied to every outbound HTTP call (NON-SENSITIVE)
    #[envconfig(default = "30")]
    pub http_timeout_secs: u64,

    /// 🔒 SENSITIVE: Gupshup API key, sent as the `apikey` header
    #[envconfig(default = "")]
    pub gupshup_api_key: String,

    /// Gupshup application name (SEMI-SENSITIVE)
    #[envconfig(default = "")]
    pub gupshup_app_name: String,

    /// WhatsApp source number messages are sent from (SEMI-SENSITIVE)
    /// Example: "79001234567"
    #[envconfig(default = "")]
    pub gupshup_source_number: String,

    /// amoCRM account subdomain (NON-SENSITIVE)
    /// Example: "mycompany" for mycompany.amocrm.ru
    #[envconfig(default = "")]
    pub amo_subdomain: String,

    /// amoCRM integration client id (SEMI-SENSITIVE)
    #[envconfig(default = "")]
    pub amo_client_id: String,

    /// 🔒 SENSITIVE: amoCRM integration client secret
    #[envconfig(default = "")]
    pub amo_client_secret: String,

    /// OAuth redirect URI registered with the amoCRM integration (NON-SENSITIVE)
    /// Derived from the server base URL when left empty
    #[envconfig(default = "")]
    pub amo_redirect_uri: String,

    /// amoCRM authorization page URL (NON-SENSITIVE)
    #[envconfig(default = "https://www.amocrm.ru/oauth")]
    pub amo_auth_url: String,

    /// 🔒 SENSITIVE: optional access token to seed the CRM client at startup
    #[envconfig(default = "")]
    pub amo_access_token: String,

    /// 🔒 SENSITIVE: optional refresh token to seed the CRM client at startup
    #[envconfig(default = "")]
    pub amo_refresh_token: String,

    /// Pipeline new leads are created in; amoCRM picks its default when unset
    pub amo_pipeline_id: Option<i64>,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    /// Gets the server URL host with port for non-production environments
    pub fn url_host(&self) -> String {
        if self.is_prod() {
            return self.web_server_host.to_string();
        }

        format!(
            "{host}:{port}",
            host = self.web_server_host,
            port = self.web_server_port
        )
    }

    /// Gets the appropriate protocol (HTTP/HTTPS) based on environment
    pub fn web_server_protocol(&self) -> String {
        if self.is_prod() {
            return "https".into();
        }
        "http".into()
    }

    /// Constructs the complete base URL for the application
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.web_server_protocol(), self.url_host())
    }

    /// amoCRM REST API base, version included
    pub fn amo_api_base_url(&self) -> String {
        format!("https://{}.amocrm.ru/api/v4", self.amo_subdomain)
    }

    /// amoCRM OAuth2 token endpoint, serves both grant types
    pub fn amo_token_endpoint(&self) -> String {
        format!("https://{}.amocrm.ru/oauth2/access_token", self.amo_subdomain)
    }

    /// Redirect URI for the OAuth flow, derived from the base URL when not
    /// configured explicitly
    pub fn oauth_redirect_uri(&self) -> String {
        if self.amo_redirect_uri.is_empty() {
            return format!("{}/api/amo/callback", self.base_url());
        }
        self.amo_redirect_uri.to_string()
    }

    /// Whether the gateway credentials are present
    pub fn gupshup_configured(&self) -> bool {
        !self.gupshup_api_key.is_empty() && !self.gupshup_app_name.is_empty()
    }

    /// Whether the CRM integration credentials are present
    pub fn amocrm_configured(&self) -> bool {
        !self.amo_client_id.is_empty() && !self.amo_client_secret.is_empty()
    }
}

/// Global application configuration instance, set once by [`init_config`]
pub static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Loads the configuration from the environment into [`APP_CONFIG`]
pub async fn init_config() -> anyhow::Result<()> {
    let app_config = AppConfig::init_from_env()
        .context("failed to load application configuration from environment")?;

    APP_CONFIG
        .set(app_config)
        .map_err(|_| anyhow::anyhow!("app config already initialized"))?;

    Ok(())
}
