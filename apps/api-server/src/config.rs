//! api-server configuration.
//!
//! Everything is read from the environment once, at startup. Invalid values
//! abort the process before the listener binds.

use axum::http::HeaderValue;
use mail_notifier::{MailConfigError, MailSettings};
use std::fmt;

/// Where reviewer notifications go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierProvider {
    /// Log only (DO NOT USE IN PRODUCTION: nobody is notified)
    Log,
    /// HTTP mail delivery API
    Mail,
}

/// Catalog backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogProviderKind {
    /// Empty in-memory catalog
    Memory,
    /// PostgREST-style REST data store
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

// Case-insensitive match against `alt`; anything else (or unset) is `default`.
fn choose<T: Copy>(raw: Option<&str>, alt: (&str, T), default: T) -> T {
    match raw {
        Some(v) if v.eq_ignore_ascii_case(alt.0) => alt.1,
        _ => default,
    }
}

#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<MailConfigError> for ConfigError {
    fn from(e: MailConfigError) -> Self {
        let field = match &e {
            MailConfigError::Missing(name) => *name,
            MailConfigError::Invalid { field, .. } => *field,
        };
        ConfigError::new(field, format!("{} (required when NOTIFIER_PROVIDER=mail)", e))
    }
}

#[cfg(feature = "rest-catalog")]
impl From<catalog_rest::CatalogConfigError> for ConfigError {
    fn from(e: catalog_rest::CatalogConfigError) -> Self {
        use catalog_rest::CatalogConfigError;
        let field = match &e {
            CatalogConfigError::Missing(name) => *name,
            CatalogConfigError::InvalidUrl(_) => "CATALOG_URL",
        };
        ConfigError::new(field, format!("{} (required when CATALOG_PROVIDER=rest)", e))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `PORT`, default 3001
    pub port: u16,
    /// `CHECK_LINK_SECRET`; callers must echo it in the `secret` header
    pub check_link_secret: Option<String>,
    /// `CORS_ALLOW_ORIGIN`, default `*`
    pub cors_allow_origin: HeaderValue,
    pub notifier_provider: NotifierProvider,
    /// Present iff the notifier provider is mail
    pub mail: Option<MailSettings>,
    pub catalog_provider: CatalogProviderKind,
    /// Built from `CATALOG_URL`/`CATALOG_KEY`; present iff the provider is rest
    #[cfg(feature = "rest-catalog")]
    pub rest_catalog: Option<catalog_rest::RestCatalog>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty values count as unset
        let var = |k: &str| get(k).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(s) => s
                .parse()
                .map_err(|_| ConfigError::new("PORT", format!("'{}' is not a valid port", s)))?,
            None => 3001,
        };

        let cors_allow_origin = match var("CORS_ALLOW_ORIGIN") {
            None => HeaderValue::from_static("*"),
            Some(origin) => HeaderValue::from_str(&origin).map_err(|e| {
                ConfigError::new(
                    "CORS_ALLOW_ORIGIN",
                    format!("invalid header value '{}': {}", origin, e),
                )
            })?,
        };

        let notifier_provider = choose(
            var("NOTIFIER_PROVIDER").as_deref(),
            ("mail", NotifierProvider::Mail),
            NotifierProvider::Log,
        );
        let mail = match notifier_provider {
            NotifierProvider::Mail => Some(MailSettings::from_vars(&get)?),
            NotifierProvider::Log => None,
        };

        let catalog_provider = choose(
            var("CATALOG_PROVIDER").as_deref(),
            ("rest", CatalogProviderKind::Rest),
            CatalogProviderKind::Memory,
        );
        #[cfg(feature = "rest-catalog")]
        let rest_catalog = match catalog_provider {
            CatalogProviderKind::Rest => {
                let url = var("CATALOG_URL")
                    .ok_or(catalog_rest::CatalogConfigError::Missing("CATALOG_URL"))?;
                let key = var("CATALOG_KEY")
                    .ok_or(catalog_rest::CatalogConfigError::Missing("CATALOG_KEY"))?;
                Some(catalog_rest::RestCatalog::new(&url, key)?)
            }
            CatalogProviderKind::Memory => None,
        };
        #[cfg(not(feature = "rest-catalog"))]
        if catalog_provider == CatalogProviderKind::Rest {
            return Err(ConfigError::new(
                "CATALOG_PROVIDER",
                "rest requires a build with the rest-catalog feature",
            ));
        }

        Ok(Self {
            port,
            check_link_secret: var("CHECK_LINK_SECRET"),
            cors_allow_origin,
            notifier_provider,
            mail,
            catalog_provider,
            #[cfg(feature = "rest-catalog")]
            rest_catalog,
            log_format: choose(
                var("LOG_FORMAT").as_deref(),
                ("json", LogFormat::Json),
                LogFormat::Pretty,
            ),
        })
    }

    pub fn warn_if_insecure(&self) {
        if self.check_link_secret.is_none() {
            tracing::warn!(
                "CHECK_LINK_SECRET not set: the submission endpoint accepts calls from anyone."
            );
        }
        if self.notifier_provider == NotifierProvider::Log {
            tracing::warn!(
                "NOTIFIER_PROVIDER=log: suggestions are only written to the log, no reviewer \
                 is notified. DO NOT USE IN PRODUCTION."
            );
        }
    }
}
