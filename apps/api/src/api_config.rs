use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use proofai_application::BillingCatalog;
use proofai_core::AppError;
use tracing_subscriber::EnvFilter;

const MIN_SECRET_LENGTH: usize = 32;

/// Backing store for grants, usage and audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementStoreKind {
    Postgres,
    Memory,
}

/// Entitlement resolver strategy injected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementProviderKind {
    Standard,
    TestMode,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub identity_gateway_secret: String,
    pub billing_events_secret: String,
    pub store_timeout: Duration,
    pub entitlement_store: EntitlementStoreKind,
    pub entitlement_provider: EntitlementProviderKind,
    pub billing_catalog: BillingCatalog,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let entitlement_store = match lookup("ENTITLEMENT_STORE")
            .unwrap_or_else(|| "postgres".to_owned())
            .as_str()
        {
            "postgres" => EntitlementStoreKind::Postgres,
            "memory" => EntitlementStoreKind::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "ENTITLEMENT_STORE must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let database_url = lookup("DATABASE_URL").filter(|value| !value.trim().is_empty());
        if database_url.is_none()
            && (entitlement_store == EntitlementStoreKind::Postgres || migrate_only)
        {
            return Err(AppError::Validation("DATABASE_URL is required".to_owned()));
        }

        let entitlement_provider = match lookup("ENTITLEMENT_PROVIDER")
            .unwrap_or_else(|| "standard".to_owned())
            .as_str()
        {
            "standard" => EntitlementProviderKind::Standard,
            "test_mode" if cfg!(feature = "test-mode-entitlements") => {
                EntitlementProviderKind::TestMode
            }
            "test_mode" => {
                return Err(AppError::Validation(
                    "ENTITLEMENT_PROVIDER=test_mode requires a build with the \
                     test-mode-entitlements feature"
                        .to_owned(),
                ));
            }
            other => {
                return Err(AppError::Validation(format!(
                    "ENTITLEMENT_PROVIDER must be either 'standard' or 'test_mode', got '{other}'"
                )));
            }
        };

        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let identity_gateway_secret = required_secret(&lookup, "IDENTITY_GATEWAY_SECRET")?;
        let billing_events_secret = required_secret(&lookup, "BILLING_EVENTS_SECRET")?;

        let store_timeout_ms = match lookup("STORE_TIMEOUT_MS") {
            Some(value) => value.trim().parse::<u64>().map_err(|error| {
                AppError::Validation(format!("invalid STORE_TIMEOUT_MS: {error}"))
            })?,
            None => 5_000,
        };
        if store_timeout_ms == 0 {
            return Err(AppError::Validation(
                "STORE_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }

        let billing_catalog = BillingCatalog::parse(
            lookup("PLAN_PRICE_MAP").unwrap_or_default().as_str(),
            lookup("CREDIT_PACK_PRICE_MAP").unwrap_or_default().as_str(),
        )?;

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            identity_gateway_secret,
            billing_events_secret,
            store_timeout: Duration::from_millis(store_timeout_ms),
            entitlement_store,
            entitlement_provider,
            billing_catalog,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_secret(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().len() < MIN_SECRET_LENGTH {
        return Err(AppError::Validation(format!(
            "{name} must be at least {MIN_SECRET_LENGTH} characters"
        )));
    }

    Ok(value)
}
