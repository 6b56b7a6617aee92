use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use campusly_application::{PlatformSettings, ProvisioningLimits, ServiceWiring};
use campusly_core::{AccountId, AppError};
use campusly_domain::{FeeFields, RateLimitPolicy};
use chrono::Duration;
use tracing_subscriber::EnvFilter;

/// Where the application ports are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage: StorageBackend,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub rate_limit_retention: Duration,
    pub settings: PlatformSettings,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_owned())
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            "postgres" => StorageBackend::Postgres {
                database_url: required_non_empty_env("DATABASE_URL")?,
                max_connections: parsed_env("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        if migrate_only && storage == StorageBackend::Memory {
            return Err(AppError::Validation(
                "the migrate command requires STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parsed_env("API_PORT", 3001)?;

        let settings = platform_settings(
            account_env("PLATFORM_MASTER_ACCOUNT")?,
            account_env("PLATFORM_FACTORY_ACCOUNT")?,
        )?;

        let rate_limit_retention =
            duration_env("RATE_LIMIT_RETENTION_HOURS", 24, Duration::try_hours)?;

        Ok(Self {
            migrate_only,
            storage,
            frontend_url,
            api_host,
            api_port,
            rate_limit_retention,
            settings,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

#[cfg(test)]
impl ApiConfig {
    /// In-memory configuration with every tunable at its default.
    pub(crate) fn in_memory(
        master_account: AccountId,
        factory_account: AccountId,
    ) -> Result<Self, AppError> {
        Ok(Self {
            migrate_only: false,
            storage: StorageBackend::Memory,
            frontend_url: "http://localhost:3000".to_owned(),
            api_host: "127.0.0.1".to_owned(),
            api_port: 3001,
            rate_limit_retention: Duration::hours(24),
            settings: platform_settings(master_account, factory_account)?,
        })
    }
}

fn platform_settings(
    master_account: AccountId,
    factory_account: AccountId,
) -> Result<PlatformSettings, AppError> {
    let service_wiring = ServiceWiring {
        revenue_account: optional_account_env("REVENUE_ACCOUNT_ADDRESS")?
            .unwrap_or(factory_account),
        tenant_profile: optional_account_env("TENANT_PROFILE_ADDRESS")?
            .unwrap_or(factory_account),
        tuition: optional_account_env("TUITION_ADDRESS")?.unwrap_or(factory_account),
        role_registry: optional_account_env("ROLE_REGISTRY_ADDRESS")?.unwrap_or(factory_account),
        master_admin: master_account,
    };

    let settings = PlatformSettings {
        master_account,
        factory_account,
        default_fees: FeeFields {
            program_creation_fee: parsed_env("DEFAULT_PROGRAM_CREATION_FEE", 50)?,
            subscription_fee: parsed_env("DEFAULT_SUBSCRIPTION_FEE", 500)?,
            certificate_fee: parsed_env("DEFAULT_CERTIFICATE_FEE", 20)?,
            revenue_share_percent: parsed_env("DEFAULT_REVENUE_SHARE_PERCENT", 20)?,
        },
        default_subscription_duration: duration_env(
            "DEFAULT_SUBSCRIPTION_DAYS",
            30,
            Duration::try_days,
        )?,
        provisioning_limits: ProvisioningLimits {
            min_subscription_fee: parsed_env("MIN_SUBSCRIPTION_FEE", 100)?,
            max_subscription_fee: parsed_env("MAX_SUBSCRIPTION_FEE", 10_000)?,
            min_subscription_duration: duration_env(
                "MIN_SUBSCRIPTION_DAYS",
                30,
                Duration::try_days,
            )?,
            max_subscription_duration: duration_env(
                "MAX_SUBSCRIPTION_DAYS",
                365,
                Duration::try_days,
            )?,
        },
        grace_period: duration_env("GRACE_PERIOD_DAYS", 3, Duration::try_days)?,
        withdrawal_cooldown: duration_env(
            "WITHDRAWAL_COOLDOWN_SECONDS",
            3_600,
            Duration::try_seconds,
        )?,
        collection_rate_limit: RateLimitPolicy::new(
            duration_env("COLLECTION_COOLDOWN_SECONDS", 0, Duration::try_seconds)?,
            parsed_env("COLLECTION_BURST_LIMIT", 30)?,
            duration_env("COLLECTION_WINDOW_SECONDS", 60, Duration::try_seconds)?,
        )?,
        service_wiring,
    };
    settings.validate()?;

    Ok(settings)
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn account_env(name: &str) -> Result<AccountId, AppError> {
    AccountId::parse(required_non_empty_env(name)?.as_str())
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
}

fn optional_account_env(name: &str) -> Result<Option<AccountId>, AppError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            AccountId::parse(value.as_str())
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
        })
        .transpose()
}

fn parsed_env<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        _ => Ok(default),
    }
}

fn duration_env(
    name: &str,
    default: i64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, AppError> {
    checked_duration(name, parsed_env(name, default)?, unit)
}

fn checked_duration(
    name: &str,
    value: i64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, AppError> {
    unit(value).ok_or_else(|| AppError::Validation(format!("{name} is out of range: {value}")))
}
