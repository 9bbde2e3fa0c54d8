//! Environment-driven service configuration.
//!
//! Every variable has exactly one literal default. Empty or whitespace-only
//! values count as unset. Variables are read through [`mockable::Env`] so the
//! parsing can be exercised with `MockEnv`.

use mockable::Env;
use pagination::PaginationLimits;
use tracing::warn;

use crate::outbound::persistence::{PoolConfig, PoolError};

/// Message returned when a request fails validation.
pub const BAD_DATA_MESSAGE_ENV: &str = "BAD_DATA_MESSAGE";
/// Message returned for unhandled failures. The triple `S` is the documented
/// spelling.
pub const ERROR_500_MESSAGE_ENV: &str = "ERROR_500_MESSSAGE";
/// Corrected spelling accepted when the documented one is unset.
pub const ERROR_500_MESSAGE_FALLBACK_ENV: &str = "ERROR_500_MESSAGE";
/// Idle connections kept by the database pool.
pub const DBPOOL_MIN_SIZE_ENV: &str = "DBPOOL_MIN_SIZE";
/// Connection ceiling of the database pool.
pub const DBPOOL_MAX_SIZE_ENV: &str = "DBPOOL_MAX_SIZE";
/// Listening port.
pub const PORT_ENV: &str = "MICRO_SERVICE_PORT";
/// Listening host.
pub const HOST_ENV: &str = "MICRO_SERVICE_HOST";
/// Upper bound on the page size.
pub const MAX_PAGINATION_LIMIT_ENV: &str = "MAX_PAGINATION_LIMIT";
/// Page size used when a request names none.
pub const DEF_PAGINATION_LIMIT_ENV: &str = "DEF_PAGINATION_LIMIT";
/// Path serving the OpenAPI document.
pub const SPEC_ROUTE_ENV: &str = "SPEC_ROUTE";
/// Optional PostgreSQL DSN.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

const DEFAULT_BAD_DATA_MESSAGE: &str = "Invalid data format";
const DEFAULT_ERROR_500_MESSAGE: &str = "Internal Server Error";
const DEFAULT_DBPOOL_MIN_SIZE: u32 = 10;
const DEFAULT_DBPOOL_MAX_SIZE: u32 = 10;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_MAX_PAGINATION_LIMIT: u32 = 100;
const DEFAULT_DEF_PAGINATION_LIMIT: u32 = 50;
const DEFAULT_SPEC_ROUTE: &str = "/spec";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A variable is set but cannot be used.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// What would have been accepted.
        expected: &'static str,
    },
    /// Pool bounds are inverted or empty.
    #[error("DBPOOL_MIN_SIZE={min} must not exceed DBPOOL_MAX_SIZE={max}, which must be positive")]
    InvalidPoolBounds {
        /// Parsed `DBPOOL_MIN_SIZE`.
        min: u32,
        /// Parsed `DBPOOL_MAX_SIZE`.
        max: u32,
    },
    /// Pagination limits are zero or inverted.
    #[error(
        "DEF_PAGINATION_LIMIT={default} must be positive and not exceed MAX_PAGINATION_LIMIT={max}"
    )]
    InvalidPaginationLimits {
        /// Parsed `DEF_PAGINATION_LIMIT`.
        default: u32,
        /// Parsed `MAX_PAGINATION_LIMIT`.
        max: u32,
    },
}

/// User-facing message templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessages {
    /// Returned with 422 responses.
    pub bad_data: String,
    /// Returned with 500 responses.
    pub internal: String,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            bad_data: DEFAULT_BAD_DATA_MESSAGE.to_owned(),
            internal: DEFAULT_ERROR_500_MESSAGE.to_owned(),
        }
    }
}

/// Resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    messages: ErrorMessages,
    host: String,
    port: u16,
    pool_min_size: u32,
    pool_max_size: u32,
    pagination: PaginationLimits,
    spec_route: String,
    database_url: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            messages: ErrorMessages::default(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            pool_min_size: DEFAULT_DBPOOL_MIN_SIZE,
            pool_max_size: DEFAULT_DBPOOL_MAX_SIZE,
            pagination: PaginationLimits::default(),
            spec_route: DEFAULT_SPEC_ROUTE.to_owned(),
            database_url: None,
        }
    }
}

fn read<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name).filter(|value| !value.trim().is_empty())
}

fn parse_number<E, T>(
    env: &E,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, SettingsError>
where
    E: Env,
    T: std::str::FromStr,
{
    match read(env, name) {
        Some(value) => value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
            name,
            value,
            expected,
        }),
        None => Ok(default),
    }
}

impl ServiceSettings {
    /// Read every variable from `env`.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] naming the first unusable variable.
    ///
    /// # Examples
    /// ```
    /// use mockable::MockEnv;
    /// use openapi_kit::ServiceSettings;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "MICRO_SERVICE_PORT" => Some("9000".to_owned()),
    ///     _ => None,
    /// });
    /// let settings = ServiceSettings::from_env(&env).unwrap();
    /// assert_eq!(settings.bind_addr(), ("0.0.0.0".to_owned(), 9000));
    /// ```
    pub fn from_env<E: Env>(env: &E) -> Result<Self, SettingsError> {
        let bad_data =
            read(env, BAD_DATA_MESSAGE_ENV).unwrap_or_else(|| DEFAULT_BAD_DATA_MESSAGE.to_owned());
        let internal = match read(env, ERROR_500_MESSAGE_ENV) {
            Some(message) => message,
            None => read(env, ERROR_500_MESSAGE_FALLBACK_ENV)
                .inspect(|_| {
                    warn!("ERROR_500_MESSAGE is deprecated; set ERROR_500_MESSSAGE instead");
                })
                .unwrap_or_else(|| DEFAULT_ERROR_500_MESSAGE.to_owned()),
        };

        let pool_min_size = parse_number(
            env,
            DBPOOL_MIN_SIZE_ENV,
            DEFAULT_DBPOOL_MIN_SIZE,
            "a non-negative integer",
        )?;
        let pool_max_size = parse_number(
            env,
            DBPOOL_MAX_SIZE_ENV,
            DEFAULT_DBPOOL_MAX_SIZE,
            "a positive integer",
        )?;
        if pool_max_size == 0 || pool_min_size > pool_max_size {
            return Err(SettingsError::InvalidPoolBounds {
                min: pool_min_size,
                max: pool_max_size,
            });
        }

        let port = parse_number(env, PORT_ENV, DEFAULT_PORT, "a port number (0-65535)")?;
        let host = read(env, HOST_ENV)
            .map(|host| host.trim().to_owned())
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());

        let max = parse_number(
            env,
            MAX_PAGINATION_LIMIT_ENV,
            DEFAULT_MAX_PAGINATION_LIMIT,
            "a positive integer",
        )?;
        let default = parse_number(
            env,
            DEF_PAGINATION_LIMIT_ENV,
            DEFAULT_DEF_PAGINATION_LIMIT,
            "a positive integer",
        )?;
        let pagination = PaginationLimits::new(default, max)
            .map_err(|_| SettingsError::InvalidPaginationLimits { default, max })?;

        let spec_route = match read(env, SPEC_ROUTE_ENV) {
            Some(route) if route.trim().starts_with('/') => route.trim().to_owned(),
            Some(route) => {
                return Err(SettingsError::InvalidEnv {
                    name: SPEC_ROUTE_ENV,
                    value: route,
                    expected: "a path starting with '/'",
                });
            }
            None => DEFAULT_SPEC_ROUTE.to_owned(),
        };

        Ok(Self {
            messages: ErrorMessages { bad_data, internal },
            host,
            port,
            pool_min_size,
            pool_max_size,
            pagination,
            spec_route,
            database_url: read(env, DATABASE_URL_ENV).map(|url| url.trim().to_owned()),
        })
    }

    /// Override the listening address, as the CLI does.
    #[must_use]
    pub fn with_bind_addr(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Host and port to bind.
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    /// Page size bounds.
    pub fn pagination_limits(&self) -> PaginationLimits {
        self.pagination
    }

    /// Path of the OpenAPI document.
    pub fn spec_route(&self) -> &str {
        &self.spec_route
    }

    /// Message templates for error responses.
    pub fn error_messages(&self) -> &ErrorMessages {
        &self.messages
    }

    /// Pool settings; `None` unless `DATABASE_URL` is set.
    ///
    /// # Errors
    ///
    /// Propagates [`PoolError::InvalidBounds`], which `from_env` already
    /// rules out.
    pub fn pool_config(&self) -> Result<Option<PoolConfig>, PoolError> {
        self.database_url
            .as_deref()
            .map(|url| PoolConfig::new(url, self.pool_min_size, self.pool_max_size))
            .transpose()
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
