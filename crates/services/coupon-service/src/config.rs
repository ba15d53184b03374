//! Coupon service configuration.

use std::env;

use chrono::FixedOffset;
use thiserror::Error;

use common::codec::MIN_CODEC_SECRET_LENGTH;
use common::{CodecConfig, DatabaseConfig, JwtConfig, ServiceConfig};
use domain::{MIN_JWT_SECRET_LENGTH, SECONDS_PER_HOUR};

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be at least {min} characters")]
    TooShort { name: &'static str, min: usize },

    #[error("{0} has an invalid value")]
    Invalid(&'static str),
}

/// Coupon service configuration.
#[derive(Debug, Clone)]
pub struct CouponServiceConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub codec: CodecConfig,
    /// Offset of the shop's calendar; coupon dates are evaluated in it
    pub utc_offset: FixedOffset,
}

impl CouponServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = DatabaseConfig::default();

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_or("DATABASE_MIN_CONNECTIONS", defaults.min_connections)?,
        };

        let jwt = JwtConfig {
            secret: required_secret("JWT_SECRET", MIN_JWT_SECRET_LENGTH)?,
            ..JwtConfig::default()
        };

        let codec = CodecConfig {
            secret: required_secret("ID_CODEC_SECRET", MIN_CODEC_SECRET_LENGTH)?,
        };

        let service = ServiceConfig {
            service_name: "coupon-service".to_string(),
            host: env::var("COUPON_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("COUPON_SERVICE_PORT", 3000)?,
        };

        let utc_offset = utc_offset(parse_or("COUPON_UTC_OFFSET_HOURS", 7)?)?;

        Ok(Self {
            service,
            database,
            jwt,
            codec,
            utc_offset,
        })
    }
}

/// Whole-hour offset east of UTC; chrono accepts anything under a day.
fn utc_offset(hours: i32) -> Result<FixedOffset, ConfigError> {
    hours
        .checked_mul(SECONDS_PER_HOUR as i32)
        .and_then(FixedOffset::east_opt)
        .ok_or(ConfigError::Invalid("COUPON_UTC_OFFSET_HOURS"))
}

fn required_secret(name: &'static str, min: usize) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    if value.len() < min {
        return Err(ConfigError::TooShort { name, min });
    }
    Ok(value)
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_offset_in_range() {
        assert_eq!(utc_offset(7).unwrap().local_minus_utc(), 7 * 3600);
        assert_eq!(utc_offset(-5).unwrap().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_utc_offset_rejects_out_of_range_hours() {
        assert!(matches!(utc_offset(24), Err(ConfigError::Invalid(_))));
        assert!(matches!(utc_offset(i32::MAX), Err(ConfigError::Invalid(_))));
        assert!(matches!(utc_offset(i32::MIN), Err(ConfigError::Invalid(_))));
    }
}
