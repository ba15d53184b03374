//! Application state for dependency injection.

use std::sync::Arc;

use common::codec::InvalidSecret;
use common::IdCodec;

use crate::config::CouponServiceConfig;
use crate::infra::{Database, Persistence};
use crate::service::{CouponManager, CouponService, JwtVerifier, TokenService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub coupon_service: Arc<dyn CouponService>,
    pub tokens: Arc<dyn TokenService>,
    pub codec: Arc<IdCodec>,
    pub database: Arc<Database>,
}

impl AppState {
    /// Wire the production services from configuration.
    pub fn from_config(
        database: Arc<Database>,
        config: &CouponServiceConfig,
    ) -> Result<Self, InvalidSecret> {
        let uow = Arc::new(Persistence::new(database.get_connection()));
        let coupon_service = Arc::new(CouponManager::new(uow, config.utc_offset));
        let tokens = Arc::new(JwtVerifier::new(&config.jwt));
        let codec = Arc::new(IdCodec::new(config.codec.secret.as_bytes())?);

        Ok(Self::new(coupon_service, tokens, codec, database))
    }

    /// Create app state from already-built services.
    pub fn new(
        coupon_service: Arc<dyn CouponService>,
        tokens: Arc<dyn TokenService>,
        codec: Arc<IdCodec>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            coupon_service,
            tokens,
            codec,
            database,
        }
    }
}
