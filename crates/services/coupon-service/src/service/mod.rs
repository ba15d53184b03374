//! Service layer - business logic.

mod coupon_service;
mod token_service;

pub use coupon_service::{
    AppliedCoupon, ApplyCoupon, CouponDetails, CouponManager, CouponService, UserCoupon,
};
pub use token_service::{Claims, JwtVerifier, TokenService};
