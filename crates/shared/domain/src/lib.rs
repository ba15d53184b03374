//! Domain layer - Coupon model, discount engine and shared value types.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Every rule a coupon is checked against lives here so it can be tested
//! without a database or an HTTP stack.

pub mod constants;
pub mod coupon;
pub mod engine;
pub mod error;
pub mod user;

pub use constants::*;
pub use coupon::{
    normalize_code, Coupon, CouponChanges, CouponQuery, CouponStatus, CouponType, CoverageArea,
    Destination, Discount, DiscountType, NewCoupon, NewCoverageArea,
};
pub use engine::{
    calculate_discount, check_eligibility, evaluate, region_matches, ApplyContext, CouponFlags,
    CouponRejection, DiscountBreakdown, MatchLevel,
};
pub use error::{DomainError, DomainResult};
pub use user::UserRole;
