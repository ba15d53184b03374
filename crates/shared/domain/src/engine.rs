//! Coupon eligibility rules and discount arithmetic.
//!
//! Everything here is pure: callers supply the coupon, its coverage rows and
//! the current date, and persist whatever comes out.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::coupon::{Coupon, CouponType, CoverageArea, Destination, Discount};

/// Why a coupon cannot be applied to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Coupon is not active or outside its validity period")]
    Unavailable,

    #[error("Coupon usage limit has been reached")]
    Exhausted,

    #[error("Coupon is not available for this account")]
    ScopeDenied,

    #[error("A minimum purchase of {min_purchase} is required to use this coupon")]
    BelowMinimum { min_purchase: i64 },

    #[error("Coupon is not available for the shipping destination")]
    RegionDenied,

    #[error("Shipping cost must be greater than zero to use a shipping coupon")]
    ShippingInvalid,
}

impl CouponRejection {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            CouponRejection::Unavailable => "COUPON_UNAVAILABLE",
            CouponRejection::Exhausted => "COUPON_EXHAUSTED",
            CouponRejection::ScopeDenied => "COUPON_NOT_OWNED",
            CouponRejection::BelowMinimum { .. } => "COUPON_MIN_PURCHASE",
            CouponRejection::RegionDenied => "COUPON_REGION_DENIED",
            CouponRejection::ShippingInvalid => "COUPON_SHIPPING_INVALID",
        }
    }
}

/// Order data a coupon is applied against.
#[derive(Debug, Clone)]
pub struct ApplyContext {
    pub user_id: i64,
    pub today: NaiveDate,
    pub order_amount: i64,
    pub shipping_cost: i64,
    pub destination: Option<Destination>,
}

/// Which coverage level matched a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLevel {
    Subdistrict,
    City,
    Province,
}

impl CoverageArea {
    /// Match this area against a destination.
    ///
    /// Levels are tried subdistrict first, then city, then province. A level
    /// only matches when both sides carry the same id; a `None` on the area
    /// never matches on its own.
    pub fn match_level(&self, destination: &Destination) -> Option<MatchLevel> {
        let same = |area: Option<i64>, dest: Option<i64>| matches!((area, dest), (Some(a), Some(d)) if a == d);

        if same(self.subdistrict_id, destination.subdistrict_id) {
            Some(MatchLevel::Subdistrict)
        } else if same(self.city_id, destination.city_id) {
            Some(MatchLevel::City)
        } else if same(self.province_id, destination.province_id) {
            Some(MatchLevel::Province)
        } else {
            None
        }
    }
}

/// True when any coverage row matches the destination.
pub fn region_matches(areas: &[CoverageArea], destination: Option<&Destination>) -> bool {
    match destination {
        Some(destination) => areas
            .iter()
            .any(|area| area.match_level(destination).is_some()),
        None => false,
    }
}

/// Run the eligibility checks in order, stopping at the first failure.
pub fn check_eligibility(
    coupon: &Coupon,
    coverage: &[CoverageArea],
    ctx: &ApplyContext,
) -> Result<(), CouponRejection> {
    if !coupon.is_enabled() || !coupon.is_within_window(ctx.today) {
        return Err(CouponRejection::Unavailable);
    }
    if coupon.is_exhausted() {
        return Err(CouponRejection::Exhausted);
    }
    if !coupon.is_usable_by(ctx.user_id) {
        return Err(CouponRejection::ScopeDenied);
    }
    if ctx.order_amount < coupon.min_purchase {
        return Err(CouponRejection::BelowMinimum {
            min_purchase: coupon.min_purchase,
        });
    }
    if coupon.coupon_type == CouponType::Regional
        && !region_matches(coverage, ctx.destination.as_ref())
    {
        return Err(CouponRejection::RegionDenied);
    }
    if coupon.coupon_type == CouponType::Shipping && ctx.shipping_cost <= 0 {
        return Err(CouponRejection::ShippingInvalid);
    }
    Ok(())
}

/// Result of applying a coupon to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DiscountBreakdown {
    pub discount_amount: i64,
    pub order_amount: i64,
    pub final_order_amount: i64,
    pub shipping_cost: i64,
    pub final_shipping_cost: i64,
    pub final_total: i64,
}

/// Compute the discount for an already-eligible coupon.
///
/// Shipping coupons discount the shipping cost; the others discount the
/// order amount. The discount never exceeds its base and the total
/// saturates at `i64::MAX`.
pub fn calculate_discount(coupon: &Coupon, order_amount: i64, shipping_cost: i64) -> DiscountBreakdown {
    let base = match coupon.coupon_type {
        CouponType::Shipping => shipping_cost,
        CouponType::General | CouponType::Regional => order_amount,
    }
    .max(0);

    let discount_amount = match coupon.discount {
        Discount::Percentage(pct) => percent_of(base, pct),
        Discount::Amount(amount) => amount,
    }
    .clamp(0, base);

    let (final_order_amount, final_shipping_cost) = match coupon.coupon_type {
        CouponType::Shipping => (order_amount, shipping_cost - discount_amount),
        CouponType::General | CouponType::Regional => (order_amount - discount_amount, shipping_cost),
    };

    DiscountBreakdown {
        discount_amount,
        order_amount,
        final_order_amount,
        shipping_cost,
        final_shipping_cost,
        final_total: final_order_amount.saturating_add(final_shipping_cost),
    }
}

/// Eligibility followed by discount calculation.
pub fn evaluate(
    coupon: &Coupon,
    coverage: &[CoverageArea],
    ctx: &ApplyContext,
) -> Result<DiscountBreakdown, CouponRejection> {
    check_eligibility(coupon, coverage, ctx)?;
    Ok(calculate_discount(coupon, ctx.order_amount, ctx.shipping_cost))
}

// Half-up rounding to whole units.
fn percent_of(base: i64, pct: i32) -> i64 {
    let scaled = (base as i128 * pct as i128 + 50) / 100;
    scaled.clamp(0, i64::MAX as i128) as i64
}

/// Derived flags shown on coupon listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CouponFlags {
    pub is_personal: bool,
    pub is_upcoming: bool,
    pub is_expired: bool,
    pub is_exhausted: bool,
    pub is_usable: bool,
}

impl CouponFlags {
    pub fn for_coupon(coupon: &Coupon, today: NaiveDate) -> Self {
        let is_upcoming = today < coupon.valid_from;
        let is_expired = today > coupon.valid_until;
        let is_exhausted = coupon.is_exhausted();

        Self {
            is_personal: coupon.is_personal(),
            is_upcoming,
            is_expired,
            is_exhausted,
            is_usable: coupon.is_enabled() && !is_upcoming && !is_expired && !is_exhausted,
        }
    }
}
