//! SeaORM entities.

pub mod coupon;
pub mod coupon_coverage_area;
