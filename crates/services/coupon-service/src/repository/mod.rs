//! Repository layer for data access.

mod coupon_repository;
pub mod entities;

pub use coupon_repository::{CouponRepository, CouponStore};

#[cfg(any(test, feature = "test-utils"))]
pub use coupon_repository::MockCouponRepository;
