//! HTTP request handlers.

pub mod coupon_handler;
pub mod dto;
pub mod health_handler;

pub use coupon_handler::{coupon_routes, public_coupon_routes};
pub use health_handler::health_routes;
