//! Common utilities shared by the coupon service.
//!
//! This crate provides:
//! - Unified HTTP error handling
//! - The reversible ID codec
//! - Response envelope and pagination types
//! - Configuration structures

pub mod codec;
pub mod config;
pub mod error;
pub mod pagination;
pub mod response;

pub use codec::{DecodeError, IdCodec};
pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use response::ApiResponse;
