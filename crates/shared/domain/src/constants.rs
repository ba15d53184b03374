//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Roles
// =============================================================================

/// Default role for shop customers
pub const ROLE_USER: &str = "user";

/// Administrator role with access to coupon management
pub const ROLE_ADMIN: &str = "admin";

/// All valid role values
pub const VALID_ROLES: &[&str] = &[ROLE_USER, ROLE_ADMIN];

/// Check if a role value is valid
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

// =============================================================================
// Authentication
// =============================================================================

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Seconds per hour (for token expiration calculation)
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

// =============================================================================
// Coupons
// =============================================================================

/// Smallest percentage a percentage coupon may grant
pub const MIN_DISCOUNT_PERCENTAGE: i32 = 1;

/// Largest percentage a percentage coupon may grant
pub const MAX_DISCOUNT_PERCENTAGE: i32 = 100;

/// Minimum coupon code length (after trimming)
pub const MIN_COUPON_CODE_LENGTH: usize = 3;

/// Maximum coupon code length
pub const MAX_COUPON_CODE_LENGTH: usize = 32;

/// Status value for enabled coupons
pub const STATUS_ACTIVE: &str = "active";

/// Status value for disabled coupons
pub const STATUS_INACTIVE: &str = "inactive";
