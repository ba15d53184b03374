//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::dto::{
    ApplyCouponRequest, ApplyCouponResponse, CouponPage, CouponResponse, CoverageAreaInput,
    CoverageAreaResponse, CreateCouponRequest, UpdateCouponRequest, UserCouponResponse,
};
use common::PaginationMeta;
use domain::{
    CouponFlags, CouponStatus, CouponType, Destination, DiscountBreakdown, DiscountType,
};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::coupon_handler::create_coupon,
        crate::handlers::coupon_handler::list_coupons,
        crate::handlers::coupon_handler::get_coupon,
        crate::handlers::coupon_handler::update_coupon,
        crate::handlers::coupon_handler::delete_coupon,
        crate::handlers::coupon_handler::get_coupon_by_code,
        crate::handlers::coupon_handler::list_published,
        crate::handlers::coupon_handler::list_my_coupons,
        crate::handlers::coupon_handler::apply_coupon,
    ),
    components(
        schemas(
            CreateCouponRequest,
            UpdateCouponRequest,
            CoverageAreaInput,
            ApplyCouponRequest,
            CouponResponse,
            CoverageAreaResponse,
            CouponPage,
            PaginationMeta,
            UserCouponResponse,
            ApplyCouponResponse,
            CouponType,
            DiscountType,
            CouponStatus,
            Destination,
            DiscountBreakdown,
            CouponFlags,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Coupons", description = "Coupon management and application"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_coupon_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/coupons"));
        assert!(paths.contains_key("/api/coupons/{id}"));
        assert!(paths.contains_key("/api/coupons/apply"));
        assert!(paths.contains_key("/api/coupons/code/{code}"));
    }
}
