//! Integration tests for API endpoints.
//!
//! The router runs against a stub coupon service and a mock database, so no
//! real connections are needed. Tokens are minted with the real verifier.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{AppError, AppResult, IdCodec, JwtConfig, Paginated, PaginationParams};
use coupon_service_lib::infra::Database;
use coupon_service_lib::routes::create_router;
use coupon_service_lib::service::{
    AppliedCoupon, ApplyCoupon, CouponDetails, CouponService, JwtVerifier, TokenService,
    UserCoupon,
};
use coupon_service_lib::state::AppState;
use domain::{
    calculate_discount, Coupon, CouponChanges, CouponFlags, CouponQuery, CouponRejection,
    CouponStatus, CouponType, Discount, NewCoupon, UserRole,
};

const JWT_SECRET: &str = "test-secret-key-for-testing-only-32chars";
const CODEC_SECRET: &[u8] = b"codec-secret-for-integration-tests-0001";

// =============================================================================
// Stub Service
// =============================================================================

fn test_coupon(id: i64, code: &str) -> Coupon {
    let today = Utc::now().date_naive();
    Coupon {
        id,
        code: code.to_string(),
        coupon_type: CouponType::General,
        discount: Discount::Percentage(20),
        min_purchase: 0,
        user_id: None,
        usage_limit: Some(10),
        usage_count: 0,
        valid_from: today - Duration::days(1),
        valid_until: today + Duration::days(30),
        status: CouponStatus::Active,
        status_publish: CouponStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

fn details(coupon: Coupon) -> CouponDetails {
    CouponDetails {
        coupon,
        coverage: vec![],
    }
}

/// Coupon service that knows coupon 7 ("HEMAT20") and nothing else.
struct StubCouponService;

#[async_trait]
impl CouponService for StubCouponService {
    async fn create_coupon(&self, new: NewCoupon) -> AppResult<CouponDetails> {
        let mut coupon = test_coupon(8, &new.code.to_ascii_uppercase());
        coupon.user_id = new.user_id;
        Ok(details(coupon))
    }

    async fn list_coupons(
        &self,
        _query: CouponQuery,
        page: PaginationParams,
    ) -> AppResult<Paginated<CouponDetails>> {
        Ok(Paginated::new(
            vec![details(test_coupon(7, "HEMAT20"))],
            &page,
            1,
        ))
    }

    async fn get_coupon(&self, id: i64) -> AppResult<CouponDetails> {
        if id == 7 {
            Ok(details(test_coupon(7, "HEMAT20")))
        } else {
            Err(AppError::NotFound)
        }
    }

    async fn update_coupon(&self, id: i64, changes: CouponChanges) -> AppResult<CouponDetails> {
        let mut coupon = self.get_coupon(id).await?.coupon;
        if let Some(usage_limit) = changes.usage_limit {
            coupon.usage_limit = usage_limit;
        }
        Ok(details(coupon))
    }

    async fn delete_coupon(&self, id: i64) -> AppResult<()> {
        self.get_coupon(id).await.map(|_| ())
    }

    async fn get_coupon_by_code(&self, code: &str) -> AppResult<CouponDetails> {
        if code.eq_ignore_ascii_case("HEMAT20") {
            Ok(details(test_coupon(7, "HEMAT20")))
        } else {
            Err(AppError::NotFound)
        }
    }

    async fn list_published(&self) -> AppResult<Vec<CouponDetails>> {
        Ok(vec![details(test_coupon(7, "HEMAT20"))])
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<UserCoupon>> {
        let mut coupon = test_coupon(9, "MINE");
        coupon.user_id = Some(user_id);
        let flags = CouponFlags::for_coupon(&coupon, Utc::now().date_naive());
        Ok(vec![UserCoupon {
            details: details(coupon),
            flags,
        }])
    }

    async fn apply_coupon(&self, _user_id: i64, request: ApplyCoupon) -> AppResult<AppliedCoupon> {
        if request.code.eq_ignore_ascii_case("BIGSPEND") {
            return Err(CouponRejection::BelowMinimum {
                min_purchase: 200_000,
            }
            .into());
        }

        let mut coupon = self.get_coupon_by_code(&request.code).await?.coupon;
        let breakdown = calculate_discount(&coupon, request.order_amount, request.shipping_cost);
        let remaining_usage = coupon.remaining_usage(request.dry_run);
        if !request.dry_run {
            coupon.usage_count += 1;
        }

        Ok(AppliedCoupon {
            coupon,
            breakdown,
            remaining_usage,
            dry_run: request.dry_run,
        })
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

fn verifier() -> JwtVerifier {
    JwtVerifier::new(&JwtConfig {
        secret: JWT_SECRET.to_string(),
        expiration_hours: 1,
    })
}

fn codec() -> IdCodec {
    IdCodec::new(CODEC_SECRET).unwrap()
}

fn app_with_db(db: MockDatabase) -> Router {
    let state = AppState::new(
        Arc::new(StubCouponService),
        Arc::new(verifier()),
        Arc::new(codec()),
        Arc::new(Database::from_connection(db.into_connection())),
    );
    create_router(state)
}

fn app() -> Router {
    app_with_db(MockDatabase::new(DatabaseBackend::Postgres))
}

fn bearer(role: UserRole) -> String {
    let token = verifier()
        .issue_token(42, "someone@example.com", role)
        .unwrap();
    format!("Bearer {}", token)
}

fn get(uri: &str, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: Method, uri: &str, auth: Option<String>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_admin_routes_require_token() {
    let (status, body) = call(app(), get("/api/coupons", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let (status, _) = call(
        app(),
        get("/api/coupons/me", Some("Bearer not-a-jwt".to_string())),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_forbid_regular_users() {
    let (status, body) = call(app(), get("/api/coupons", Some(bearer(UserRole::User)))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

// =============================================================================
// Admin endpoints
// =============================================================================

#[tokio::test]
async fn test_list_coupons_as_admin() {
    let (status, body) = call(
        app(),
        get("/api/coupons?page=1&per_page=10", Some(bearer(UserRole::Admin))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["meta"]["per_page"], 10);
    assert_eq!(body["data"]["items"][0]["code"], "HEMAT20");
}

#[tokio::test]
async fn test_list_coupons_rejects_unknown_filter_values() {
    for uri in [
        "/api/coupons?status=archived",
        "/api/coupons?type=x",
        "/api/coupons?page=abc",
    ] {
        let (status, body) = call(app(), get(uri, Some(bearer(UserRole::Admin)))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["status"], 400);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["data"].is_null());
    }
}

#[tokio::test]
async fn test_get_coupon_by_token() {
    let token = codec().encode(7).unwrap();
    let (status, body) = call(
        app(),
        get(&format!("/api/coupons/{}", token), Some(bearer(UserRole::Admin))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], token);
    assert_eq!(body["data"]["type"], "general");
    assert_eq!(body["data"]["discount_percentage"], 20);
}

#[tokio::test]
async fn test_plain_numeric_id_is_rejected() {
    let (status, body) = call(app(), get("/api/coupons/7", Some(bearer(UserRole::Admin)))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ID");
}

#[tokio::test]
async fn test_unknown_coupon_token_is_not_found() {
    let token = codec().encode(1234).unwrap();
    let (status, body) = call(
        app(),
        get(&format!("/api/coupons/{}", token), Some(bearer(UserRole::Admin))),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_coupon_returns_created() {
    let owner = codec().encode(42).unwrap();
    let payload = json!({
        "code": "newbie",
        "type": "general",
        "discount_type": "amount",
        "discount_amount": 15000,
        "user_id": owner,
        "valid_from": "2024-01-01",
        "valid_until": "2024-12-31"
    });

    let (status, body) = call(
        app(),
        send_json(Method::POST, "/api/coupons", Some(bearer(UserRole::Admin)), payload),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], 201);
    assert_eq!(body["data"]["code"], "NEWBIE");
    assert_eq!(body["data"]["user_id"], owner);
}

#[tokio::test]
async fn test_create_coupon_validation_error() {
    let payload = json!({
        "code": "x",
        "type": "general",
        "discount_type": "percentage",
        "discount_percentage": 150,
        "valid_from": "2024-01-01",
        "valid_until": "2024-12-31"
    });

    let (status, body) = call(
        app(),
        send_json(Method::POST, "/api/coupons", Some(bearer(UserRole::Admin)), payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_coupon_clears_usage_limit() {
    let token = codec().encode(7).unwrap();
    let (status, body) = call(
        app(),
        send_json(
            Method::PUT,
            &format!("/api/coupons/{}", token),
            Some(bearer(UserRole::Admin)),
            json!({ "usage_limit": null }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["usage_limit"].is_null());
}

#[tokio::test]
async fn test_delete_coupon() {
    let token = codec().encode(7).unwrap();
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/coupons/{}", token))
        .header(header::AUTHORIZATION, bearer(UserRole::Admin))
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Coupon deleted");
}

// =============================================================================
// Public and user endpoints
// =============================================================================

#[tokio::test]
async fn test_coupon_by_code_is_public() {
    let (status, body) = call(app(), get("/api/coupons/code/hemat20", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["code"], "HEMAT20");
}

#[tokio::test]
async fn test_published_list_is_public() {
    let (status, body) = call(app(), get("/api/coupons/publish", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_my_coupons_include_flags() {
    let (status, body) = call(app(), get("/api/coupons/me", Some(bearer(UserRole::User)))).await;

    assert_eq!(status, StatusCode::OK);
    let item = &body["data"][0];
    assert_eq!(item["code"], "MINE");
    assert_eq!(item["is_personal"], true);
    assert_eq!(item["is_usable"], true);
    assert_eq!(item["user_id"], codec().encode(42).unwrap());
}

#[tokio::test]
async fn test_apply_coupon_success() {
    let payload = json!({
        "code": "hemat20",
        "order_amount": 150000,
        "shipping_cost": 20000
    });

    let (status, body) = call(
        app(),
        send_json(Method::POST, "/api/coupons/apply", Some(bearer(UserRole::User)), payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Coupon applied");
    assert_eq!(body["data"]["discount_amount"], 30000);
    assert_eq!(body["data"]["final_total"], 140000);
    assert_eq!(body["data"]["usage_count"], 1);
    assert_eq!(body["data"]["remaining_usage"], 9);
    assert_eq!(body["data"]["coupon_id"], codec().encode(7).unwrap());
}

#[tokio::test]
async fn test_apply_coupon_dry_run() {
    let payload = json!({
        "code": "HEMAT20",
        "order_amount": 150000,
        "dry_run": true
    });

    let (status, body) = call(
        app(),
        send_json(Method::POST, "/api/coupons/apply", Some(bearer(UserRole::User)), payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Coupon is valid");
    assert_eq!(body["data"]["usage_count"], 0);
    assert_eq!(body["data"]["dry_run"], true);
}

#[tokio::test]
async fn test_apply_coupon_rejection_envelope() {
    let payload = json!({ "code": "BIGSPEND", "order_amount": 150000 });

    let (status, body) = call(
        app(),
        send_json(Method::POST, "/api/coupons/apply", Some(bearer(UserRole::User)), payload),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
    assert_eq!(body["code"], "COUPON_MIN_PURCHASE");
    assert!(body["message"].as_str().unwrap().contains("200000"));
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_apply_coupon_rejects_oversized_amounts() {
    let payload = json!({
        "code": "HEMAT20",
        "order_amount": i64::MAX,
        "shipping_cost": i64::MAX
    });

    let (status, body) = call(
        app(),
        send_json(Method::POST, "/api/coupons/apply", Some(bearer(UserRole::User)), payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("order_amount"));
}

#[tokio::test]
async fn test_apply_requires_token() {
    let payload = json!({ "code": "HEMAT20", "order_amount": 1000 });

    let (status, _) = call(
        app(),
        send_json(Method::POST, "/api/coupons/apply", None, payload),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check_pings_database() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
        last_insert_id: 0,
        rows_affected: 1,
    }]);

    let (status, body) = call(app_with_db(db), get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_health_check_reports_database_failure() {
    // No exec result queued, so the ping fails.
    let (status, body) = call(app(), get("/health", None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["database"]["error"], "Database unreachable");
}
