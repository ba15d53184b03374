//! Coupon handlers.

use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Router,
};

use common::{ApiResponse, AppResult, PaginationParams};

use super::dto::{
    ApplyCouponRequest, ApplyCouponResponse, CouponFilter, CouponPage, CouponResponse,
    CreateCouponRequest, UpdateCouponRequest, UserCouponResponse,
};
use crate::extractors::{EncodedId, QueryParams, ValidatedJson};
use crate::middleware::{require_admin, CurrentUser};
use crate::state::AppState;

/// Routes reachable without a token
pub fn public_coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/code/:code", get(get_coupon_by_code))
        .route("/publish", get(list_published))
}

/// Routes that need a bearer token (admin checks happen per handler)
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_coupons).post(create_coupon))
        .route("/me", get(list_my_coupons))
        .route("/apply", post(apply_coupon))
        .route(
            "/:id",
            get(get_coupon).put(update_coupon).delete(delete_coupon),
        )
}

/// Create a coupon (admin only)
#[utoipa::path(
    post,
    path = "/api/coupons",
    tag = "Coupons",
    security(("bearer_auth" = [])),
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = CouponResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Coupon code already exists")
    )
)]
pub async fn create_coupon(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCouponRequest>,
) -> AppResult<ApiResponse<CouponResponse>> {
    require_admin(&current_user)?;

    let new = payload.into_new_coupon(&state.codec)?;
    let details = state.coupon_service.create_coupon(new).await?;

    Ok(ApiResponse::created(
        "Coupon created",
        CouponResponse::new(details, &state.codec)?,
    ))
}

/// List coupons with filters (admin only)
#[utoipa::path(
    get,
    path = "/api/coupons",
    tag = "Coupons",
    security(("bearer_auth" = [])),
    params(CouponFilter, PaginationParams),
    responses(
        (status = 200, description = "Page of coupons", body = CouponPage),
        (status = 400, description = "Malformed query string"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_coupons(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CouponFilter>,
    QueryParams(page): QueryParams<PaginationParams>,
) -> AppResult<ApiResponse<CouponPage>> {
    require_admin(&current_user)?;

    let page = state
        .coupon_service
        .list_coupons(filter.into(), page)
        .await?;

    Ok(ApiResponse::ok(
        "Coupons retrieved",
        CouponPage::new(page, &state.codec)?,
    ))
}

/// Get coupon by ID (admin only)
#[utoipa::path(
    get,
    path = "/api/coupons/{id}",
    tag = "Coupons",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Coupon token")
    ),
    responses(
        (status = 200, description = "Coupon", body = CouponResponse),
        (status = 400, description = "Invalid coupon token"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Coupon not found")
    )
)]
pub async fn get_coupon(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    EncodedId(id): EncodedId,
) -> AppResult<ApiResponse<CouponResponse>> {
    require_admin(&current_user)?;

    let details = state.coupon_service.get_coupon(id).await?;
    Ok(ApiResponse::ok(
        "Coupon retrieved",
        CouponResponse::new(details, &state.codec)?,
    ))
}

/// Update coupon fields or coverage (admin only)
#[utoipa::path(
    put,
    path = "/api/coupons/{id}",
    tag = "Coupons",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Coupon token")
    ),
    request_body = UpdateCouponRequest,
    responses(
        (status = 200, description = "Coupon updated", body = CouponResponse),
        (status = 400, description = "Validation error or invalid token"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Coupon not found"),
        (status = 409, description = "Coupon code already exists")
    )
)]
pub async fn update_coupon(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    EncodedId(id): EncodedId,
    ValidatedJson(payload): ValidatedJson<UpdateCouponRequest>,
) -> AppResult<ApiResponse<CouponResponse>> {
    require_admin(&current_user)?;

    let changes = payload.into_changes(&state.codec)?;
    let details = state.coupon_service.update_coupon(id, changes).await?;

    Ok(ApiResponse::ok(
        "Coupon updated",
        CouponResponse::new(details, &state.codec)?,
    ))
}

/// Soft delete coupon (admin only)
#[utoipa::path(
    delete,
    path = "/api/coupons/{id}",
    tag = "Coupons",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Coupon token")
    ),
    responses(
        (status = 200, description = "Coupon deleted"),
        (status = 400, description = "Invalid coupon token"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Coupon not found")
    )
)]
pub async fn delete_coupon(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    EncodedId(id): EncodedId,
) -> AppResult<ApiResponse<()>> {
    require_admin(&current_user)?;

    state.coupon_service.delete_coupon(id).await?;
    Ok(ApiResponse::message("Coupon deleted"))
}

/// Get an active coupon by its code
#[utoipa::path(
    get,
    path = "/api/coupons/code/{code}",
    tag = "Coupons",
    params(
        ("code" = String, Path, description = "Coupon code (case-insensitive)")
    ),
    responses(
        (status = 200, description = "Coupon", body = CouponResponse),
        (status = 404, description = "Coupon not found or not active")
    )
)]
pub async fn get_coupon_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<CouponResponse>> {
    let details = state.coupon_service.get_coupon_by_code(&code).await?;
    Ok(ApiResponse::ok(
        "Coupon retrieved",
        CouponResponse::new(details, &state.codec)?,
    ))
}

/// List published general coupons valid today
#[utoipa::path(
    get,
    path = "/api/coupons/publish",
    tag = "Coupons",
    responses(
        (status = 200, description = "Published coupons", body = Vec<CouponResponse>)
    )
)]
pub async fn list_published(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CouponResponse>>> {
    let coupons = state.coupon_service.list_published().await?;
    Ok(ApiResponse::ok(
        "Coupons retrieved",
        CouponResponse::many(coupons, &state.codec)?,
    ))
}

/// List the caller's personal coupons and all general coupons
#[utoipa::path(
    get,
    path = "/api/coupons/me",
    tag = "Coupons",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Coupons with usability flags", body = Vec<UserCouponResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_my_coupons(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserCouponResponse>>> {
    let coupons = state.coupon_service.list_for_user(current_user.id).await?;
    Ok(ApiResponse::ok(
        "Coupons retrieved",
        UserCouponResponse::many(coupons, &state.codec)?,
    ))
}

/// Validate a coupon against an order and consume one use
#[utoipa::path(
    post,
    path = "/api/coupons/apply",
    tag = "Coupons",
    security(("bearer_auth" = [])),
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Coupon valid; discount calculated", body = ApplyCouponResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Coupon not found"),
        (status = 422, description = "Coupon cannot be applied to this order")
    )
)]
pub async fn apply_coupon(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ApplyCouponRequest>,
) -> AppResult<ApiResponse<ApplyCouponResponse>> {
    let dry_run = payload.dry_run;
    let applied = state
        .coupon_service
        .apply_coupon(current_user.id, payload.into())
        .await?;

    let message = if dry_run {
        "Coupon is valid"
    } else {
        "Coupon applied"
    };
    Ok(ApiResponse::ok(
        message,
        ApplyCouponResponse::new(applied, &state.codec)?,
    ))
}
