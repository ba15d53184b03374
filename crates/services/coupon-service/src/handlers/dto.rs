//! Request and response bodies for the coupon endpoints.
//!
//! Internal ids never appear here in plaintext: they are encoded with the
//! ID codec on the way out and decoded on the way in. Location ids inside a
//! destination or coverage area belong to the shipping provider and stay
//! plain integers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use common::{AppResult, IdCodec, Paginated, PaginationMeta};
use domain::{
    CouponChanges, CouponFlags, CouponQuery, CouponStatus, CouponType, CoverageArea, Destination,
    Discount, DiscountBreakdown, DiscountType, NewCoupon, NewCoverageArea,
};

use crate::service::{AppliedCoupon, ApplyCoupon, CouponDetails, UserCoupon};

/// Distinguishes an absent field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn decode_optional(codec: &IdCodec, token: Option<&str>) -> AppResult<Option<i64>> {
    Ok(token.map(|t| codec.decode(t)).transpose()?)
}

// =============================================================================
// Requests
// =============================================================================

/// Coverage area of a regional coupon
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CoverageAreaInput {
    #[schema(example = 31)]
    pub province_id: Option<i64>,
    #[schema(example = 3171)]
    pub city_id: Option<i64>,
    pub subdistrict_id: Option<i64>,
}

impl From<CoverageAreaInput> for NewCoverageArea {
    fn from(input: CoverageAreaInput) -> Self {
        NewCoverageArea {
            province_id: input.province_id,
            city_id: input.city_id,
            subdistrict_id: input.subdistrict_id,
        }
    }
}

/// Coupon creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCouponRequest {
    /// Coupon code, stored upper-cased
    #[validate(length(min = 3, max = 32, message = "Coupon code must be between 3 and 32 characters"))]
    #[schema(example = "HEMAT20")]
    pub code: String,
    #[serde(rename = "type")]
    pub coupon_type: CouponType,
    pub discount_type: DiscountType,
    #[validate(range(min = 1, max = 100, message = "discount_percentage must be between 1 and 100"))]
    #[schema(example = 20)]
    pub discount_percentage: Option<i32>,
    #[validate(range(min = 1, message = "discount_amount must be greater than zero"))]
    pub discount_amount: Option<i64>,
    #[validate(range(min = 0, message = "min_purchase cannot be negative"))]
    #[serde(default)]
    pub min_purchase: i64,
    /// Owner token for a personal coupon
    pub user_id: Option<String>,
    #[validate(range(min = 1, message = "usage_limit must be at least 1"))]
    pub usage_limit: Option<i32>,
    #[schema(value_type = String, format = Date, example = "2024-01-01")]
    pub valid_from: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2024-12-31")]
    pub valid_until: NaiveDate,
    pub status: Option<CouponStatus>,
    pub status_publish: Option<CouponStatus>,
    #[serde(default)]
    pub coverage_areas: Vec<CoverageAreaInput>,
}

impl CreateCouponRequest {
    pub fn into_new_coupon(self, codec: &IdCodec) -> AppResult<NewCoupon> {
        let discount = Discount::from_parts(
            self.discount_type,
            self.discount_percentage,
            self.discount_amount,
        )?;

        Ok(NewCoupon {
            user_id: decode_optional(codec, self.user_id.as_deref())?,
            code: self.code,
            coupon_type: self.coupon_type,
            discount,
            min_purchase: self.min_purchase,
            usage_limit: self.usage_limit,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            status: self.status.unwrap_or(CouponStatus::Active),
            status_publish: self.status_publish.unwrap_or(CouponStatus::Active),
            coverage: self.coverage_areas.into_iter().map(Into::into).collect(),
        })
    }
}

/// Coupon update request. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCouponRequest {
    #[validate(length(min = 3, max = 32, message = "Coupon code must be between 3 and 32 characters"))]
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub coupon_type: Option<CouponType>,
    pub discount_type: Option<DiscountType>,
    #[validate(range(min = 1, max = 100, message = "discount_percentage must be between 1 and 100"))]
    pub discount_percentage: Option<i32>,
    #[validate(range(min = 1, message = "discount_amount must be greater than zero"))]
    pub discount_amount: Option<i64>,
    #[validate(range(min = 0, message = "min_purchase cannot be negative"))]
    pub min_purchase: Option<i64>,
    /// Owner token; `null` turns the coupon into a general one
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub user_id: Option<Option<String>>,
    /// `null` removes the limit
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub usage_limit: Option<Option<i32>>,
    #[schema(value_type = Option<String>, format = Date)]
    pub valid_from: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub valid_until: Option<NaiveDate>,
    pub status: Option<CouponStatus>,
    pub status_publish: Option<CouponStatus>,
    /// Replaces the whole coverage set when present
    pub coverage_areas: Option<Vec<CoverageAreaInput>>,
}

impl UpdateCouponRequest {
    pub fn into_changes(self, codec: &IdCodec) -> AppResult<CouponChanges> {
        let user_id = match self.user_id {
            Some(token) => Some(decode_optional(codec, token.as_deref())?),
            None => None,
        };

        Ok(CouponChanges {
            code: self.code,
            coupon_type: self.coupon_type,
            discount_type: self.discount_type,
            discount_percentage: self.discount_percentage,
            discount_amount: self.discount_amount,
            min_purchase: self.min_purchase,
            user_id,
            usage_limit: self.usage_limit,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            status: self.status,
            status_publish: self.status_publish,
            coverage: self
                .coverage_areas
                .map(|rows| rows.into_iter().map(Into::into).collect()),
        })
    }
}

/// Admin listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CouponFilter {
    pub status: Option<CouponStatus>,
    #[serde(rename = "type")]
    pub coupon_type: Option<CouponType>,
    /// Only coupons starting on or after this date
    #[param(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    /// Only coupons ending on or before this date
    #[param(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    /// Code fragment
    pub search: Option<String>,
}

impl From<CouponFilter> for CouponQuery {
    fn from(filter: CouponFilter) -> Self {
        CouponQuery {
            status: filter.status,
            coupon_type: filter.coupon_type,
            start_date: filter.start_date,
            end_date: filter.end_date,
            search: filter.search,
        }
    }
}

/// Coupon application request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplyCouponRequest {
    #[validate(length(min = 1, message = "Coupon code is required"))]
    #[schema(example = "HEMAT20")]
    pub code: String,
    #[validate(range(
        min = 0i64,
        max = 1_000_000_000_000_000i64,
        message = "order_amount must be between 0 and 1000000000000000"
    ))]
    #[schema(example = 150000)]
    pub order_amount: i64,
    #[validate(range(
        min = 0i64,
        max = 1_000_000_000_000_000i64,
        message = "shipping_cost must be between 0 and 1000000000000000"
    ))]
    #[serde(default)]
    pub shipping_cost: i64,
    pub destination: Option<Destination>,
    /// Validate and price without consuming a use
    #[serde(default)]
    pub dry_run: bool,
}

impl From<ApplyCouponRequest> for ApplyCoupon {
    fn from(req: ApplyCouponRequest) -> Self {
        ApplyCoupon {
            code: req.code,
            order_amount: req.order_amount,
            shipping_cost: req.shipping_cost,
            destination: req.destination,
            dry_run: req.dry_run,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Coverage area as returned to clients
#[derive(Debug, Serialize, ToSchema)]
pub struct CoverageAreaResponse {
    pub id: String,
    pub province_id: Option<i64>,
    pub city_id: Option<i64>,
    pub subdistrict_id: Option<i64>,
}

impl CoverageAreaResponse {
    fn new(area: CoverageArea, codec: &IdCodec) -> AppResult<Self> {
        Ok(Self {
            id: codec.encode(area.id)?,
            province_id: area.province_id,
            city_id: area.city_id,
            subdistrict_id: area.subdistrict_id,
        })
    }
}

/// Coupon as returned to clients
#[derive(Debug, Serialize, ToSchema)]
pub struct CouponResponse {
    /// Opaque coupon token
    pub id: String,
    pub code: String,
    #[serde(rename = "type")]
    pub coupon_type: CouponType,
    pub discount_type: DiscountType,
    pub discount_percentage: Option<i32>,
    pub discount_amount: Option<i64>,
    pub min_purchase: i64,
    pub user_id: Option<String>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    #[schema(value_type = String, format = Date)]
    pub valid_from: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub valid_until: NaiveDate,
    pub status: CouponStatus,
    pub status_publish: CouponStatus,
    pub coverage_areas: Vec<CoverageAreaResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CouponResponse {
    pub fn new(details: CouponDetails, codec: &IdCodec) -> AppResult<Self> {
        let CouponDetails { coupon, coverage } = details;

        Ok(Self {
            id: codec.encode(coupon.id)?,
            user_id: coupon.user_id.map(|id| codec.encode(id)).transpose()?,
            coverage_areas: coverage
                .into_iter()
                .map(|area| CoverageAreaResponse::new(area, codec))
                .collect::<AppResult<_>>()?,
            code: coupon.code,
            coupon_type: coupon.coupon_type,
            discount_type: coupon.discount.discount_type(),
            discount_percentage: coupon.discount.percentage(),
            discount_amount: coupon.discount.amount(),
            min_purchase: coupon.min_purchase,
            usage_limit: coupon.usage_limit,
            usage_count: coupon.usage_count,
            valid_from: coupon.valid_from,
            valid_until: coupon.valid_until,
            status: coupon.status,
            status_publish: coupon.status_publish,
            created_at: coupon.created_at,
            updated_at: coupon.updated_at,
        })
    }

    pub fn many(items: Vec<CouponDetails>, codec: &IdCodec) -> AppResult<Vec<Self>> {
        items.into_iter().map(|d| Self::new(d, codec)).collect()
    }
}

/// One page of the admin listing
#[derive(Debug, Serialize, ToSchema)]
pub struct CouponPage {
    pub items: Vec<CouponResponse>,
    pub meta: PaginationMeta,
}

impl CouponPage {
    pub fn new(page: Paginated<CouponDetails>, codec: &IdCodec) -> AppResult<Self> {
        let page = page.try_map(|d| CouponResponse::new(d, codec))?;
        Ok(Self {
            items: page.items,
            meta: page.meta,
        })
    }
}

/// Coupon in the caller's own listing
#[derive(Debug, Serialize, ToSchema)]
pub struct UserCouponResponse {
    #[serde(flatten)]
    pub coupon: CouponResponse,
    #[serde(flatten)]
    pub flags: CouponFlags,
}

impl UserCouponResponse {
    pub fn many(items: Vec<UserCoupon>, codec: &IdCodec) -> AppResult<Vec<Self>> {
        items
            .into_iter()
            .map(|item| {
                Ok(Self {
                    coupon: CouponResponse::new(item.details, codec)?,
                    flags: item.flags,
                })
            })
            .collect()
    }
}

/// Result of applying a coupon
#[derive(Debug, Serialize, ToSchema)]
pub struct ApplyCouponResponse {
    pub coupon_id: String,
    pub code: String,
    #[serde(rename = "type")]
    pub coupon_type: CouponType,
    pub discount_type: DiscountType,
    #[serde(flatten)]
    pub breakdown: DiscountBreakdown,
    pub usage_count: i32,
    /// Uses left after this application (null = unlimited)
    pub remaining_usage: Option<i32>,
    pub dry_run: bool,
}

impl ApplyCouponResponse {
    pub fn new(applied: AppliedCoupon, codec: &IdCodec) -> AppResult<Self> {
        Ok(Self {
            coupon_id: codec.encode(applied.coupon.id)?,
            code: applied.coupon.code,
            coupon_type: applied.coupon.coupon_type,
            discount_type: applied.coupon.discount.discount_type(),
            breakdown: applied.breakdown,
            usage_count: applied.coupon.usage_count,
            remaining_usage: applied.remaining_usage,
            dry_run: applied.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_from_missing() {
        let req: UpdateCouponRequest = serde_json::from_str(r#"{"usage_limit": null}"#).unwrap();
        assert_eq!(req.usage_limit, Some(None));
        assert_eq!(req.user_id, None);

        let req: UpdateCouponRequest = serde_json::from_str(r#"{"usage_limit": 5}"#).unwrap();
        assert_eq!(req.usage_limit, Some(Some(5)));
    }

    #[test]
    fn test_apply_request_defaults() {
        let req: ApplyCouponRequest =
            serde_json::from_str(r#"{"code": "hemat", "order_amount": 1000}"#).unwrap();
        assert_eq!(req.shipping_cost, 0);
        assert!(!req.dry_run);
        assert!(req.destination.is_none());
    }

    #[test]
    fn test_apply_request_rejects_out_of_range_amounts() {
        let req: ApplyCouponRequest = serde_json::from_str(&format!(
            r#"{{"code": "hemat", "order_amount": {max}, "shipping_cost": {max}}}"#,
            max = i64::MAX
        ))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("order_amount"));
        assert!(fields.contains_key("shipping_cost"));

        let req: ApplyCouponRequest =
            serde_json::from_str(r#"{"code": "hemat", "order_amount": -1}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
