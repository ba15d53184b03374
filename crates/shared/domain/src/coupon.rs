//! Coupon domain entity and related types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_COUPON_CODE_LENGTH, MAX_DISCOUNT_PERCENTAGE, MIN_COUPON_CODE_LENGTH,
    MIN_DISCOUNT_PERCENTAGE, STATUS_ACTIVE, STATUS_INACTIVE,
};
use crate::error::{DomainError, DomainResult};

/// What a coupon discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum CouponType {
    /// Discount on the order amount
    General,
    /// Discount on the shipping cost
    Shipping,
    /// Discount on the order amount, restricted to coverage areas
    Regional,
}

impl CouponType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponType::General => "general",
            CouponType::Shipping => "shipping",
            CouponType::Regional => "regional",
        }
    }
}

impl TryFrom<&str> for CouponType {
    type Error = DomainError;

    fn try_from(value: &str) -> DomainResult<Self> {
        match value {
            "general" => Ok(CouponType::General),
            "shipping" => Ok(CouponType::Shipping),
            "regional" => Ok(CouponType::Regional),
            other => Err(DomainError::validation(format!(
                "Unknown coupon type '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CouponType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Amount,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Amount => "amount",
        }
    }
}

impl TryFrom<&str> for DiscountType {
    type Error = DomainError;

    fn try_from(value: &str) -> DomainResult<Self> {
        match value {
            "percentage" => Ok(DiscountType::Percentage),
            "amount" => Ok(DiscountType::Amount),
            other => Err(DomainError::validation(format!(
                "Unknown discount type '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activation flag used for both `status` and `status_publish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    Active,
    Inactive,
}

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Active => STATUS_ACTIVE,
            CouponStatus::Inactive => STATUS_INACTIVE,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CouponStatus::Active)
    }
}

impl TryFrom<&str> for CouponStatus {
    type Error = DomainError;

    fn try_from(value: &str) -> DomainResult<Self> {
        match value {
            STATUS_ACTIVE => Ok(CouponStatus::Active),
            STATUS_INACTIVE => Ok(CouponStatus::Inactive),
            other => Err(DomainError::validation(format!(
                "Unknown status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discount value. Only the value selected by the discount type exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// Whole percent, 1..=100
    Percentage(i32),
    /// Fixed amount in whole currency units
    Amount(i64),
}

impl Discount {
    /// Build a discount from the stored/requested triple.
    ///
    /// The value not selected by `discount_type` is ignored.
    pub fn from_parts(
        discount_type: DiscountType,
        percentage: Option<i32>,
        amount: Option<i64>,
    ) -> DomainResult<Self> {
        let discount = match discount_type {
            DiscountType::Percentage => Discount::Percentage(percentage.ok_or_else(|| {
                DomainError::validation("discount_percentage is required for percentage coupons")
            })?),
            DiscountType::Amount => Discount::Amount(amount.ok_or_else(|| {
                DomainError::validation("discount_amount is required for amount coupons")
            })?),
        };
        discount.validate()?;
        Ok(discount)
    }

    pub fn discount_type(&self) -> DiscountType {
        match self {
            Discount::Percentage(_) => DiscountType::Percentage,
            Discount::Amount(_) => DiscountType::Amount,
        }
    }

    pub fn percentage(&self) -> Option<i32> {
        match self {
            Discount::Percentage(p) => Some(*p),
            Discount::Amount(_) => None,
        }
    }

    pub fn amount(&self) -> Option<i64> {
        match self {
            Discount::Percentage(_) => None,
            Discount::Amount(a) => Some(*a),
        }
    }

    fn validate(&self) -> DomainResult<()> {
        match *self {
            Discount::Percentage(p)
                if !(MIN_DISCOUNT_PERCENTAGE..=MAX_DISCOUNT_PERCENTAGE).contains(&p) =>
            {
                Err(DomainError::validation(format!(
                    "discount_percentage must be between {} and {}",
                    MIN_DISCOUNT_PERCENTAGE, MAX_DISCOUNT_PERCENTAGE
                )))
            }
            Discount::Amount(a) if a <= 0 => Err(DomainError::validation(
                "discount_amount must be greater than zero",
            )),
            _ => Ok(()),
        }
    }
}

/// Coupon domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub coupon_type: CouponType,
    pub discount: Discount,
    pub min_purchase: i64,
    /// Owner of a personal coupon (None = general coupon)
    pub user_id: Option<i64>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    pub status: CouponStatus,
    pub status_publish: CouponStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp (None = live, Some = deleted)
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Coupon {
    /// Personal coupons belong to exactly one user.
    pub fn is_personal(&self) -> bool {
        self.user_id.is_some()
    }

    /// General coupons are usable by anyone; personal ones only by their owner.
    pub fn is_usable_by(&self, user_id: i64) -> bool {
        self.user_id.map_or(true, |owner| owner == user_id)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Both switches on and not soft-deleted.
    pub fn is_enabled(&self) -> bool {
        self.status.is_active() && self.status_publish.is_active() && !self.is_deleted()
    }

    /// Whether `today` falls inside the inclusive validity window.
    pub fn is_within_window(&self, today: NaiveDate) -> bool {
        self.valid_from <= today && today <= self.valid_until
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .map_or(false, |limit| self.usage_count >= limit)
    }

    /// Uses left after this application, or None when unlimited.
    pub fn remaining_usage(&self, dry_run: bool) -> Option<i32> {
        let consumed = if dry_run { 0 } else { 1 };
        self.usage_limit
            .map(|limit| (limit - self.usage_count - consumed).max(0))
    }

    /// Merge an admin update into this coupon and re-check invariants.
    pub fn apply_changes(&mut self, changes: &CouponChanges) -> DomainResult<()> {
        if let Some(code) = &changes.code {
            self.code = normalize_code(code)?;
        }
        if let Some(coupon_type) = changes.coupon_type {
            self.coupon_type = coupon_type;
        }

        if changes.discount_type.is_some()
            || changes.discount_percentage.is_some()
            || changes.discount_amount.is_some()
        {
            let discount_type = changes
                .discount_type
                .unwrap_or_else(|| self.discount.discount_type());
            self.discount = Discount::from_parts(
                discount_type,
                changes.discount_percentage.or(self.discount.percentage()),
                changes.discount_amount.or(self.discount.amount()),
            )?;
        }

        if let Some(min_purchase) = changes.min_purchase {
            self.min_purchase = min_purchase;
        }
        if let Some(user_id) = changes.user_id {
            self.user_id = user_id;
        }
        if let Some(usage_limit) = changes.usage_limit {
            self.usage_limit = usage_limit;
        }
        if let Some(valid_from) = changes.valid_from {
            self.valid_from = valid_from;
        }
        if let Some(valid_until) = changes.valid_until {
            self.valid_until = valid_until;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(status_publish) = changes.status_publish {
            self.status_publish = status_publish;
        }

        check_amounts(self.min_purchase, self.usage_limit)?;
        check_window(self.valid_from, self.valid_until)?;
        if let Some(limit) = self.usage_limit {
            if limit < self.usage_count {
                return Err(DomainError::validation(format!(
                    "usage_limit cannot be lower than the current usage count ({})",
                    self.usage_count
                )));
            }
        }
        Ok(())
    }
}

/// Coverage area attached to a regional coupon.
///
/// A `None` level means "any" at that level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageArea {
    pub id: i64,
    pub coupon_id: i64,
    pub province_id: Option<i64>,
    pub city_id: Option<i64>,
    pub subdistrict_id: Option<i64>,
}

/// Coverage area to be stored with a coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCoverageArea {
    pub province_id: Option<i64>,
    pub city_id: Option<i64>,
    pub subdistrict_id: Option<i64>,
}

impl NewCoverageArea {
    fn is_blank(&self) -> bool {
        self.province_id.is_none() && self.city_id.is_none() && self.subdistrict_id.is_none()
    }
}

/// Shipping destination supplied when applying a coupon.
///
/// Location ids come from the shipping provider, not from this system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Destination {
    pub province_id: Option<i64>,
    pub city_id: Option<i64>,
    pub subdistrict_id: Option<i64>,
}

/// Coupon creation data
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub coupon_type: CouponType,
    pub discount: Discount,
    pub min_purchase: i64,
    pub user_id: Option<i64>,
    pub usage_limit: Option<i32>,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    pub status: CouponStatus,
    pub status_publish: CouponStatus,
    pub coverage: Vec<NewCoverageArea>,
}

impl NewCoupon {
    /// Normalize the code and check every creation invariant.
    pub fn validate(&mut self) -> DomainResult<()> {
        self.code = normalize_code(&self.code)?;
        self.discount.validate()?;
        check_amounts(self.min_purchase, self.usage_limit)?;
        check_window(self.valid_from, self.valid_until)?;
        check_coverage(self.coupon_type, &self.coverage)
    }
}

/// Coupon update data. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct CouponChanges {
    pub code: Option<String>,
    pub coupon_type: Option<CouponType>,
    pub discount_type: Option<DiscountType>,
    pub discount_percentage: Option<i32>,
    pub discount_amount: Option<i64>,
    pub min_purchase: Option<i64>,
    /// `Some(None)` turns a personal coupon into a general one
    pub user_id: Option<Option<i64>>,
    /// `Some(None)` removes the limit
    pub usage_limit: Option<Option<i32>>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub status: Option<CouponStatus>,
    pub status_publish: Option<CouponStatus>,
    /// Replacement coverage set
    pub coverage: Option<Vec<NewCoverageArea>>,
}

impl CouponChanges {
    /// Work out which coverage set must be written after an update.
    ///
    /// Returns `Some(rows)` when the stored set has to be replaced.
    pub fn resolve_coverage(
        &self,
        coupon_type: CouponType,
        existing_rows: usize,
    ) -> DomainResult<Option<Vec<NewCoverageArea>>> {
        match &self.coverage {
            Some(rows) => {
                check_coverage(coupon_type, rows)?;
                Ok(Some(rows.clone()))
            }
            None if coupon_type == CouponType::Regional && existing_rows == 0 => Err(
                DomainError::validation("Regional coupons need at least one coverage area"),
            ),
            None if coupon_type != CouponType::Regional && existing_rows > 0 => {
                Ok(Some(Vec::new()))
            }
            None => Ok(None),
        }
    }
}

/// Admin listing filters
#[derive(Debug, Clone, Default)]
pub struct CouponQuery {
    pub status: Option<CouponStatus>,
    pub coupon_type: Option<CouponType>,
    /// Coupons whose window starts on or after this date
    pub start_date: Option<NaiveDate>,
    /// Coupons whose window ends on or before this date
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive code fragment
    pub search: Option<String>,
}

/// Trim and upper-case a coupon code, rejecting anything outside `A-Z 0-9 - _`.
pub fn normalize_code(code: &str) -> DomainResult<String> {
    let code = code.trim().to_ascii_uppercase();

    if code.len() < MIN_COUPON_CODE_LENGTH || code.len() > MAX_COUPON_CODE_LENGTH {
        return Err(DomainError::validation(format!(
            "Coupon code must be between {} and {} characters",
            MIN_COUPON_CODE_LENGTH, MAX_COUPON_CODE_LENGTH
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::validation(
            "Coupon code may only contain letters, digits, '-' and '_'",
        ));
    }

    Ok(code)
}

fn check_amounts(min_purchase: i64, usage_limit: Option<i32>) -> DomainResult<()> {
    if min_purchase < 0 {
        return Err(DomainError::validation("min_purchase cannot be negative"));
    }
    if usage_limit.map_or(false, |limit| limit < 1) {
        return Err(DomainError::validation("usage_limit must be at least 1"));
    }
    Ok(())
}

fn check_window(valid_from: NaiveDate, valid_until: NaiveDate) -> DomainResult<()> {
    if valid_from > valid_until {
        return Err(DomainError::validation(
            "valid_from must be on or before valid_until",
        ));
    }
    Ok(())
}

fn check_coverage(coupon_type: CouponType, rows: &[NewCoverageArea]) -> DomainResult<()> {
    match coupon_type {
        CouponType::Regional if rows.is_empty() => Err(DomainError::validation(
            "Regional coupons need at least one coverage area",
        )),
        CouponType::Regional if rows.iter().any(NewCoverageArea::is_blank) => {
            Err(DomainError::validation(
                "Each coverage area needs a province, city or subdistrict",
            ))
        }
        CouponType::Regional => Ok(()),
        _ if !rows.is_empty() => Err(DomainError::validation(
            "Coverage areas are only allowed on regional coupons",
        )),
        _ => Ok(()),
    }
}
