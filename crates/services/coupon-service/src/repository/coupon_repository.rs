//! Coupon read repository with soft delete support.
//!
//! Every query here excludes soft-deleted coupons. Writes go through
//! [`crate::infra::TxCouponRepository`] so they share a transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::entities::coupon::{self, Entity as CouponEntity};
use super::entities::coupon_coverage_area::{self, Entity as CoverageEntity};
use common::{AppError, AppResult, PaginationParams};
use domain::{Coupon, CouponQuery, CouponStatus, CoverageArea};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Coupon repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Find live coupon by ID
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Coupon>>;

    /// Find live coupon by its (normalized) code
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Coupon>>;

    /// Filtered, paginated admin listing. Returns the page and the total count.
    async fn list(
        &self,
        query: CouponQuery,
        page: PaginationParams,
    ) -> AppResult<(Vec<Coupon>, u64)>;

    /// General coupons that are enabled and valid on `today`
    async fn list_published(&self, today: NaiveDate) -> AppResult<Vec<Coupon>>;

    /// Enabled coupons visible to a user: their personal ones plus general ones
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Coupon>>;

    /// Coverage rows of one coupon
    async fn coverage_for(&self, coupon_id: i64) -> AppResult<Vec<CoverageArea>>;

    /// Coverage rows of several coupons at once
    async fn coverage_for_many(&self, coupon_ids: Vec<i64>) -> AppResult<Vec<CoverageArea>>;
}

/// Concrete implementation of CouponRepository
pub struct CouponStore {
    db: DatabaseConnection,
}

impl CouponStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Convert database rows into domain coupons.
pub(crate) fn into_coupons(models: Vec<coupon::Model>) -> AppResult<Vec<Coupon>> {
    models
        .into_iter()
        .map(|m| Coupon::try_from(m).map_err(AppError::from))
        .collect()
}

fn enabled() -> Condition {
    Condition::all()
        .add(coupon::Column::DeletedAt.is_null())
        .add(coupon::Column::Status.eq(CouponStatus::Active.as_str()))
        .add(coupon::Column::StatusPublish.eq(CouponStatus::Active.as_str()))
}

#[async_trait]
impl CouponRepository for CouponStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Coupon>> {
        let result = CouponEntity::find_by_id(id)
            .filter(coupon::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        result.map(Coupon::try_from).transpose().map_err(AppError::from)
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Coupon>> {
        let result = CouponEntity::find()
            .filter(coupon::Column::Code.eq(code))
            .filter(coupon::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        result.map(Coupon::try_from).transpose().map_err(AppError::from)
    }

    async fn list(
        &self,
        query: CouponQuery,
        page: PaginationParams,
    ) -> AppResult<(Vec<Coupon>, u64)> {
        let mut condition = Condition::all().add(coupon::Column::DeletedAt.is_null());

        if let Some(status) = query.status {
            condition = condition.add(coupon::Column::Status.eq(status.as_str()));
        }
        if let Some(coupon_type) = query.coupon_type {
            condition = condition.add(coupon::Column::CouponType.eq(coupon_type.as_str()));
        }
        if let Some(start) = query.start_date {
            condition = condition.add(coupon::Column::ValidFrom.gte(start));
        }
        if let Some(end) = query.end_date {
            condition = condition.add(coupon::Column::ValidUntil.lte(end));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            condition = condition.add(coupon::Column::Code.contains(search.to_ascii_uppercase()));
        }

        let select = CouponEntity::find().filter(condition);
        let total = select.clone().count(&self.db).await?;

        let models = select
            .order_by_desc(coupon::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((into_coupons(models)?, total))
    }

    async fn list_published(&self, today: NaiveDate) -> AppResult<Vec<Coupon>> {
        let models = CouponEntity::find()
            .filter(enabled())
            .filter(coupon::Column::UserId.is_null())
            .filter(coupon::Column::ValidFrom.lte(today))
            .filter(coupon::Column::ValidUntil.gte(today))
            .order_by_asc(coupon::Column::ValidUntil)
            .all(&self.db)
            .await?;

        into_coupons(models)
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Coupon>> {
        let models = CouponEntity::find()
            .filter(enabled())
            .filter(
                Condition::any()
                    .add(coupon::Column::UserId.eq(user_id))
                    .add(coupon::Column::UserId.is_null()),
            )
            .order_by_desc(coupon::Column::Id)
            .all(&self.db)
            .await?;

        into_coupons(models)
    }

    async fn coverage_for(&self, coupon_id: i64) -> AppResult<Vec<CoverageArea>> {
        let models = CoverageEntity::find()
            .filter(coupon_coverage_area::Column::CouponId.eq(coupon_id))
            .order_by_asc(coupon_coverage_area::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(CoverageArea::from).collect())
    }

    async fn coverage_for_many(&self, coupon_ids: Vec<i64>) -> AppResult<Vec<CoverageArea>> {
        if coupon_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = CoverageEntity::find()
            .filter(coupon_coverage_area::Column::CouponId.is_in(coupon_ids))
            .order_by_asc(coupon_coverage_area::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(CoverageArea::from).collect())
    }
}
