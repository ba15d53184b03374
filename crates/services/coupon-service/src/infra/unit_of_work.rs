//! Unit of Work pattern implementation.
//!
//! Coordinates coupon writes atomically: a coupon and its coverage rows are
//! written in one transaction, and applying a coupon locks its row until the
//! usage counter has been bumped.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, IsolationLevel, NotSet, QueryFilter, QueryOrder, QuerySelect, Set,
    SqlErr, TransactionTrait,
};
use std::sync::Arc;

use crate::repository::entities::coupon::{self, ActiveModel, Entity as CouponEntity};
use crate::repository::entities::coupon_coverage_area::{
    self, ActiveModel as CoverageActiveModel, Entity as CoverageEntity,
};
use crate::repository::{CouponRepository, CouponStore};
use common::{AppError, AppResult};
use domain::{Coupon, CoverageArea, NewCoupon, NewCoverageArea};

/// Unit of Work trait for dependency injection.
///
/// Provides the read repository and transaction management.
/// Not mockable directly because of the generic `transaction` method;
/// tests either stub it or back it with a mock database.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get coupon read repository
    fn coupons(&self) -> Arc<dyn CouponRepository>;

    /// Execute a closure within a ReadCommitted transaction.
    ///
    /// Committed when the closure returns `Ok`, rolled back otherwise.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// Transaction context providing repository access within a transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Get coupon repository for this transaction
    pub fn coupons(&self) -> TxCouponRepository<'_> {
        TxCouponRepository::new(self.txn)
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    coupon_repo: Arc<CouponStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        let coupon_repo = Arc::new(CouponStore::new(db.clone()));
        Self { db, coupon_repo }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn coupons(&self) -> Arc<dyn CouponRepository> {
        self.coupon_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await?;

        let ctx = TransactionContext::new(&txn);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(error = %rollback_err, "Transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}

/// Transaction-aware coupon repository.
///
/// Lookups exclude soft-deleted coupons unless stated otherwise.
pub struct TxCouponRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxCouponRepository<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Find live coupon by ID and lock its row until the transaction ends
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Coupon>> {
        let result = CouponEntity::find_by_id(id)
            .filter(coupon::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(self.txn)
            .await?;

        result.map(Coupon::try_from).transpose().map_err(AppError::from)
    }

    /// Find coupon by code with `SELECT ... FOR UPDATE`.
    ///
    /// Soft-deleted rows are returned too; eligibility rejects them as unavailable.
    pub async fn lock_by_code(&self, code: &str) -> AppResult<Option<Coupon>> {
        let result = CouponEntity::find()
            .filter(coupon::Column::Code.eq(code))
            .lock_exclusive()
            .one(self.txn)
            .await?;

        result.map(Coupon::try_from).transpose().map_err(AppError::from)
    }

    /// Whether another coupon (deleted ones included) already uses `code`
    pub async fn code_taken(&self, code: &str, excluding: Option<i64>) -> AppResult<bool> {
        let mut select = CouponEntity::find().filter(coupon::Column::Code.eq(code));
        if let Some(id) = excluding {
            select = select.filter(coupon::Column::Id.ne(id));
        }

        Ok(select.one(self.txn).await?.is_some())
    }

    /// Insert a validated coupon (coverage rows are written separately)
    pub async fn insert(&self, new: &NewCoupon) -> AppResult<Coupon> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: NotSet,
            code: Set(new.code.clone()),
            coupon_type: Set(new.coupon_type.as_str().to_string()),
            discount_type: Set(new.discount.discount_type().as_str().to_string()),
            discount_percentage: Set(new.discount.percentage()),
            discount_amount: Set(new.discount.amount()),
            min_purchase: Set(new.min_purchase),
            user_id: Set(new.user_id),
            usage_limit: Set(new.usage_limit),
            usage_count: Set(0),
            valid_from: Set(new.valid_from),
            valid_until: Set(new.valid_until),
            status: Set(new.status.as_str().to_string()),
            status_publish: Set(new.status_publish.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model
            .insert(self.txn)
            .await
            .map_err(|e| code_conflict(e, &new.code))?;
        Ok(Coupon::try_from(model)?)
    }

    /// Persist every admin-editable field of `coupon`.
    ///
    /// `usage_count` is left alone; only [`Self::increment_usage`] moves it.
    pub async fn update(&self, coupon: &Coupon) -> AppResult<Coupon> {
        let active_model = ActiveModel {
            id: Set(coupon.id),
            code: Set(coupon.code.clone()),
            coupon_type: Set(coupon.coupon_type.as_str().to_string()),
            discount_type: Set(coupon.discount.discount_type().as_str().to_string()),
            discount_percentage: Set(coupon.discount.percentage()),
            discount_amount: Set(coupon.discount.amount()),
            min_purchase: Set(coupon.min_purchase),
            user_id: Set(coupon.user_id),
            usage_limit: Set(coupon.usage_limit),
            usage_count: NotSet,
            valid_from: Set(coupon.valid_from),
            valid_until: Set(coupon.valid_until),
            status: Set(coupon.status.as_str().to_string()),
            status_publish: Set(coupon.status_publish.as_str().to_string()),
            created_at: NotSet,
            updated_at: Set(Utc::now()),
            deleted_at: NotSet,
        };

        let model = active_model
            .update(self.txn)
            .await
            .map_err(|e| code_conflict(e, &coupon.code))?;
        Ok(Coupon::try_from(model)?)
    }

    /// Soft delete: set deleted_at. Returns false when nothing was live.
    pub async fn soft_delete(&self, id: i64) -> AppResult<bool> {
        let now = Utc::now();
        let result = CouponEntity::update_many()
            .col_expr(coupon::Column::DeletedAt, Expr::value(now))
            .col_expr(coupon::Column::UpdatedAt, Expr::value(now))
            .filter(coupon::Column::Id.eq(id))
            .filter(coupon::Column::DeletedAt.is_null())
            .exec(self.txn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Drop the coupon's coverage rows and write `rows` in their place
    pub async fn replace_coverage(
        &self,
        coupon_id: i64,
        rows: &[NewCoverageArea],
    ) -> AppResult<Vec<CoverageArea>> {
        CoverageEntity::delete_many()
            .filter(coupon_coverage_area::Column::CouponId.eq(coupon_id))
            .exec(self.txn)
            .await?;

        self.insert_coverage(coupon_id, rows).await
    }

    /// Write coverage rows for a coupon
    pub async fn insert_coverage(
        &self,
        coupon_id: i64,
        rows: &[NewCoverageArea],
    ) -> AppResult<Vec<CoverageArea>> {
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let model = CoverageActiveModel {
                id: NotSet,
                coupon_id: Set(coupon_id),
                province_id: Set(row.province_id),
                city_id: Set(row.city_id),
                subdistrict_id: Set(row.subdistrict_id),
            }
            .insert(self.txn)
            .await?;
            stored.push(CoverageArea::from(model));
        }

        Ok(stored)
    }

    /// Coverage rows of one coupon, read inside the transaction
    pub async fn coverage_for(&self, coupon_id: i64) -> AppResult<Vec<CoverageArea>> {
        let models = CoverageEntity::find()
            .filter(coupon_coverage_area::Column::CouponId.eq(coupon_id))
            .order_by_asc(coupon_coverage_area::Column::Id)
            .all(self.txn)
            .await?;

        Ok(models.into_iter().map(CoverageArea::from).collect())
    }

    /// Bump usage_count by one unless the limit is already reached.
    ///
    /// Returns false when the guarded update touched no row.
    pub async fn increment_usage(&self, id: i64) -> AppResult<bool> {
        let result = CouponEntity::update_many()
            .col_expr(
                coupon::Column::UsageCount,
                Expr::col(coupon::Column::UsageCount).add(1),
            )
            .col_expr(coupon::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(coupon::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(coupon::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(coupon::Column::UsageCount)
                            .lt(Expr::col(coupon::Column::UsageLimit)),
                    ),
            )
            .exec(self.txn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}

// Two writers can pass `code_taken` at once; the unique index settles it.
fn code_conflict(err: DbErr, code: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::conflict(format!("Coupon code '{}'", code))
        }
        _ => AppError::from(err),
    }
}
