//! Coupon service - admin management, listings and coupon application.

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use common::{AppError, AppResult, OptionExt, Paginated, PaginationParams};
use domain::{
    evaluate, normalize_code, ApplyContext, Coupon, CouponChanges, CouponFlags, CouponQuery,
    CouponRejection, CouponType, CoverageArea, Destination, DiscountBreakdown, NewCoupon,
};

use crate::infra::{TxCouponRepository, UnitOfWork};

/// A coupon together with its coverage rows.
#[derive(Debug, Clone)]
pub struct CouponDetails {
    pub coupon: Coupon,
    pub coverage: Vec<CoverageArea>,
}

/// Coupon as shown in a user's own listing.
#[derive(Debug, Clone)]
pub struct UserCoupon {
    pub details: CouponDetails,
    pub flags: CouponFlags,
}

/// Order data submitted when applying a coupon.
#[derive(Debug, Clone)]
pub struct ApplyCoupon {
    pub code: String,
    pub order_amount: i64,
    pub shipping_cost: i64,
    pub destination: Option<Destination>,
    pub dry_run: bool,
}

/// Outcome of a successful application.
#[derive(Debug, Clone)]
pub struct AppliedCoupon {
    pub coupon: Coupon,
    pub breakdown: DiscountBreakdown,
    pub remaining_usage: Option<i32>,
    pub dry_run: bool,
}

/// Coupon service trait for dependency injection.
#[async_trait]
pub trait CouponService: Send + Sync {
    /// Create a coupon and its coverage rows
    async fn create_coupon(&self, new: NewCoupon) -> AppResult<CouponDetails>;

    /// Filtered admin listing
    async fn list_coupons(
        &self,
        query: CouponQuery,
        page: PaginationParams,
    ) -> AppResult<Paginated<CouponDetails>>;

    /// Get live coupon by ID
    async fn get_coupon(&self, id: i64) -> AppResult<CouponDetails>;

    /// Apply an admin update (fields and/or coverage)
    async fn update_coupon(&self, id: i64, changes: CouponChanges) -> AppResult<CouponDetails>;

    /// Soft delete coupon
    async fn delete_coupon(&self, id: i64) -> AppResult<()>;

    /// Enabled coupon by plaintext code
    async fn get_coupon_by_code(&self, code: &str) -> AppResult<CouponDetails>;

    /// General coupons usable today
    async fn list_published(&self) -> AppResult<Vec<CouponDetails>>;

    /// Personal and general coupons visible to a user, with derived flags
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<UserCoupon>>;

    /// Validate a coupon against an order and, unless dry-running, consume one use
    async fn apply_coupon(&self, user_id: i64, request: ApplyCoupon) -> AppResult<AppliedCoupon>;
}

/// Concrete implementation of CouponService on top of a UnitOfWork.
pub struct CouponManager<U: UnitOfWork> {
    uow: Arc<U>,
    utc_offset: FixedOffset,
}

impl<U: UnitOfWork> CouponManager<U> {
    pub fn new(uow: Arc<U>, utc_offset: FixedOffset) -> Self {
        Self { uow, utc_offset }
    }

    /// Current date in the shop's calendar
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }

    async fn with_coverage(&self, coupons: Vec<Coupon>) -> AppResult<Vec<CouponDetails>> {
        let regional: Vec<i64> = coupons
            .iter()
            .filter(|c| c.coupon_type == CouponType::Regional)
            .map(|c| c.id)
            .collect();

        let mut by_coupon: HashMap<i64, Vec<CoverageArea>> = HashMap::new();
        for area in self.uow.coupons().coverage_for_many(regional).await? {
            by_coupon.entry(area.coupon_id).or_default().push(area);
        }

        Ok(coupons
            .into_iter()
            .map(|coupon| CouponDetails {
                coverage: by_coupon.remove(&coupon.id).unwrap_or_default(),
                coupon,
            })
            .collect())
    }

    async fn details(&self, coupon: Coupon) -> AppResult<CouponDetails> {
        let coverage = if coupon.coupon_type == CouponType::Regional {
            self.uow.coupons().coverage_for(coupon.id).await?
        } else {
            Vec::new()
        };
        Ok(CouponDetails { coupon, coverage })
    }
}

#[async_trait]
impl<U: UnitOfWork + 'static> CouponService for CouponManager<U> {
    async fn create_coupon(&self, mut new: NewCoupon) -> AppResult<CouponDetails> {
        new.validate()?;

        let details = self
            .uow
            .transaction(move |tx| Box::pin(async move { create_in_tx(tx.coupons(), new).await }))
            .await?;

        tracing::info!(
            coupon_id = details.coupon.id,
            code = %details.coupon.code,
            coupon_type = %details.coupon.coupon_type,
            "Coupon created"
        );
        Ok(details)
    }

    async fn list_coupons(
        &self,
        query: CouponQuery,
        page: PaginationParams,
    ) -> AppResult<Paginated<CouponDetails>> {
        let (coupons, total) = self.uow.coupons().list(query, page.clone()).await?;
        let items = self.with_coverage(coupons).await?;
        Ok(Paginated::new(items, &page, total))
    }

    async fn get_coupon(&self, id: i64) -> AppResult<CouponDetails> {
        let coupon = self
            .uow
            .coupons()
            .find_by_id(id)
            .await?
            .ok_or_not_found()?;

        self.details(coupon).await
    }

    async fn update_coupon(&self, id: i64, changes: CouponChanges) -> AppResult<CouponDetails> {
        let details = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move { update_in_tx(tx.coupons(), id, changes).await })
            })
            .await?;

        tracing::info!(coupon_id = id, "Coupon updated");
        Ok(details)
    }

    async fn delete_coupon(&self, id: i64) -> AppResult<()> {
        let deleted = self
            .uow
            .transaction(move |tx| Box::pin(async move { tx.coupons().soft_delete(id).await }))
            .await?;

        if !deleted {
            return Err(AppError::NotFound);
        }
        tracing::info!(coupon_id = id, "Coupon soft-deleted");
        Ok(())
    }

    async fn get_coupon_by_code(&self, code: &str) -> AppResult<CouponDetails> {
        let code = normalize_code(code).map_err(|_| AppError::NotFound)?;

        let coupon = self
            .uow
            .coupons()
            .find_by_code(&code)
            .await?
            .filter(Coupon::is_enabled)
            .ok_or(AppError::NotFound)?;

        self.details(coupon).await
    }

    async fn list_published(&self) -> AppResult<Vec<CouponDetails>> {
        let coupons = self.uow.coupons().list_published(self.today()).await?;
        self.with_coverage(coupons).await
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<UserCoupon>> {
        let today = self.today();
        let coupons = self.uow.coupons().list_for_user(user_id).await?;

        Ok(self
            .with_coverage(coupons)
            .await?
            .into_iter()
            .map(|details| UserCoupon {
                flags: CouponFlags::for_coupon(&details.coupon, today),
                details,
            })
            .collect())
    }

    async fn apply_coupon(&self, user_id: i64, request: ApplyCoupon) -> AppResult<AppliedCoupon> {
        let code = normalize_code(&request.code).map_err(|_| AppError::NotFound)?;
        let ctx = ApplyContext {
            user_id,
            today: self.today(),
            order_amount: request.order_amount,
            shipping_cost: request.shipping_cost,
            destination: request.destination,
        };
        let dry_run = request.dry_run;

        let result = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move { apply_in_tx(tx.coupons(), code, ctx, dry_run).await })
            })
            .await;

        match &result {
            Ok(applied) => tracing::info!(
                coupon_id = applied.coupon.id,
                user_id,
                dry_run,
                discount = applied.breakdown.discount_amount,
                "Coupon applied"
            ),
            Err(AppError::CouponRejected(rejection)) => tracing::debug!(
                user_id,
                reason = rejection.code(),
                "Coupon rejected"
            ),
            Err(_) => {}
        }
        result
    }
}

async fn create_in_tx(repo: TxCouponRepository<'_>, new: NewCoupon) -> AppResult<CouponDetails> {
    if repo.code_taken(&new.code, None).await? {
        return Err(AppError::conflict(format!("Coupon code '{}'", new.code)));
    }

    let coupon = repo.insert(&new).await?;
    let coverage = if new.coverage.is_empty() {
        Vec::new()
    } else {
        repo.insert_coverage(coupon.id, &new.coverage).await?
    };

    Ok(CouponDetails { coupon, coverage })
}

async fn update_in_tx(
    repo: TxCouponRepository<'_>,
    id: i64,
    changes: CouponChanges,
) -> AppResult<CouponDetails> {
    let mut coupon = repo.find_by_id(id).await?.ok_or_not_found()?;
    coupon.apply_changes(&changes)?;

    if changes.code.is_some() && repo.code_taken(&coupon.code, Some(id)).await? {
        return Err(AppError::conflict(format!("Coupon code '{}'", coupon.code)));
    }

    let existing = repo.coverage_for(id).await?;
    let coverage = match changes.resolve_coverage(coupon.coupon_type, existing.len())? {
        Some(rows) => repo.replace_coverage(id, &rows).await?,
        None => existing,
    };

    let coupon = repo.update(&coupon).await?;
    Ok(CouponDetails { coupon, coverage })
}

async fn apply_in_tx(
    repo: TxCouponRepository<'_>,
    code: String,
    ctx: ApplyContext,
    dry_run: bool,
) -> AppResult<AppliedCoupon> {
    let coupon = repo.lock_by_code(&code).await?.ok_or(AppError::NotFound)?;

    let coverage = if coupon.coupon_type == CouponType::Regional {
        repo.coverage_for(coupon.id).await?
    } else {
        Vec::new()
    };

    let breakdown = evaluate(&coupon, &coverage, &ctx)?;
    let remaining_usage = coupon.remaining_usage(dry_run);

    if dry_run {
        return Ok(AppliedCoupon {
            coupon,
            breakdown,
            remaining_usage,
            dry_run,
        });
    }

    if !repo.increment_usage(coupon.id).await? {
        return Err(CouponRejection::Exhausted.into());
    }

    let coupon = repo.find_by_id(coupon.id).await?.ok_or(AppError::NotFound)?;
    Ok(AppliedCoupon {
        coupon,
        breakdown,
        remaining_usage,
        dry_run,
    })
}
