//! Coupon database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Coupon, CouponStatus, CouponType, Discount, DiscountType, DomainError, DomainResult};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub coupon_type: String,
    pub discount_type: String,
    pub discount_percentage: Option<i32>,
    pub discount_amount: Option<i64>,
    pub min_purchase: i64,
    pub user_id: Option<i64>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub valid_from: Date,
    pub valid_until: Date,
    pub status: String,
    pub status_publish: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Soft delete timestamp (NULL = live, set = deleted)
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::coupon_coverage_area::Entity")]
    CoverageAreas,
}

impl Related<super::coupon_coverage_area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CoverageAreas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity.
///
/// Fails only when the row holds values no code path writes.
impl TryFrom<Model> for Coupon {
    type Error = DomainError;

    fn try_from(model: Model) -> DomainResult<Self> {
        let id = model.id;
        let corrupt = move |e: DomainError| {
            DomainError::internal(format!("coupon {} has invalid stored data: {}", id, e))
        };

        let discount = Discount::from_parts(
            DiscountType::try_from(model.discount_type.as_str()).map_err(corrupt)?,
            model.discount_percentage,
            model.discount_amount,
        )
        .map_err(corrupt)?;

        Ok(Coupon {
            id: model.id,
            coupon_type: CouponType::try_from(model.coupon_type.as_str()).map_err(corrupt)?,
            discount,
            status: CouponStatus::try_from(model.status.as_str()).map_err(corrupt)?,
            status_publish: CouponStatus::try_from(model.status_publish.as_str())
                .map_err(corrupt)?,
            code: model.code,
            min_purchase: model.min_purchase,
            user_id: model.user_id,
            usage_limit: model.usage_limit,
            usage_count: model.usage_count,
            valid_from: model.valid_from,
            valid_until: model.valid_until,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        })
    }
}
