//! Coverage area entity for regional coupons.

use sea_orm::entity::prelude::*;

use domain::CoverageArea;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "coupon_coverage_areas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub coupon_id: i64,
    pub province_id: Option<i64>,
    pub city_id: Option<i64>,
    pub subdistrict_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::coupon::Entity",
        from = "Column::CouponId",
        to = "super::coupon::Column::Id",
        on_delete = "Cascade"
    )]
    Coupon,
}

impl Related<super::coupon::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coupon.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CoverageArea {
    fn from(model: Model) -> Self {
        CoverageArea {
            id: model.id,
            coupon_id: model.coupon_id,
            province_id: model.province_id,
            city_id: model.city_id,
            subdistrict_id: model.subdistrict_id,
        }
    }
}
