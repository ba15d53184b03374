//! Migration: Create coupon coverage areas table.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_coupons_table::Coupons;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CouponCoverageAreas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CouponCoverageAreas::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CouponCoverageAreas::CouponId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CouponCoverageAreas::ProvinceId).big_integer().null())
                    .col(ColumnDef::new(CouponCoverageAreas::CityId).big_integer().null())
                    .col(ColumnDef::new(CouponCoverageAreas::SubdistrictId).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_coverage_areas_coupon_id")
                            .from(CouponCoverageAreas::Table, CouponCoverageAreas::CouponId)
                            .to(Coupons::Table, Coupons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_coverage_areas_coupon_id")
                    .table(CouponCoverageAreas::Table)
                    .col(CouponCoverageAreas::CouponId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CouponCoverageAreas::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CouponCoverageAreas {
    Table,
    Id,
    CouponId,
    ProvinceId,
    CityId,
    SubdistrictId,
}
