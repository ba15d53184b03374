//! Migration: Create coupons table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Coupons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Coupons::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Coupons::Code).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Coupons::CouponType).string_len(16).not_null())
                    .col(ColumnDef::new(Coupons::DiscountType).string_len(16).not_null())
                    .col(ColumnDef::new(Coupons::DiscountPercentage).integer().null())
                    .col(ColumnDef::new(Coupons::DiscountAmount).big_integer().null())
                    .col(
                        ColumnDef::new(Coupons::MinPurchase)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Coupons::UserId).big_integer().null())
                    .col(ColumnDef::new(Coupons::UsageLimit).integer().null())
                    .col(
                        ColumnDef::new(Coupons::UsageCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Coupons::ValidFrom).date().not_null())
                    .col(ColumnDef::new(Coupons::ValidUntil).date().not_null())
                    .col(
                        ColumnDef::new(Coupons::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Coupons::StatusPublish)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Coupons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Coupons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Coupons::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .check(Expr::cust(
                        "usage_limit IS NULL OR usage_count <= usage_limit",
                    ))
                    .check(Expr::cust("valid_from <= valid_until"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_coupons_deleted_at")
                    .table(Coupons::Table)
                    .col(Coupons::DeletedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_coupons_user_id")
                    .table(Coupons::Table)
                    .col(Coupons::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Coupons::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Coupons {
    Table,
    Id,
    Code,
    CouponType,
    DiscountType,
    DiscountPercentage,
    DiscountAmount,
    MinPurchase,
    UserId,
    UsageLimit,
    UsageCount,
    ValidFrom,
    ValidUntil,
    Status,
    StatusPublish,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
