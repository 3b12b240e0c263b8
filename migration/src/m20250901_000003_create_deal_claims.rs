use sea_orm_migration::prelude::*;

use crate::m20250901_000001_create_users_and_vendors::{Users, Vendors};
use crate::m20250901_000002_create_deals::Deals;

#[derive(DeriveIden)]
enum DealClaims {
    Table,
    Id,
    DealId,
    UserId,
    VendorId,
    ClaimCode,
    CodeKind,
    Status,
    VendorVerified,
    VerifiedAt,
    BillAmount,
    SavingsAmount,
    ClaimedAt,
    ExpiresAt,
    UsedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DealClaims::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealClaims::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealClaims::DealId).big_integer().not_null())
                    .col(ColumnDef::new(DealClaims::UserId).big_integer().not_null())
                    .col(ColumnDef::new(DealClaims::VendorId).big_integer().not_null())
                    .col(ColumnDef::new(DealClaims::ClaimCode).string_len(16).not_null())
                    .col(
                        ColumnDef::new(DealClaims::CodeKind)
                            .string_len(20)
                            .not_null()
                            .default("unique"),
                    )
                    .col(
                        ColumnDef::new(DealClaims::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(DealClaims::VendorVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DealClaims::VerifiedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(DealClaims::BillAmount).big_integer().null())
                    .col(
                        ColumnDef::new(DealClaims::SavingsAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DealClaims::ClaimedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(DealClaims::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DealClaims::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DealClaims::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DealClaims::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deal_claims_deal")
                            .from(DealClaims::Table, DealClaims::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deal_claims_user")
                            .from(DealClaims::Table, DealClaims::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deal_claims_vendor")
                            .from(DealClaims::Table, DealClaims::VendorId)
                            .to(Vendors::Table, Vendors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deal_claims_code")
                    .table(DealClaims::Table)
                    .col(DealClaims::ClaimCode)
                    .col(DealClaims::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deal_claims_user_deal")
                    .table(DealClaims::Table)
                    .col(DealClaims::UserId)
                    .col(DealClaims::DealId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deal_claims_vendor")
                    .table(DealClaims::Table)
                    .col(DealClaims::VendorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(DealClaims::Table).to_owned())
            .await?;
        Ok(())
    }
}
