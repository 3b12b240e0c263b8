use sea_orm_migration::prelude::*;

use crate::m20250901_000001_create_users_and_vendors::{Users, Vendors};

#[derive(DeriveIden)]
pub(crate) enum Deals {
    Table,
    Id,
    VendorId,
    Title,
    Description,
    Category,
    ImageUrl,
    DealType,
    DiscountPercentage,
    DiscountCode,
    OriginalPrice,
    DiscountedPrice,
    ValidFrom,
    ValidUntil,
    MaxRedemptions,
    CurrentRedemptions,
    RequiredMembership,
    IsActive,
    IsApproved,
    IsRejected,
    RejectionReason,
    ApprovedBy,
    VerificationPin,
    PinSalt,
    ViewCount,
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
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deals::VendorId).big_integer().not_null())
                    .col(ColumnDef::new(Deals::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Deals::Description).text().not_null())
                    .col(ColumnDef::new(Deals::Category).string_len(50).not_null())
                    .col(ColumnDef::new(Deals::ImageUrl).text().null())
                    .col(
                        ColumnDef::new(Deals::DealType)
                            .string_len(20)
                            .not_null()
                            .default("offline"),
                    )
                    .col(ColumnDef::new(Deals::DiscountPercentage).integer().not_null())
                    .col(ColumnDef::new(Deals::DiscountCode).string_len(50).null())
                    .col(ColumnDef::new(Deals::OriginalPrice).big_integer().null())
                    .col(ColumnDef::new(Deals::DiscountedPrice).big_integer().null())
                    .col(
                        ColumnDef::new(Deals::ValidFrom)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deals::ValidUntil)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Deals::MaxRedemptions).integer().null())
                    .col(
                        ColumnDef::new(Deals::CurrentRedemptions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Deals::RequiredMembership)
                            .string_len(20)
                            .not_null()
                            .default("basic"),
                    )
                    .col(
                        ColumnDef::new(Deals::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Deals::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Deals::IsRejected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Deals::RejectionReason).text().null())
                    .col(ColumnDef::new(Deals::ApprovedBy).big_integer().null())
                    .col(ColumnDef::new(Deals::VerificationPin).string_len(100).not_null())
                    .col(ColumnDef::new(Deals::PinSalt).string_len(32).null())
                    .col(
                        ColumnDef::new(Deals::ViewCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Deals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_vendor")
                            .from(Deals::Table, Deals::VendorId)
                            .to(Vendors::Table, Vendors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_approved_by")
                            .from(Deals::Table, Deals::ApprovedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deals_vendor")
                    .table(Deals::Table)
                    .col(Deals::VendorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deals_listing")
                    .table(Deals::Table)
                    .col(Deals::IsActive)
                    .col(Deals::IsApproved)
                    .col(Deals::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Deals::Table).to_owned())
            .await?;
        Ok(())
    }
}
