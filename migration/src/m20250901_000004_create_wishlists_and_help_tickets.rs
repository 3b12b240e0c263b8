use sea_orm_migration::prelude::*;

use crate::m20250901_000001_create_users_and_vendors::Users;
use crate::m20250901_000002_create_deals::Deals;

#[derive(DeriveIden)]
enum Wishlists {
    Table,
    Id,
    UserId,
    DealId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum HelpTickets {
    Table,
    Id,
    UserId,
    Subject,
    Description,
    Category,
    Priority,
    Status,
    AdminResponse,
    ResolvedAt,
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
                    .table(Wishlists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wishlists::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wishlists::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Wishlists::DealId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Wishlists::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wishlists_user")
                            .from(Wishlists::Table, Wishlists::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wishlists_deal")
                            .from(Wishlists::Table, Wishlists::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_wishlists_user_deal")
                    .table(Wishlists::Table)
                    .col(Wishlists::UserId)
                    .col(Wishlists::DealId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HelpTickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HelpTickets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HelpTickets::UserId).big_integer().not_null())
                    .col(ColumnDef::new(HelpTickets::Subject).string_len(200).not_null())
                    .col(ColumnDef::new(HelpTickets::Description).text().not_null())
                    .col(
                        ColumnDef::new(HelpTickets::Category)
                            .string_len(50)
                            .not_null()
                            .default("general"),
                    )
                    .col(
                        ColumnDef::new(HelpTickets::Priority)
                            .string_len(20)
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(HelpTickets::Status)
                            .string_len(20)
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(HelpTickets::AdminResponse).text().null())
                    .col(
                        ColumnDef::new(HelpTickets::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(HelpTickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(HelpTickets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_help_tickets_user")
                            .from(HelpTickets::Table, HelpTickets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_help_tickets_status")
                    .table(HelpTickets::Table)
                    .col(HelpTickets::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(HelpTickets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Wishlists::Table).to_owned())
            .await?;
        Ok(())
    }
}
