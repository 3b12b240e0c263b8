use sea_orm_migration::prelude::*;

use crate::m20250901_000001_create_users_and_vendors::Vendors;

#[derive(DeriveIden)]
enum PosSessions {
    Table,
    Id,
    VendorId,
    SessionToken,
    TerminalId,
    IsActive,
    StartedAt,
    EndedAt,
    TotalTransactions,
    TotalAmount,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PosSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PosSessions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PosSessions::VendorId).big_integer().not_null())
                    .col(ColumnDef::new(PosSessions::SessionToken).uuid().not_null())
                    .col(ColumnDef::new(PosSessions::TerminalId).string_len(100).null())
                    .col(
                        ColumnDef::new(PosSessions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PosSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(PosSessions::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PosSessions::TotalTransactions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PosSessions::TotalAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pos_sessions_vendor")
                            .from(PosSessions::Table, PosSessions::VendorId)
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
                    .name("uq_pos_sessions_token")
                    .table(PosSessions::Table)
                    .col(PosSessions::SessionToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_pos_sessions_vendor_active")
                    .table(PosSessions::Table)
                    .col(PosSessions::VendorId)
                    .col(PosSessions::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(PosSessions::Table).to_owned())
            .await?;
        Ok(())
    }
}
