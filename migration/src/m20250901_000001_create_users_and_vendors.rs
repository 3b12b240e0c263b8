use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    Name,
    Phone,
    Role,
    City,
    State,
    MembershipPlan,
    MembershipExpiresAt,
    TotalSavings,
    DealsClaimed,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Vendors {
    Table,
    Id,
    UserId,
    BusinessName,
    GstNumber,
    PanNumber,
    LogoUrl,
    Description,
    Address,
    City,
    State,
    Latitude,
    Longitude,
    StoreType,
    Status,
    IsApproved,
    RejectionReason,
    TotalDeals,
    TotalRedemptions,
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
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Users::Phone).string_len(20).null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(20)
                            .not_null()
                            .default("customer"),
                    )
                    .col(ColumnDef::new(Users::City).string_len(100).null())
                    .col(ColumnDef::new(Users::State).string_len(100).null())
                    .col(
                        ColumnDef::new(Users::MembershipPlan)
                            .string_len(20)
                            .not_null()
                            .default("basic"),
                    )
                    .col(
                        ColumnDef::new(Users::MembershipExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::TotalSavings)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::DealsClaimed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vendors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vendors::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Vendors::BusinessName).string_len(200).not_null())
                    .col(ColumnDef::new(Vendors::GstNumber).string_len(20).null())
                    .col(ColumnDef::new(Vendors::PanNumber).string_len(20).null())
                    .col(ColumnDef::new(Vendors::LogoUrl).text().null())
                    .col(ColumnDef::new(Vendors::Description).text().null())
                    .col(ColumnDef::new(Vendors::Address).text().null())
                    .col(ColumnDef::new(Vendors::City).string_len(100).null())
                    .col(ColumnDef::new(Vendors::State).string_len(100).null())
                    .col(ColumnDef::new(Vendors::Latitude).string_len(32).null())
                    .col(ColumnDef::new(Vendors::Longitude).string_len(32).null())
                    .col(ColumnDef::new(Vendors::StoreType).string_len(50).null())
                    .col(
                        ColumnDef::new(Vendors::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Vendors::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Vendors::RejectionReason).text().null())
                    .col(
                        ColumnDef::new(Vendors::TotalDeals)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Vendors::TotalRedemptions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Vendors::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Vendors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vendors_user")
                            .from(Vendors::Table, Vendors::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // one vendor profile per user
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_vendors_user")
                    .table(Vendors::Table)
                    .col(Vendors::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_vendors_status")
                    .table(Vendors::Table)
                    .col(Vendors::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Vendors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
