use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::Expr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Constituencies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Constituencies::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Constituencies::Name)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Constituencies::State)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Constituencies::Kind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Constituencies::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Constituencies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Constituencies::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_constituencies_state")
                    .table(Constituencies::Table)
                    .col(Constituencies::State)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Booths::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Booths::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Booths::BoothNumber).string_len(32).not_null())
                    .col(ColumnDef::new(Booths::Name).string_len(128).null())
                    .col(ColumnDef::new(Booths::ConstituencyId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Booths::VoterCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Booths::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Booths::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booths_constituency")
                            .from(Booths::Table, Booths::ConstituencyId)
                            .to(Constituencies::Table, Constituencies::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booths_constituency")
                    .table(Booths::Table)
                    .col(Booths::ConstituencyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Parties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Parties::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Parties::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Parties::ShortName).string_len(32).not_null())
                    .col(ColumnDef::new(Parties::LogoUrl).string_len(256).null())
                    .col(
                        ColumnDef::new(Parties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Parties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_parties_short_name")
                    .table(Parties::Table)
                    .col(Parties::ShortName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AppUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppUsers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppUsers::Name).string_len(128).not_null())
                    .col(ColumnDef::new(AppUsers::Email).string_len(128).not_null())
                    .col(ColumnDef::new(AppUsers::Phone).string_len(32).null())
                    .col(ColumnDef::new(AppUsers::Role).string_len(16).not_null())
                    .col(ColumnDef::new(AppUsers::ConstituencyId).big_integer().null())
                    .col(ColumnDef::new(AppUsers::ApiToken).string_len(128).not_null())
                    .col(
                        ColumnDef::new(AppUsers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AppUsers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_app_users_constituency")
                            .from(AppUsers::Table, AppUsers::ConstituencyId)
                            .to(Constituencies::Table, Constituencies::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_app_users_email")
                    .table(AppUsers::Table)
                    .col(AppUsers::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_app_users_api_token")
                    .table(AppUsers::Table)
                    .col(AppUsers::ApiToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BoothAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BoothAssignments::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BoothAssignments::BoothId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BoothAssignments::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_booth_assignments")
                            .col(BoothAssignments::UserId)
                            .col(BoothAssignments::BoothId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booth_assignments_user")
                            .from(BoothAssignments::Table, BoothAssignments::UserId)
                            .to(AppUsers::Table, AppUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booth_assignments_booth")
                            .from(BoothAssignments::Table, BoothAssignments::BoothId)
                            .to(Booths::Table, Booths::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booth_assignments_booth")
                    .table(BoothAssignments::Table)
                    .col(BoothAssignments::BoothId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BoothAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AppUsers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Booths::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Constituencies::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Constituencies {
    Table,
    Id,
    Name,
    State,
    Kind,
    IsLocked,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Booths {
    Table,
    Id,
    BoothNumber,
    Name,
    ConstituencyId,
    VoterCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Parties {
    Table,
    Id,
    Name,
    ShortName,
    LogoUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AppUsers {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Role,
    ConstituencyId,
    ApiToken,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BoothAssignments {
    Table,
    UserId,
    BoothId,
    AssignedAt,
}
