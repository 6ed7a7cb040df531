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
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Campaigns::Code).string_len(16).not_null())
                    .col(ColumnDef::new(Campaigns::PartyId).big_integer().not_null())
                    .col(ColumnDef::new(Campaigns::State).string_len(64).not_null())
                    .col(ColumnDef::new(Campaigns::Description).string_len(512).null())
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaigns_party")
                            .from(Campaigns::Table, Campaigns::PartyId)
                            .to(Parties::Table, Parties::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_campaigns_code")
                    .table(Campaigns::Table)
                    .col(Campaigns::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CampaignMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignMembers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CampaignMembers::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignMembers::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CampaignMembers::Role).string_len(40).not_null())
                    .col(ColumnDef::new(CampaignMembers::Scope).string_len(16).not_null())
                    .col(
                        ColumnDef::new(CampaignMembers::ConstituencyId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(CampaignMembers::BoothId).big_integer().null())
                    .col(
                        ColumnDef::new(CampaignMembers::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(CampaignMembers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CampaignMembers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_members_campaign")
                            .from(CampaignMembers::Table, CampaignMembers::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_members_user")
                            .from(CampaignMembers::Table, CampaignMembers::UserId)
                            .to(AppUsers::Table, AppUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_campaign_members_campaign_user")
                    .table(CampaignMembers::Table)
                    .col(CampaignMembers::CampaignId)
                    .col(CampaignMembers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Constituencies are tagged to a campaign for campaign-level rollups.
        manager
            .alter_table(
                Table::alter()
                    .table(Constituencies::Table)
                    .add_column(
                        ColumnDef::new(Constituencies::CampaignId)
                            .big_integer()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Constituencies::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_constituencies_campaign")
                            .from_tbl(Constituencies::Table)
                            .from_col(Constituencies::CampaignId)
                            .to_tbl(Campaigns::Table)
                            .to_col(Campaigns::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_constituencies_campaign")
                    .table(Constituencies::Table)
                    .col(Constituencies::CampaignId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Constituencies::Table)
                    .drop_foreign_key(Alias::new("fk_constituencies_campaign"))
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Constituencies::Table)
                    .drop_column(Constituencies::CampaignId)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(CampaignMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    Name,
    Code,
    PartyId,
    State,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CampaignMembers {
    Table,
    Id,
    CampaignId,
    UserId,
    Role,
    Scope,
    ConstituencyId,
    BoothId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Parties {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AppUsers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Constituencies {
    Table,
    CampaignId,
}
