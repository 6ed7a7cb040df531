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
                    .table(Predictions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Predictions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Predictions::BoothId).big_integer().not_null())
                    .col(ColumnDef::new(Predictions::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Predictions::TurnoutPct).double().not_null())
                    .col(
                        ColumnDef::new(Predictions::ShareByParty)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Predictions::Confidence).integer().not_null())
                    .col(
                        ColumnDef::new(Predictions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Predictions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_predictions_booth")
                            .from(Predictions::Table, Predictions::BoothId)
                            .to(Booths::Table, Booths::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_predictions_user")
                            .from(Predictions::Table, Predictions::UserId)
                            .to(AppUsers::Table, AppUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One prediction per (booth, worker); the upsert path relies on this
        // constraint to serialize concurrent writes for the same key.
        manager
            .create_index(
                Index::create()
                    .name("uq_predictions_booth_user")
                    .table(Predictions::Table)
                    .col(Predictions::BoothId)
                    .col(Predictions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_predictions_user")
                    .table(Predictions::Table)
                    .col(Predictions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Predictions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Predictions {
    Table,
    Id,
    BoothId,
    UserId,
    TurnoutPct,
    ShareByParty,
    Confidence,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Booths {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AppUsers {
    Table,
    Id,
}
