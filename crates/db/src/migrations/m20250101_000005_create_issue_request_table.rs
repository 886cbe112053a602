//! Create issue request table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IssueRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IssueRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IssueRequest::DeviceId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IssueRequest::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IssueRequest::Status)
                            .string_len(20)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(IssueRequest::StartDate).date().not_null())
                    .col(ColumnDef::new(IssueRequest::EndDate).date().not_null())
                    .col(ColumnDef::new(IssueRequest::PeriodOfProduction).string_len(255))
                    .col(
                        ColumnDef::new(IssueRequest::ProductionAmount)
                            .decimal_len(15, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IssueRequest::RecipientAccount)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(IssueRequest::Notes).text())
                    .col(ColumnDef::new(IssueRequest::UploadFile).string_len(512))
                    .col(
                        ColumnDef::new(IssueRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(IssueRequest::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_request_device")
                            .from(IssueRequest::Table, IssueRequest::DeviceId)
                            .to(Device::Table, Device::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_request_user")
                            .from(IssueRequest::Table, IssueRequest::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (owner listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_issue_request_user_id")
                    .table(IssueRequest::Table)
                    .col(IssueRequest::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: device_id (per-device listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_issue_request_device_id")
                    .table(IssueRequest::Table)
                    .col(IssueRequest::DeviceId)
                    .to_owned(),
            )
            .await?;

        // Index: status (admin filtering)
        manager
            .create_index(
                Index::create()
                    .name("idx_issue_request_status")
                    .table(IssueRequest::Table)
                    .col(IssueRequest::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IssueRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum IssueRequest {
    Table,
    Id,
    DeviceId,
    UserId,
    Status,
    StartDate,
    EndDate,
    PeriodOfProduction,
    ProductionAmount,
    RecipientAccount,
    Notes,
    UploadFile,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Device {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
