//! Create device document table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeviceDocument::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeviceDocument::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeviceDocument::DeviceId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceDocument::DocumentType)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceDocument::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceDocument::ContentType)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceDocument::Size)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeviceDocument::Url).string_len(512).not_null())
                    .col(
                        ColumnDef::new(DeviceDocument::StorageKey)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceDocument::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_device_document_device")
                            .from(DeviceDocument::Table, DeviceDocument::DeviceId)
                            .to(Device::Table, Device::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: device_id (per-device document listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_device_document_device_id")
                    .table(DeviceDocument::Table)
                    .col(DeviceDocument::DeviceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeviceDocument::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DeviceDocument {
    Table,
    Id,
    DeviceId,
    DocumentType,
    Name,
    ContentType,
    Size,
    Url,
    StorageKey,
    UploadedAt,
}

#[derive(Iden)]
enum Device {
    Table,
    Id,
}
