//! Create device table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Device::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Device::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Device::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Device::Status)
                            .string_len(20)
                            .not_null()
                            .default("Draft"),
                    )
                    .col(ColumnDef::new(Device::DeviceName).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Device::IssuerOrganisation)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Device::DefaultAccountCode).string_len(255))
                    .col(ColumnDef::new(Device::FuelType).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Device::TechnologyType)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Device::Capacity)
                            .decimal_len(10, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Device::CommissioningDate).date())
                    .col(ColumnDef::new(Device::EffectiveDate).date())
                    .col(ColumnDef::new(Device::Address).text().not_null())
                    .col(ColumnDef::new(Device::Country).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Device::Latitude)
                            .decimal_len(9, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Device::Longitude)
                            .decimal_len(9, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Device::Postcode)
                            .string_len(20)
                            .not_null()
                            .default("000000"),
                    )
                    .col(ColumnDef::new(Device::MeterIds).text())
                    .col(ColumnDef::new(Device::NetworkOwner).string_len(255))
                    .col(ColumnDef::new(Device::ConnectionVoltage).string_len(50))
                    .col(ColumnDef::new(Device::GridConnectionDetails).text())
                    .col(ColumnDef::new(Device::VolumeEvidenceType).string_len(20))
                    .col(ColumnDef::new(Device::VolumeEvidenceOther).string_len(255))
                    .col(ColumnDef::new(Device::CarbonOffsetRegistration).string_len(255))
                    .col(ColumnDef::new(Device::LabellingScheme).string_len(255))
                    .col(
                        ColumnDef::new(Device::PublicFunding)
                            .string_len(20)
                            .not_null()
                            .default("No"),
                    )
                    .col(ColumnDef::new(Device::FundingEndDate).date())
                    .col(
                        ColumnDef::new(Device::OnsiteConsumer)
                            .string_len(3)
                            .not_null()
                            .default("No"),
                    )
                    .col(ColumnDef::new(Device::OnsiteConsumerDetails).text())
                    .col(
                        ColumnDef::new(Device::AuxiliaryEnergy)
                            .string_len(3)
                            .not_null()
                            .default("No"),
                    )
                    .col(ColumnDef::new(Device::AuxiliaryEnergyDetails).text())
                    .col(ColumnDef::new(Device::ElectricityImportDetails).text())
                    .col(ColumnDef::new(Device::ProductionFacilityRegistration).string_len(512))
                    .col(ColumnDef::new(Device::DeclarationOfOwnership).string_len(512))
                    .col(ColumnDef::new(Device::MeteringEvidence).string_len(512))
                    .col(ColumnDef::new(Device::SingleLineDiagram).string_len(512))
                    .col(ColumnDef::new(Device::ProjectPhotos).string_len(512))
                    .col(ColumnDef::new(Device::AdditionalNotes).text())
                    .col(ColumnDef::new(Device::RejectionReason).text())
                    .col(
                        ColumnDef::new(Device::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Device::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_device_user")
                            .from(Device::Table, Device::UserId)
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
                    .name("idx_device_user_id")
                    .table(Device::Table)
                    .col(Device::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: status (admin filtering)
        manager
            .create_index(
                Index::create()
                    .name("idx_device_status")
                    .table(Device::Table)
                    .col(Device::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Device::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Device {
    Table,
    Id,
    UserId,
    Status,
    DeviceName,
    IssuerOrganisation,
    DefaultAccountCode,
    FuelType,
    TechnologyType,
    Capacity,
    CommissioningDate,
    EffectiveDate,
    Address,
    Country,
    Latitude,
    Longitude,
    Postcode,
    MeterIds,
    NetworkOwner,
    ConnectionVoltage,
    GridConnectionDetails,
    VolumeEvidenceType,
    VolumeEvidenceOther,
    CarbonOffsetRegistration,
    LabellingScheme,
    PublicFunding,
    FundingEndDate,
    OnsiteConsumer,
    OnsiteConsumerDetails,
    AuxiliaryEnergy,
    AuxiliaryEnergyDetails,
    ElectricityImportDetails,
    ProductionFacilityRegistration,
    DeclarationOfOwnership,
    MeteringEvidence,
    SingleLineDiagram,
    ProjectPhotos,
    AdditionalNotes,
    RejectionReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
