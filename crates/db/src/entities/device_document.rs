//! Supplementary device document entity (uploaded regulatory files).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Document category for supplementary device files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum DocumentKind {
    /// SF-02 Production Facility Registration
    #[sea_orm(string_value = "SF02")]
    #[serde(rename = "SF02")]
    FacilityRegistration,
    /// SF-02C Ownership Declaration
    #[sea_orm(string_value = "SF02C")]
    #[serde(rename = "SF02C")]
    OwnershipDeclaration,
    /// Metering Evidence
    #[sea_orm(string_value = "METER")]
    #[serde(rename = "METER")]
    MeteringEvidence,
    /// Single Line Diagram
    #[sea_orm(string_value = "DIAGRAM")]
    #[serde(rename = "DIAGRAM")]
    SingleLineDiagram,
    /// Project Photos
    #[sea_orm(string_value = "PHOTOS")]
    #[serde(rename = "PHOTOS")]
    ProjectPhotos,
}

impl DocumentKind {
    /// Stored category code, also used in storage key partitioning.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::FacilityRegistration => "SF02",
            Self::OwnershipDeclaration => "SF02C",
            Self::MeteringEvidence => "METER",
            Self::SingleLineDiagram => "DIAGRAM",
            Self::ProjectPhotos => "PHOTOS",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "device_document")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub device_id: String,

    pub document_type: DocumentKind,

    /// Original file name
    pub name: String,

    /// MIME type
    pub content_type: String,

    /// File size in bytes
    pub size: i64,

    /// Public URL of the stored file
    pub url: String,

    /// Storage key, kept for deletion
    pub storage_key: String,

    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::device::Entity",
        from = "Column::DeviceId",
        to = "super::device::Column::Id",
        on_delete = "Cascade"
    )]
    Device,
}

impl Related<super::device::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Device.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
