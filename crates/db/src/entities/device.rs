//! Production device entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registration status of a device.
///
/// Any status may move to any other; transitions are not constrained at the
/// storage layer, they only drive notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[derive(Default)]
pub enum DeviceStatus {
    #[sea_orm(string_value = "Draft")]
    #[default]
    Draft,
    #[sea_orm(string_value = "Submitted")]
    Submitted,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

impl DeviceStatus {
    /// Human-readable label, identical to the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

/// Fuel type of a production device.
///
/// String values are the historical registry codes; "Biomas" is spelled as
/// stored in existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum FuelType {
    #[sea_orm(string_value = "Solar")]
    Solar,
    #[sea_orm(string_value = "Wind")]
    Wind,
    #[sea_orm(string_value = "Hydro")]
    Hydro,
    #[sea_orm(string_value = "Biomas")]
    #[serde(rename = "Biomas")]
    Biomass,
    #[sea_orm(string_value = "Geothermal")]
    Geothermal,
    #[sea_orm(string_value = "Municipal Waste")]
    #[serde(rename = "Municipal Waste")]
    MunicipalWaste,
}

impl FuelType {
    /// Technology codes that are valid for this fuel type.
    #[must_use]
    pub const fn allowed_technologies(self) -> &'static [&'static str] {
        match self {
            Self::Solar => &["TC110", "TC120", "TC130", "TC140", "TC150"],
            Self::Wind => &["TC210", "TC220"],
            Self::Hydro => &["TC310", "TC320", "TC330"],
            Self::Biomass => &[
                "TC410", "TC411", "TC421", "TC422", "TC423", "TC424", "TC431", "TC432", "TC441",
                "TC442", "TC482",
            ],
            Self::Geothermal => &["TC510", "TC520", "TC530"],
            Self::MunicipalWaste => &[
                "TC410", "TC411", "TC421", "TC422", "TC423", "TC424", "TC431", "TC432", "TC441",
                "TC442",
            ],
        }
    }

    /// Whether `technology` belongs to this fuel type's allowed set.
    #[must_use]
    pub fn allows_technology(self, technology: &str) -> bool {
        self.allowed_technologies().contains(&technology)
    }
}

/// Evidence type backing reported production volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum VolumeEvidence {
    #[sea_orm(string_value = "Metering")]
    Metering,
    #[sea_orm(string_value = "Invoice")]
    Invoice,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// Public funding disclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[derive(Default)]
pub enum PublicFunding {
    #[sea_orm(string_value = "No")]
    #[default]
    No,
    #[sea_orm(string_value = "Investment")]
    Investment,
    #[sea_orm(string_value = "Production")]
    Production,
}

/// Yes/No disclosure flag stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(3))")]
#[derive(Default)]
pub enum YesNo {
    #[sea_orm(string_value = "Yes")]
    Yes,
    #[sea_orm(string_value = "No")]
    #[default]
    No,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "device")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner user ID
    pub user_id: String,

    pub status: DeviceStatus,

    // General information
    pub device_name: String,

    pub issuer_organisation: String,

    #[sea_orm(nullable)]
    pub default_account_code: Option<String>,

    // Technical information
    pub fuel_type: FuelType,

    /// Technology code, validated against the fuel type's allowed set
    pub technology_type: String,

    /// Installed capacity in MW
    pub capacity: Decimal,

    #[sea_orm(nullable)]
    pub commissioning_date: Option<Date>,

    #[sea_orm(nullable)]
    pub effective_date: Option<Date>,

    // Location information
    #[sea_orm(column_type = "Text")]
    pub address: String,

    pub country: String,

    pub latitude: Decimal,

    pub longitude: Decimal,

    pub postcode: String,

    /// Meter or measurement ID(s)
    #[sea_orm(column_type = "Text", nullable)]
    pub meter_ids: Option<String>,

    /// Owner of the network the device is connected to
    #[sea_orm(nullable)]
    pub network_owner: Option<String>,

    #[sea_orm(nullable)]
    pub connection_voltage: Option<String>,

    /// Circumstances of an indirect grid connection
    #[sea_orm(column_type = "Text", nullable)]
    pub grid_connection_details: Option<String>,

    #[sea_orm(nullable)]
    pub volume_evidence_type: Option<VolumeEvidence>,

    #[sea_orm(nullable)]
    pub volume_evidence_other: Option<String>,

    // Registration and certification
    /// Carbon offset or energy tracking scheme registration ID
    #[sea_orm(nullable)]
    pub carbon_offset_registration: Option<String>,

    #[sea_orm(nullable)]
    pub labelling_scheme: Option<String>,

    pub public_funding: PublicFunding,

    #[sea_orm(nullable)]
    pub funding_end_date: Option<Date>,

    // Business details
    pub onsite_consumer: YesNo,

    #[sea_orm(column_type = "Text", nullable)]
    pub onsite_consumer_details: Option<String>,

    pub auxiliary_energy: YesNo,

    #[sea_orm(column_type = "Text", nullable)]
    pub auxiliary_energy_details: Option<String>,

    /// How the site can import electricity other than through the meter(s)
    #[sea_orm(column_type = "Text", nullable)]
    pub electricity_import_details: Option<String>,

    // Regulatory document slots (stored URLs)
    #[sea_orm(nullable)]
    pub production_facility_registration: Option<String>,

    #[sea_orm(nullable)]
    pub declaration_of_ownership: Option<String>,

    #[sea_orm(nullable)]
    pub metering_evidence: Option<String>,

    #[sea_orm(nullable)]
    pub single_line_diagram: Option<String>,

    #[sea_orm(nullable)]
    pub project_photos: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub additional_notes: Option<String>,

    /// Filled by reviewers when the device is rejected
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::device_document::Entity")]
    Documents,

    #[sea_orm(has_many = "super::issue_request::Entity")]
    IssueRequests,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::device_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::issue_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IssueRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solar_allows_only_solar_codes() {
        assert!(FuelType::Solar.allows_technology("TC110"));
        assert!(FuelType::Solar.allows_technology("TC150"));
        assert!(!FuelType::Solar.allows_technology("TC210"));
    }

    #[test]
    fn biomass_and_municipal_waste_share_codes() {
        assert!(FuelType::Biomass.allows_technology("TC441"));
        assert!(FuelType::MunicipalWaste.allows_technology("TC441"));
        // TC482 is biomass-only
        assert!(FuelType::Biomass.allows_technology("TC482"));
        assert!(!FuelType::MunicipalWaste.allows_technology("TC482"));
    }

    #[test]
    fn unknown_code_is_rejected_for_every_fuel() {
        for fuel in [
            FuelType::Solar,
            FuelType::Wind,
            FuelType::Hydro,
            FuelType::Biomass,
            FuelType::Geothermal,
            FuelType::MunicipalWaste,
        ] {
            assert!(!fuel.allows_technology("TC999"));
        }
    }
}
