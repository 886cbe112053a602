//! User account entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Country associated with a user account.
///
/// Each supported country maps to a regional registry brand and flag glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Country {
    #[sea_orm(string_value = "Uganda")]
    Uganda,
    #[sea_orm(string_value = "Zambia")]
    Zambia,
    #[sea_orm(string_value = "Malawi")]
    Malawi,
    #[sea_orm(string_value = "Namibia")]
    Namibia,
    #[sea_orm(string_value = "Lesotho")]
    Lesotho,
    #[sea_orm(string_value = "Eswatini")]
    Eswatini,
    #[sea_orm(string_value = "Angola")]
    Angola,
    #[sea_orm(string_value = "DRC")]
    #[serde(rename = "DRC")]
    Drc,
}

impl Country {
    /// Stored country value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uganda => "Uganda",
            Self::Zambia => "Zambia",
            Self::Malawi => "Malawi",
            Self::Namibia => "Namibia",
            Self::Lesotho => "Lesotho",
            Self::Eswatini => "Eswatini",
            Self::Angola => "Angola",
            Self::Drc => "DRC",
        }
    }

    /// Registry brand name for this country.
    #[must_use]
    pub const fn brand_name(self) -> &'static str {
        match self {
            Self::Uganda => "Ugarec",
            Self::Zambia => "Zamrec",
            Self::Malawi => "Malrec",
            Self::Namibia => "Namrec",
            Self::Lesotho => "Lesrec",
            Self::Eswatini => "Eswarec",
            Self::Angola => "Angrec",
            Self::Drc => "DRCrec",
        }
    }

    /// Flag glyph for this country.
    #[must_use]
    pub const fn flag_emoji(self) -> &'static str {
        match self {
            Self::Uganda => "\u{1f1fa}\u{1f1ec}",
            Self::Zambia => "\u{1f1ff}\u{1f1f2}",
            Self::Malawi => "\u{1f1f2}\u{1f1fc}",
            Self::Namibia => "\u{1f1f3}\u{1f1e6}",
            Self::Lesotho => "\u{1f1f1}\u{1f1f8}",
            Self::Eswatini => "\u{1f1f8}\u{1f1ff}",
            Self::Angola => "\u{1f1e6}\u{1f1f4}",
            Self::Drc => "\u{1f1e8}\u{1f1e9}",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub username_lower: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Country associated with this account (drives brand and flag)
    #[sea_orm(nullable)]
    pub country: Option<Country>,

    /// Access token
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Can this user access the administrative console?
    #[sea_orm(default_value = false)]
    pub is_staff: bool,

    /// Does this user bypass all permission checks?
    #[sea_orm(default_value = false)]
    pub is_superuser: bool,

    /// Accounts are deactivated instead of deleted
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Brand name shown to this user, with a registry-wide fallback.
    #[must_use]
    pub fn brand_name(&self) -> &'static str {
        self.country.map_or("Africa RECs", Country::brand_name)
    }

    /// Flag glyph shown next to the brand, empty when no country is set.
    #[must_use]
    pub fn flag_emoji(&self) -> &'static str {
        self.country.map_or("", Country::flag_emoji)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::device::Entity")]
    Devices,

    #[sea_orm(has_many = "super::issue_request::Entity")]
    IssueRequests,

    #[sea_orm(has_one = "super::user_profile::Entity")]
    Profile,
}

impl Related<super::device::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Devices.def()
    }
}

impl Related<super::issue_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IssueRequests.def()
    }
}

impl Related<super::user_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_user(country: Option<Country>) -> Model {
        Model {
            id: "user1".to_string(),
            username: "kuda".to_string(),
            username_lower: "kuda".to_string(),
            email: "kuda@example.com".to_string(),
            name: None,
            country,
            token: None,
            is_staff: false,
            is_superuser: false,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn brand_name_maps_all_supported_countries() {
        let expected = [
            (Country::Uganda, "Ugarec"),
            (Country::Zambia, "Zamrec"),
            (Country::Malawi, "Malrec"),
            (Country::Namibia, "Namrec"),
            (Country::Lesotho, "Lesrec"),
            (Country::Eswatini, "Eswarec"),
            (Country::Angola, "Angrec"),
            (Country::Drc, "DRCrec"),
        ];
        for (country, brand) in expected {
            assert_eq!(make_user(Some(country)).brand_name(), brand);
        }
    }

    #[test]
    fn brand_name_falls_back_without_country() {
        assert_eq!(make_user(None).brand_name(), "Africa RECs");
    }

    #[test]
    fn flag_emoji_maps_all_supported_countries() {
        for country in [
            Country::Uganda,
            Country::Zambia,
            Country::Malawi,
            Country::Namibia,
            Country::Lesotho,
            Country::Eswatini,
            Country::Angola,
            Country::Drc,
        ] {
            assert!(!make_user(Some(country)).flag_emoji().is_empty());
        }
        assert_eq!(make_user(Some(Country::Uganda)).flag_emoji(), "🇺🇬");
        assert_eq!(make_user(Some(Country::Drc)).flag_emoji(), "🇨🇩");
    }

    #[test]
    fn flag_emoji_falls_back_without_country() {
        assert_eq!(make_user(None).flag_emoji(), "");
    }
}
