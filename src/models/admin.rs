//! Administrative hierarchy types for boundary lookup.

use serde::{Deserialize, Serialize};

use super::{AdminSelection, BoundingBox};

/// Administrative level, following the ADM0..ADM4 numbering of boundary
/// datasets (geoBoundaries, GADM, OCHA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    /// Country (ADM0)
    #[serde(alias = "adm0")]
    Country,
    /// State / province (ADM1)
    #[serde(alias = "state", alias = "adm1")]
    Province,
    /// District (ADM2)
    #[serde(alias = "adm2")]
    District,
    /// City / commune (ADM3)
    #[serde(alias = "adm3")]
    City,
    /// Village (ADM4)
    #[serde(alias = "adm4")]
    Village,
}

impl AdminLevel {
    /// Convert an ADM level number to AdminLevel
    pub fn from_adm_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(AdminLevel::Country),
            1 => Some(AdminLevel::Province),
            2 => Some(AdminLevel::District),
            3 => Some(AdminLevel::City),
            4 => Some(AdminLevel::Village),
            _ => None,
        }
    }

    /// Get the ADM level number
    pub fn to_adm_level(&self) -> u8 {
        match self {
            AdminLevel::Country => 0,
            AdminLevel::Province => 1,
            AdminLevel::District => 2,
            AdminLevel::City => 3,
            AdminLevel::Village => 4,
        }
    }

    /// Get all admin levels in hierarchical order (country first)
    pub fn all() -> &'static [AdminLevel] {
        &[
            AdminLevel::Country,
            AdminLevel::Province,
            AdminLevel::District,
            AdminLevel::City,
            AdminLevel::Village,
        ]
    }

    /// Level directly above this one
    pub fn parent(&self) -> Option<AdminLevel> {
        self.to_adm_level()
            .checked_sub(1)
            .and_then(AdminLevel::from_adm_level)
    }

    /// Get the field name for this level
    pub fn field_name(&self) -> &'static str {
        match self {
            AdminLevel::Country => "country",
            AdminLevel::Province => "province",
            AdminLevel::District => "district",
            AdminLevel::City => "city",
            AdminLevel::Village => "village",
        }
    }

    /// Parse a level from a field name ("province", "state") or "adm1"
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "country" => Some(AdminLevel::Country),
            "province" | "state" => Some(AdminLevel::Province),
            "district" => Some(AdminLevel::District),
            "city" => Some(AdminLevel::City),
            "village" => Some(AdminLevel::Village),
            _ => lower
                .strip_prefix("adm")
                .and_then(|n| n.parse().ok())
                .and_then(AdminLevel::from_adm_level),
        }
    }
}

impl std::fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Single admin level entry: one boundary's identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminEntry {
    pub level: AdminLevel,

    /// Code such as ISO3 for countries or a P-code / GID for lower levels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Code of the containing boundary, when the dataset carries it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl AdminEntry {
    pub fn new(level: AdminLevel) -> Self {
        Self {
            level,
            code: None,
            name: None,
            parent_code: None,
            bbox: None,
        }
    }

    /// Address segment for this entry: the code, else the name
    pub fn label(&self) -> &str {
        self.code
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

/// Resolved admin hierarchy for one location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminHierarchy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<AdminEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<AdminEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<AdminEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<AdminEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub village: Option<AdminEntry>,
}

impl AdminHierarchy {
    /// Set an admin entry for a given level
    pub fn set(&mut self, level: AdminLevel, entry: AdminEntry) {
        match level {
            AdminLevel::Country => self.country = Some(entry),
            AdminLevel::Province => self.province = Some(entry),
            AdminLevel::District => self.district = Some(entry),
            AdminLevel::City => self.city = Some(entry),
            AdminLevel::Village => self.village = Some(entry),
        }
    }

    /// Get an admin entry for a given level
    pub fn get(&self, level: AdminLevel) -> Option<&AdminEntry> {
        match level {
            AdminLevel::Country => self.country.as_ref(),
            AdminLevel::Province => self.province.as_ref(),
            AdminLevel::District => self.district.as_ref(),
            AdminLevel::City => self.city.as_ref(),
            AdminLevel::Village => self.village.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        AdminLevel::all().iter().all(|level| self.get(*level).is_none())
    }

    /// Flatten into the address segments
    pub fn to_selection(&self) -> AdminSelection {
        let label = |level: AdminLevel| {
            self.get(level)
                .map(|e| e.label().to_string())
                .unwrap_or_default()
        };
        AdminSelection {
            country: label(AdminLevel::Country),
            state: label(AdminLevel::Province),
            district: label(AdminLevel::District),
            city: label(AdminLevel::City),
            village: label(AdminLevel::Village),
        }
    }
}
