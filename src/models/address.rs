//! Admin selection input and the generated address.

use serde::{Deserialize, Serialize};

/// Administrative identifiers picked by the caller.
///
/// Values are used verbatim as address segments; nothing is validated and a
/// missing field is an empty segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSelection {
    pub country: String,
    pub state: String,
    /// Carried for display; not part of the address string
    #[serde(skip_serializing_if = "String::is_empty")]
    pub district: String,
    pub city: String,
    pub village: String,
}

impl AdminSelection {
    pub fn new(country: &str, state: &str, city: &str, village: &str) -> Self {
        Self {
            country: country.to_string(),
            state: state.to_string(),
            district: String::new(),
            city: city.to_string(),
            village: village.to_string(),
        }
    }

    /// Overwrite fields with the non-empty fields of `other`
    pub fn overlay(&mut self, other: &AdminSelection) {
        let pairs = [
            (&mut self.country, &other.country),
            (&mut self.state, &other.state),
            (&mut self.district, &other.district),
            (&mut self.city, &other.city),
            (&mut self.village, &other.village),
        ];
        for (field, value) in pairs {
            if !value.is_empty() {
                field.clone_from(value);
            }
        }
    }
}

/// Generated address: `{country}-{state}-{city}-{village}-{blockNo}.{buildingNo}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResult {
    pub addr: String,
    /// 1..=100000
    pub block_no: u32,
    /// 1..=1000
    pub building_no: u32,
}

impl AddressResult {
    pub fn new(admin: &AdminSelection, block_no: u32, building_no: u32) -> Self {
        let addr = format!(
            "{}-{}-{}-{}-{}.{}",
            admin.country, admin.state, admin.city, admin.village, block_no, building_no
        );
        Self {
            addr,
            block_no,
            building_no,
        }
    }
}

impl std::fmt::Display for AddressResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.addr)
    }
}
