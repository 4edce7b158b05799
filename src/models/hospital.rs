use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hospital catalog row. `is_active = false` is a soft delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub state: String,
    pub lga: Option<String>,
    pub phone: Option<String>,
    pub specialties: Vec<String>,
    pub facilities: Vec<String>,
    pub rating: f64,
    pub has_emergency: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin form payload for create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalInput {
    pub name: String,
    pub address: String,
    pub state: String,
    pub lga: Option<String>,
    pub phone: Option<String>,
    pub specialties: Vec<String>,
    pub facilities: Vec<String>,
    pub rating: f64,
    pub has_emergency: bool,
}

impl Hospital {
    pub fn from_input(input: HospitalInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            address: input.address.trim().to_string(),
            state: input.state.trim().to_string(),
            lga: input.lga,
            phone: input.phone,
            specialties: input.specialties,
            facilities: input.facilities,
            rating: input.rating.clamp(0.0, 5.0),
            has_emergency: input.has_emergency,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_input(&mut self, input: HospitalInput, now: DateTime<Utc>) {
        self.name = input.name.trim().to_string();
        self.address = input.address.trim().to_string();
        self.state = input.state.trim().to_string();
        self.lga = input.lga;
        self.phone = input.phone;
        self.specialties = input.specialties;
        self.facilities = input.facilities;
        self.rating = input.rating.clamp(0.0, 5.0);
        self.has_emergency = input.has_emergency;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HospitalOrder {
    #[default]
    Rating,
    Name,
}

/// Search filters for the hospital directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalQuery {
    pub state: Option<String>,
    /// Case-insensitive substring match against any specialty tag.
    pub specialty: Option<String>,
    /// Free text matched against name, address or LGA.
    pub search: Option<String>,
    pub emergency_only: bool,
    pub order: HospitalOrder,
    pub offset: u32,
    pub limit: u32,
}

impl Default for HospitalQuery {
    fn default() -> Self {
        Self {
            state: None,
            specialty: None,
            search: None,
            emergency_only: false,
            order: HospitalOrder::Rating,
            offset: 0,
            limit: 20,
        }
    }
}
