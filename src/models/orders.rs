use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{PharmacyOrderStatus, TestKitOrderStatus};

/// Home test kit catalog entry. Price is whole naira.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeTestKit {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub turnaround_days: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestKitOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kit_id: Uuid,
    pub status: TestKitOrderStatus,
    pub delivery_address: String,
    pub ordered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTestKitOrder {
    pub kit_id: Uuid,
    pub delivery_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pharmacy_name: String,
    pub items: Vec<String>,
    pub prescription_ref: Option<String>,
    pub status: PharmacyOrderStatus,
    pub delivery_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPharmacyOrder {
    pub pharmacy_name: String,
    pub items: Vec<String>,
    #[serde(default)]
    pub prescription_ref: Option<String>,
    pub delivery_address: String,
}
