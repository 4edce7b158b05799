use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{PlanType, PurchaseStatus};

/// Insurance plan catalog row. Amounts are whole naira.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurancePlan {
    pub id: Uuid,
    pub provider: String,
    pub name: String,
    pub plan_type: PlanType,
    pub monthly_premium: i64,
    pub coverage_amount: i64,
    pub duration_months: u32,
    pub features: Vec<String>,
    pub rating: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInput {
    pub provider: String,
    pub name: String,
    pub plan_type: PlanType,
    pub monthly_premium: i64,
    pub coverage_amount: i64,
    #[serde(default = "default_duration")]
    pub duration_months: u32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub rating: f64,
}

fn default_duration() -> u32 {
    12
}

impl InsurancePlan {
    pub fn from_input(input: PlanInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: input.provider.trim().to_string(),
            name: input.name.trim().to_string(),
            plan_type: input.plan_type,
            monthly_premium: input.monthly_premium,
            coverage_amount: input.coverage_amount,
            duration_months: input.duration_months.max(1),
            features: input.features,
            rating: input.rating.clamp(0.0, 5.0),
            is_active: true,
            created_at: now,
        }
    }
}

/// Links a user to a plan for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurancePurchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: PurchaseStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
