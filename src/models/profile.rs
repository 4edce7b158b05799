use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Gender, LifeStage};

const BLOOD_GROUPS: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
const GENOTYPES: &[&str] = &["AA", "AS", "AC", "SS", "SC", "CC"];

/// One health profile per user. Every field is independently optional;
/// completion scoring decides what counts as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub genotype: Option<String>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub is_pregnant: bool,
    pub due_date: Option<NaiveDate>,
    pub life_stage: Option<LifeStage>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is not a valid phone number: {value}")]
    InvalidPhone { field: &'static str, value: String },
    #[error("Unknown blood group: {0}")]
    InvalidBloodGroup(String),
    #[error("Unknown genotype: {0}")]
    InvalidGenotype(String),
    #[error("Due date can only be set on a pregnancy profile")]
    DueDateWithoutPregnancy,
    #[error("{0} cannot be blank")]
    Blank(&'static str),
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        Regex::new(r"^\+?\d{7,15}$").expect("phone pattern is valid")
    })
}

/// 7 to 15 digits with an optional leading `+`. Spaces, dashes and
/// parentheses are ignored, so `0803 123 4567`, `+234 (803) 123-4567` and
/// short landlines all pass.
pub fn is_valid_phone(raw: &str) -> bool {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    phone_pattern().is_match(&compact)
}

fn trim_in_place(value: &mut Option<String>) {
    if let Some(v) = value {
        let trimmed = v.trim();
        if trimmed.len() != v.len() {
            *v = trimmed.to_string();
        }
    }
}

impl Profile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Pregnancy overrides the stored stage; everything else defaults to `Other`.
    pub fn effective_life_stage(&self) -> LifeStage {
        if self.is_pregnant {
            LifeStage::Pregnant
        } else {
            self.life_stage.unwrap_or(LifeStage::Other)
        }
    }

    /// Trim the coded fields so stored values match the lookup tables.
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.blood_group);
        trim_in_place(&mut self.genotype);
    }

    /// Blank optional fields count as missing and are never rejected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.full_name {
            if name.trim().is_empty() {
                return Err(ValidationError::Blank("full_name"));
            }
        }
        for (field, value) in [
            ("phone_number", &self.phone_number),
            ("emergency_contact_phone", &self.emergency_contact_phone),
        ] {
            if let Some(v) = value {
                if !v.trim().is_empty() && !is_valid_phone(v) {
                    return Err(ValidationError::InvalidPhone {
                        field,
                        value: v.clone(),
                    });
                }
            }
        }
        if let Some(bg) = self.blood_group.as_deref().map(str::trim) {
            if !bg.is_empty() && !BLOOD_GROUPS.contains(&bg) {
                return Err(ValidationError::InvalidBloodGroup(bg.to_string()));
            }
        }
        if let Some(gt) = self.genotype.as_deref().map(str::trim) {
            if !gt.is_empty() && !GENOTYPES.contains(&gt) {
                return Err(ValidationError::InvalidGenotype(gt.to_string()));
            }
        }
        if self.due_date.is_some() && !self.is_pregnant {
            return Err(ValidationError::DueDateWithoutPregnancy);
        }
        Ok(())
    }
}
