//! Profile completion scoring and reminders.
//!
//! Fields are grouped into six categories. A field is missing when it is
//! absent, blank, or an empty list. Overall progress is the rounded share of
//! present fields across every counted category; the pregnancy category only
//! counts while the profile is flagged pregnant.

use serde::{Deserialize, Serialize};

use crate::models::Profile;

// ═══════════════════════════════════════════
// Categories
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionCategory {
    BasicInfo,
    HealthData,
    EmergencyContact,
    PregnancyInfo,
    MedicalHistory,
    Insurance,
}

/// Declaration order. Scoring and reminders both walk categories in this order.
pub const CATEGORIES: &[CompletionCategory] = &[
    CompletionCategory::BasicInfo,
    CompletionCategory::HealthData,
    CompletionCategory::EmergencyContact,
    CompletionCategory::PregnancyInfo,
    CompletionCategory::MedicalHistory,
    CompletionCategory::Insurance,
];

/// Ordering is High < Medium < Low so an ascending sort puts urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPriority {
    High,
    Medium,
    Low,
}

impl CompletionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BasicInfo => "basic_info",
            Self::HealthData => "health_data",
            Self::EmergencyContact => "emergency_contact",
            Self::PregnancyInfo => "pregnancy_info",
            Self::MedicalHistory => "medical_history",
            Self::Insurance => "insurance",
        }
    }

    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::BasicInfo => &[
                "full_name",
                "phone_number",
                "date_of_birth",
                "gender",
                "state",
                "lga",
            ],
            Self::HealthData => &["blood_group", "genotype"],
            Self::EmergencyContact => &["emergency_contact_name", "emergency_contact_phone"],
            Self::PregnancyInfo => &["due_date"],
            Self::MedicalHistory => &["allergies", "chronic_conditions"],
            Self::Insurance => &["insurance_provider", "insurance_number"],
        }
    }

    pub fn priority(self) -> ReminderPriority {
        match self {
            Self::BasicInfo | Self::EmergencyContact | Self::PregnancyInfo => ReminderPriority::High,
            Self::HealthData | Self::MedicalHistory => ReminderPriority::Medium,
            Self::Insurance => ReminderPriority::Low,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::BasicInfo => "Complete your basic information",
            Self::HealthData => "Add your health data",
            Self::EmergencyContact => "Add an emergency contact",
            Self::PregnancyInfo => "Add your pregnancy details",
            Self::MedicalHistory => "Record your medical history",
            Self::Insurance => "Add your insurance details",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::BasicInfo => "Your name, phone and location help hospitals reach you.",
            Self::HealthData => "Blood group and genotype are vital in an emergency.",
            Self::EmergencyContact => "Tell us who to call if something goes wrong.",
            Self::PregnancyInfo => "Your due date lets us tailor antenatal reminders.",
            Self::MedicalHistory => "Allergies and chronic conditions keep your care safe.",
            Self::Insurance => "Link your plan to speed up hospital check-in.",
        }
    }

    /// Pregnancy info only applies to pregnant users.
    pub fn applies_to(self, profile: &Profile) -> bool {
        self != Self::PregnancyInfo || profile.is_pregnant
    }
}

fn text_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn list_present(values: &[String]) -> bool {
    values.iter().any(|v| !v.trim().is_empty())
}

/// Whether the named profile field counts as filled in.
pub fn field_is_present(profile: &Profile, field: &str) -> bool {
    match field {
        "full_name" => text_present(&profile.full_name),
        "phone_number" => text_present(&profile.phone_number),
        "date_of_birth" => profile.date_of_birth.is_some(),
        "gender" => profile.gender.is_some(),
        "state" => text_present(&profile.state),
        "lga" => text_present(&profile.lga),
        "blood_group" => text_present(&profile.blood_group),
        "genotype" => text_present(&profile.genotype),
        "emergency_contact_name" => text_present(&profile.emergency_contact_name),
        "emergency_contact_phone" => text_present(&profile.emergency_contact_phone),
        "due_date" => profile.due_date.is_some(),
        "allergies" => list_present(&profile.allergies),
        "chronic_conditions" => list_present(&profile.chronic_conditions),
        "insurance_provider" => text_present(&profile.insurance_provider),
        "insurance_number" => text_present(&profile.insurance_number),
        _ => false,
    }
}

// ═══════════════════════════════════════════
// Result types
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCompletion {
    pub category: CompletionCategory,
    pub completed: bool,
    pub missing: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub overall_progress: u8,
    pub completed_fields: usize,
    pub total_fields: usize,
    /// Counted categories in declaration order.
    pub categories: Vec<CategoryCompletion>,
}

impl CompletionResult {
    pub fn category(&self, category: CompletionCategory) -> Option<&CategoryCompletion> {
        self.categories.iter().find(|c| c.category == category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReminder {
    pub category: CompletionCategory,
    pub priority: ReminderPriority,
    pub title: String,
    pub message: String,
    pub missing_fields: Vec<String>,
}

// ═══════════════════════════════════════════
// Scoring
// ═══════════════════════════════════════════

/// Score a profile. A user without a stored profile scores as an empty,
/// non-pregnant profile: zero progress with every counted field missing.
pub fn calculate_completion(profile: Option<&Profile>) -> CompletionResult {
    let empty = Profile::default();
    let profile = profile.unwrap_or(&empty);

    let mut completed_fields = 0;
    let mut total_fields = 0;
    let mut categories = Vec::with_capacity(CATEGORIES.len());

    for &category in CATEGORIES {
        if !category.applies_to(profile) {
            continue;
        }
        let fields = category.fields();
        let missing: Vec<String> = fields
            .iter()
            .filter(|f| !field_is_present(profile, f))
            .map(|f| f.to_string())
            .collect();

        total_fields += fields.len();
        completed_fields += fields.len() - missing.len();
        categories.push(CategoryCompletion {
            category,
            completed: missing.is_empty(),
            missing,
            total: fields.len(),
        });
    }

    let overall_progress = if total_fields == 0 {
        0
    } else {
        ((completed_fields as f64 * 100.0) / total_fields as f64).round() as u8
    };

    CompletionResult {
        overall_progress,
        completed_fields,
        total_fields,
        categories,
    }
}

/// One reminder per incomplete category, most urgent first. Categories of
/// equal priority keep declaration order.
pub fn profile_reminders(result: &CompletionResult) -> Vec<ProfileReminder> {
    let mut reminders: Vec<ProfileReminder> = result
        .categories
        .iter()
        .filter(|c| !c.completed)
        .map(|c| ProfileReminder {
            category: c.category,
            priority: c.category.priority(),
            title: c.category.title().to_string(),
            message: c.category.message().to_string(),
            missing_fields: c.missing.clone(),
        })
        .collect();
    reminders.sort_by_key(|r| r.priority);
    reminders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Gender;
    use chrono::NaiveDate;

    fn full_profile() -> Profile {
        Profile {
            full_name: Some("Amaka Obi".into()),
            phone_number: Some("08031234567".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1994, 6, 2),
            gender: Some(Gender::Female),
            state: Some("Lagos".into()),
            lga: Some("Ikeja".into()),
            blood_group: Some("O+".into()),
            genotype: Some("AA".into()),
            allergies: vec!["Penicillin".into()],
            chronic_conditions: vec!["Asthma".into()],
            emergency_contact_name: Some("Chidi Obi".into()),
            emergency_contact_phone: Some("08039876543".into()),
            insurance_provider: Some("Hygeia HMO".into()),
            insurance_number: Some("HYG-0042".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn empty_profile_scores_zero() {
        let result = calculate_completion(Some(&Profile::default()));
        assert_eq!(result.overall_progress, 0);
        assert!(result.categories.iter().all(|c| !c.completed));
        assert!(result.category(CompletionCategory::PregnancyInfo).is_none());
    }

    #[test]
    fn missing_profile_scores_like_empty() {
        let result = calculate_completion(None);
        assert_eq!(result, calculate_completion(Some(&Profile::default())));
        assert_eq!(result.total_fields, 14);
    }

    #[test]
    fn full_profile_scores_hundred() {
        let result = calculate_completion(Some(&full_profile()));
        assert_eq!(result.overall_progress, 100);
        assert!(profile_reminders(&result).is_empty());
    }

    #[test]
    fn pregnancy_adds_due_date_without_touching_other_categories() {
        let mut profile = full_profile();
        let before = calculate_completion(Some(&profile));
        profile.is_pregnant = true;
        let after = calculate_completion(Some(&profile));

        assert_eq!(after.total_fields, before.total_fields + 1);
        for category in &before.categories {
            assert_eq!(after.category(category.category), Some(category));
        }
        let pregnancy = after.category(CompletionCategory::PregnancyInfo).unwrap();
        assert_eq!(pregnancy.missing, vec!["due_date"]);
        assert_eq!(after.overall_progress, 93);
    }

    #[test]
    fn blank_strings_and_blank_lists_count_as_missing() {
        let mut profile = full_profile();
        profile.full_name = Some("   ".into());
        profile.allergies = vec![" ".into()];
        let result = calculate_completion(Some(&profile));
        assert_eq!(
            result.category(CompletionCategory::BasicInfo).unwrap().missing,
            vec!["full_name"]
        );
        assert_eq!(
            result.category(CompletionCategory::MedicalHistory).unwrap().missing,
            vec!["allergies"]
        );
    }

    #[test]
    fn one_reminder_per_incomplete_category_sorted_by_priority() {
        let result = calculate_completion(None);
        let reminders = profile_reminders(&result);
        assert_eq!(reminders.len(), result.categories.len());

        let order: Vec<_> = reminders.iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![
                CompletionCategory::BasicInfo,
                CompletionCategory::EmergencyContact,
                CompletionCategory::HealthData,
                CompletionCategory::MedicalHistory,
                CompletionCategory::Insurance,
            ]
        );
    }

    #[test]
    fn partially_filled_pregnant_profile() {
        let profile = Profile {
            full_name: Some("A".into()),
            phone_number: Some("0800000000".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
            gender: Some(Gender::Female),
            state: Some("Lagos".into()),
            lga: Some("Surulere".into()),
            blood_group: None,
            emergency_contact_name: None,
            is_pregnant: true,
            due_date: None,
            allergies: vec![],
            insurance_provider: None,
            ..Profile::default()
        };
        let result = calculate_completion(Some(&profile));

        let health = result.category(CompletionCategory::HealthData).unwrap();
        assert!(!health.completed);
        assert_eq!(health.missing, vec!["blood_group", "genotype"]);

        let pregnancy = result.category(CompletionCategory::PregnancyInfo).unwrap();
        assert!(!pregnancy.completed);
        assert_eq!(pregnancy.missing, vec!["due_date"]);

        assert!(!result.category(CompletionCategory::EmergencyContact).unwrap().completed);
        assert!(result.category(CompletionCategory::BasicInfo).unwrap().completed);

        let reminders = profile_reminders(&result);
        assert_eq!(reminders[0].category, CompletionCategory::EmergencyContact);
        assert_eq!(reminders[1].category, CompletionCategory::PregnancyInfo);
    }
}
