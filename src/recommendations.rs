//! Life-stage recommendations.
//!
//! Pure lookup over a static hospital table keyed by city. Every branch has
//! a fallback, so selection never fails.

use serde::{Deserialize, Serialize};

use crate::models::enums::LifeStage;

pub const MAX_RECOMMENDATIONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationHospital {
    pub name: String,
    pub specialty: String,
    pub rating: f64,
    pub distance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Hospital,
    Insurance,
    Service,
    Emergency,
    Telemedicine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub title: String,
    pub description: String,
    pub action: String,
    /// Lower sorts first.
    pub priority: u8,
    pub hospital: Option<LocationHospital>,
}

// ═══════════════════════════════════════════
// Static location table
// ═══════════════════════════════════════════

/// (city, [(name, specialty, rating, distance)])
const LOCATION_TABLE: &[(&str, &[(&str, &str, f64, &str)])] = &[
    (
        "Lagos",
        &[
            ("Lagos University Teaching Hospital", "Maternity & Obstetrics", 4.5, "2.3 km"),
            ("Reddington Hospital", "Pediatric Care", 4.7, "3.1 km"),
            ("Lagoon Hospital", "Geriatric & General Medicine", 4.4, "4.8 km"),
        ],
    ),
    (
        "Abuja",
        &[
            ("National Hospital Abuja", "General Medicine", 4.3, "1.8 km"),
            ("Garki Hospital", "Maternity Care", 4.4, "3.5 km"),
            ("Nisa Premier Hospital", "Pediatric & Fertility", 4.6, "5.2 km"),
        ],
    ),
    (
        "Port Harcourt",
        &[
            ("University of Port Harcourt Teaching Hospital", "Maternity & Obstetrics", 4.2, "2.9 km"),
            ("Kelsey Harrison Hospital", "Pediatric Care", 4.1, "4.0 km"),
        ],
    ),
    (
        "Ibadan",
        &[
            ("University College Hospital", "Geriatric & Internal Medicine", 4.5, "2.1 km"),
            ("Adeoyo Maternity Hospital", "Maternity", 4.0, "3.3 km"),
        ],
    ),
    (
        "Kano",
        &[
            ("Aminu Kano Teaching Hospital", "General Medicine", 4.2, "2.6 km"),
            ("Murtala Muhammad Specialist Hospital", "Maternity & Pediatric", 4.0, "3.9 km"),
        ],
    ),
];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when `inner` appears as a run of whole words inside `outer`.
fn contains_words(outer: &[String], inner: &[String]) -> bool {
    !inner.is_empty() && outer.windows(inner.len()).any(|run| run == inner)
}

/// Hospitals near a location. Matching is case-insensitive on whole words in
/// either direction, so "Lagos Island" hits Lagos and "Harcourt" hits Port
/// Harcourt, while fragments like "an" match nothing. Unknown locations get
/// a single synthesized general hospital.
pub fn get_location_hospitals(location: &str) -> Vec<LocationHospital> {
    let needle = words(location);
    let matched = LOCATION_TABLE.iter().find(|(city, _)| {
        let city = words(city);
        contains_words(&needle, &city) || contains_words(&city, &needle)
    });
    if let Some((_, hospitals)) = matched {
        return hospitals
            .iter()
            .map(|(name, specialty, rating, distance)| LocationHospital {
                name: name.to_string(),
                specialty: specialty.to_string(),
                rating: *rating,
                distance: distance.to_string(),
            })
            .collect();
    }

    let name = match location.trim() {
        "" => "General Hospital".to_string(),
        place => format!("General Hospital {place}"),
    };
    vec![LocationHospital {
        name,
        specialty: "General Medicine".into(),
        rating: 4.0,
        distance: "Nearby".into(),
    }]
}

fn specialty_preference(stage: LifeStage) -> Option<&'static str> {
    match stage {
        LifeStage::Pregnant => Some("Maternity"),
        LifeStage::Mother => Some("Pediatric"),
        LifeStage::Elderly => Some("Geriatric"),
        LifeStage::Other => None,
    }
}

/// Best-fit hospital for a stage, falling back to the first entry.
fn pick_hospital(hospitals: &[LocationHospital], stage: LifeStage) -> Option<LocationHospital> {
    specialty_preference(stage)
        .and_then(|wanted| hospitals.iter().find(|h| h.specialty.contains(wanted)))
        .or_else(|| hospitals.first())
        .cloned()
}

fn entry(
    kind: RecommendationType,
    title: &str,
    description: &str,
    action: &str,
    priority: u8,
) -> Recommendation {
    Recommendation {
        kind,
        title: title.into(),
        description: description.into(),
        action: action.into(),
        priority,
        hospital: None,
    }
}

fn stage_recommendations(stage: LifeStage, hospital: Option<LocationHospital>) -> Vec<Recommendation> {
    let hospital_entry = |title: &str, description: &str| Recommendation {
        hospital: hospital.clone(),
        ..entry(RecommendationType::Hospital, title, description, "Book appointment", 1)
    };

    match stage {
        LifeStage::Pregnant => vec![
            hospital_entry(
                "Antenatal care near you",
                &hospital_blurb(&hospital, "for your antenatal visits"),
            ),
            entry(
                RecommendationType::Insurance,
                "Maternity insurance",
                "Cover antenatal visits, delivery and postnatal care.",
                "Compare plans",
                2,
            ),
            entry(
                RecommendationType::Service,
                "Home test kits",
                "Order pregnancy and malaria tests delivered to your door.",
                "Order kit",
                3,
            ),
        ],
        LifeStage::Mother => vec![
            hospital_entry(
                "Pediatric care for your child",
                &hospital_blurb(&hospital, "for immunisations and check-ups"),
            ),
            entry(
                RecommendationType::Insurance,
                "Family health plan",
                "One plan for you and your children.",
                "Compare plans",
                2,
            ),
            entry(
                RecommendationType::Service,
                "Vaccination reminders",
                "Keep your child's immunisation schedule on track.",
                "Set reminders",
                3,
            ),
        ],
        LifeStage::Elderly => vec![
            hospital_entry(
                "Geriatric care",
                &hospital_blurb(&hospital, "for regular check-ups"),
            ),
            entry(
                RecommendationType::Insurance,
                "Senior health plan",
                "Coverage for chronic care and specialist visits.",
                "Compare plans",
                2,
            ),
            entry(
                RecommendationType::Service,
                "Pharmacy delivery",
                "Get repeat prescriptions delivered.",
                "Order medication",
                3,
            ),
        ],
        LifeStage::Other => vec![hospital_entry(
            "Find a hospital",
            &hospital_blurb(&hospital, "for general care"),
        )],
    }
}

fn hospital_blurb(hospital: &Option<LocationHospital>, purpose: &str) -> String {
    match hospital {
        Some(h) => format!("{} ({}, {}) {}.", h.name, h.specialty, h.distance, purpose),
        None => format!("Find a hospital near you {purpose}."),
    }
}

fn common_recommendations() -> Vec<Recommendation> {
    vec![
        entry(
            RecommendationType::Emergency,
            "Emergency services",
            "Save your emergency contacts and the nearest emergency unit.",
            "View emergency info",
            1,
        ),
        entry(
            RecommendationType::Telemedicine,
            "Talk to a doctor online",
            "Video consultations with licensed doctors, any time.",
            "Start consultation",
            4,
        ),
    ]
}

/// Stage entries plus the common entries, sorted by priority and capped at
/// [`MAX_RECOMMENDATIONS`]. The emergency entry has top priority and is never
/// truncated away.
pub fn get_smart_recommendations(stage: LifeStage, location: &str) -> Vec<Recommendation> {
    let hospitals = get_location_hospitals(location);
    let best = pick_hospital(&hospitals, stage);

    let mut recommendations = stage_recommendations(stage, best);
    recommendations.extend(common_recommendations());
    recommendations.sort_by_key(|r| r.priority);
    recommendations.truncate(MAX_RECOMMENDATIONS);

    tracing::debug!(
        life_stage = %stage,
        count = recommendations.len(),
        "Built recommendations"
    );
    recommendations
}
