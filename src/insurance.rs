//! Insurance plan filtering, sorting and side-by-side comparison.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::PlanType;
use crate::models::InsurancePlan;

pub const MIN_COMPARE: usize = 2;
pub const MAX_COMPARE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComparisonError {
    #[error("Select two or three plans to compare (got {0})")]
    WrongCount(usize),
    #[error("Plan {0} was selected twice")]
    Duplicate(Uuid),
}

/// Catalog filters. Every criterion is optional; features must all be present
/// (case-insensitive).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanFilter {
    pub max_premium: Option<i64>,
    pub min_coverage: Option<i64>,
    pub plan_type: Option<PlanType>,
    pub provider: Option<String>,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSort {
    #[default]
    PremiumAsc,
    PremiumDesc,
    CoverageDesc,
    RatingDesc,
}

impl PlanFilter {
    pub fn matches(&self, plan: &InsurancePlan) -> bool {
        if self.max_premium.is_some_and(|max| plan.monthly_premium > max) {
            return false;
        }
        if self.min_coverage.is_some_and(|min| plan.coverage_amount < min) {
            return false;
        }
        if self.plan_type.is_some_and(|t| plan.plan_type != t) {
            return false;
        }
        if let Some(provider) = self.provider.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            if !plan.provider.to_lowercase().contains(&provider.to_lowercase()) {
                return false;
            }
        }
        self.features.iter().all(|wanted| has_feature(plan, wanted))
    }
}

fn has_feature(plan: &InsurancePlan, wanted: &str) -> bool {
    let wanted = wanted.trim();
    wanted.is_empty() || plan.features.iter().any(|f| f.eq_ignore_ascii_case(wanted))
}

pub fn filter_plans(plans: Vec<InsurancePlan>, filter: &PlanFilter) -> Vec<InsurancePlan> {
    plans.into_iter().filter(|p| filter.matches(p)).collect()
}

/// Stable sort; ties fall back to plan name so listings are deterministic.
pub fn sort_plans(plans: &mut [InsurancePlan], sort: PlanSort) {
    plans.sort_by(|a, b| {
        let primary = match sort {
            PlanSort::PremiumAsc => a.monthly_premium.cmp(&b.monthly_premium),
            PlanSort::PremiumDesc => b.monthly_premium.cmp(&a.monthly_premium),
            PlanSort::CoverageDesc => b.coverage_amount.cmp(&a.coverage_amount),
            PlanSort::RatingDesc => b.rating.total_cmp(&a.rating),
        };
        primary.then_with(|| a.name.cmp(&b.name))
    });
}

// ═══════════════════════════════════════════
// Comparison
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub feature: String,
    /// One flag per compared plan, in plan order.
    pub included: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanComparison {
    pub plans: Vec<InsurancePlan>,
    pub features: Vec<FeatureRow>,
    pub cheapest: Uuid,
    pub highest_coverage: Uuid,
    pub best_rated: Uuid,
}

/// Compare two or three plans. Features are the union across plans,
/// alphabetised.
pub fn compare_plans(plans: Vec<InsurancePlan>) -> Result<PlanComparison, ComparisonError> {
    if !(MIN_COMPARE..=MAX_COMPARE).contains(&plans.len()) {
        return Err(ComparisonError::WrongCount(plans.len()));
    }
    let mut seen = BTreeSet::new();
    for plan in &plans {
        if !seen.insert(plan.id) {
            return Err(ComparisonError::Duplicate(plan.id));
        }
    }

    let all_features: BTreeSet<&str> = plans
        .iter()
        .flat_map(|p| p.features.iter().map(String::as_str))
        .collect();
    let features = all_features
        .into_iter()
        .map(|feature| FeatureRow {
            feature: feature.to_string(),
            included: plans.iter().map(|p| has_feature(p, feature)).collect(),
        })
        .collect();

    // Non-empty by the count check above.
    let pick = |better: fn(&InsurancePlan, &InsurancePlan) -> bool| {
        plans
            .iter()
            .skip(1)
            .fold(&plans[0], |best, p| if better(p, best) { p } else { best })
            .id
    };
    let cheapest = pick(|p, best| p.monthly_premium < best.monthly_premium);
    let highest_coverage = pick(|p, best| p.coverage_amount > best.coverage_amount);
    let best_rated = pick(|p, best| p.rating > best.rating);

    Ok(PlanComparison {
        plans,
        features,
        cheapest,
        highest_coverage,
        best_rated,
    })
}
