//! Default catalog rows for a fresh database.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{
    count_hospitals, count_plans, count_test_kits, insert_hospital, insert_plan, insert_test_kit,
};
use crate::db::DatabaseError;
use crate::models::enums::PlanType;
use crate::models::{HomeTestKit, Hospital, HospitalInput, InsurancePlan, PlanInput};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub hospitals: usize,
    pub insurance_plans: usize,
    pub test_kits: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.hospitals == 0 && self.insurance_plans == 0 && self.test_kits == 0
    }
}

/// (name, address, state, lga, phone, specialties, facilities, rating, emergency)
type HospitalSeed = (&'static str, &'static str, &'static str, &'static str, &'static str,
    &'static [&'static str], &'static [&'static str], f64, bool);

const HOSPITALS: &[HospitalSeed] = &[
    ("Lagos University Teaching Hospital", "Idi-Araba, Surulere", "Lagos", "Surulere", "08023456701",
        &["Maternity", "Obstetrics", "General Medicine"], &["Laboratory", "Pharmacy", "NICU"], 4.5, true),
    ("Reddington Hospital", "12 Idowu Martins St, Victoria Island", "Lagos", "Eti-Osa", "08023456702",
        &["Pediatrics", "Cardiology"], &["Laboratory", "Radiology"], 4.7, true),
    ("Lagoon Hospital", "8 Bourdillon Rd, Ikoyi", "Lagos", "Eti-Osa", "08023456703",
        &["Geriatrics", "General Medicine"], &["Pharmacy", "Physiotherapy"], 4.4, false),
    ("National Hospital Abuja", "Central Business District", "FCT", "Abuja Municipal", "08023456704",
        &["General Medicine", "Oncology"], &["Laboratory", "ICU", "Pharmacy"], 4.3, true),
    ("Garki Hospital", "Tafawa Balewa Way, Area 11", "FCT", "Abuja Municipal", "08023456705",
        &["Maternity", "Gynaecology"], &["Ultrasound", "Laboratory"], 4.4, true),
    ("University of Port Harcourt Teaching Hospital", "East-West Rd, Alakahia", "Rivers", "Obio-Akpor", "08023456706",
        &["Maternity", "Obstetrics"], &["NICU", "Laboratory"], 4.2, true),
    ("University College Hospital", "Queen Elizabeth Rd, Agodi", "Oyo", "Ibadan North", "08023456707",
        &["Geriatrics", "Internal Medicine"], &["Laboratory", "Radiology", "Pharmacy"], 4.5, true),
    ("Aminu Kano Teaching Hospital", "Zaria Rd", "Kano", "Tarauni", "08023456708",
        &["General Medicine", "Pediatrics"], &["Laboratory", "Pharmacy"], 4.2, true),
];

/// (provider, name, type, monthly premium, coverage, features, rating)
type PlanSeed = (&'static str, &'static str, PlanType, i64, i64, &'static [&'static str], f64);

const PLANS: &[PlanSeed] = &[
    ("Hygeia HMO", "Hygeia Basic", PlanType::Individual, 4_500, 500_000,
        &["Outpatient", "Malaria treatment", "Basic lab tests"], 3.9),
    ("AXA Mansard", "Mama & Baby", PlanType::Maternity, 12_000, 1_500_000,
        &["Antenatal", "Delivery", "Postnatal", "Outpatient"], 4.6),
    ("Reliance HMO", "Family Plus", PlanType::Family, 22_000, 3_000_000,
        &["Outpatient", "Inpatient", "Dental", "Immunisation"], 4.4),
    ("Leadway Health", "Golden Years", PlanType::Senior, 18_000, 2_000_000,
        &["Chronic care", "Specialist visits", "Inpatient"], 4.1),
    ("Avon HMO", "Workplace Care", PlanType::Corporate, 9_500, 1_200_000,
        &["Outpatient", "Inpatient", "Optical"], 4.0),
];

/// (name, description, price, turnaround days)
const TEST_KITS: &[(&str, &str, i64, u32)] = &[
    ("Pregnancy Test", "Early pregnancy hCG test", 1_500, 1),
    ("Malaria Rapid Test", "Detects malaria antigens from a finger prick", 3_500, 1),
    ("Genotype Test", "Haemoglobin genotype from a blood sample", 6_000, 3),
    ("Full Blood Count", "Sample collected at home, results by app", 8_500, 2),
];

/// Insert the default catalog. Each table is seeded only while it is empty,
/// so running this on every start is safe.
pub fn seed_catalog(conn: &mut Connection, now: DateTime<Utc>) -> Result<SeedReport, DatabaseError> {
    let tx = conn.transaction()?;
    let mut report = SeedReport::default();

    if count_hospitals(&tx)? == 0 {
        for (name, address, state, lga, phone, specialties, facilities, rating, emergency) in HOSPITALS {
            let hospital = Hospital::from_input(
                HospitalInput {
                    name: name.to_string(),
                    address: address.to_string(),
                    state: state.to_string(),
                    lga: Some(lga.to_string()),
                    phone: Some(phone.to_string()),
                    specialties: specialties.iter().map(|s| s.to_string()).collect(),
                    facilities: facilities.iter().map(|s| s.to_string()).collect(),
                    rating: *rating,
                    has_emergency: *emergency,
                },
                now,
            );
            insert_hospital(&tx, &hospital)?;
            report.hospitals += 1;
        }
    }

    if count_plans(&tx)? == 0 {
        for (provider, name, plan_type, premium, coverage, features, rating) in PLANS {
            let plan = InsurancePlan::from_input(
                PlanInput {
                    provider: provider.to_string(),
                    name: name.to_string(),
                    plan_type: *plan_type,
                    monthly_premium: *premium,
                    coverage_amount: *coverage,
                    duration_months: 12,
                    features: features.iter().map(|s| s.to_string()).collect(),
                    rating: *rating,
                },
                now,
            );
            insert_plan(&tx, &plan)?;
            report.insurance_plans += 1;
        }
    }

    if count_test_kits(&tx)? == 0 {
        for (name, description, price, turnaround_days) in TEST_KITS {
            insert_test_kit(
                &tx,
                &HomeTestKit {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    price: *price,
                    turnaround_days: *turnaround_days,
                    is_active: true,
                },
            )?;
            report.test_kits += 1;
        }
    }

    tx.commit()?;
    if !report.is_empty() {
        tracing::info!(
            hospitals = report.hospitals,
            insurance_plans = report.insurance_plans,
            test_kits = report.test_kits,
            "Seeded catalog"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{list_active_plans, list_test_kits, search_hospitals};
    use crate::db::sqlite::open_memory_database;
    use crate::models::HospitalQuery;

    #[test]
    fn seeds_empty_database() {
        let mut conn = open_memory_database().unwrap();
        let report = seed_catalog(&mut conn, Utc::now()).unwrap();
        assert_eq!(report.hospitals, HOSPITALS.len());
        assert_eq!(report.insurance_plans, PLANS.len());
        assert_eq!(report.test_kits, TEST_KITS.len());
        assert_eq!(list_active_plans(&conn).unwrap().len(), PLANS.len());
        assert_eq!(list_test_kits(&conn).unwrap().len(), TEST_KITS.len());
    }

    #[test]
    fn reseeding_is_a_no_op() {
        let mut conn = open_memory_database().unwrap();
        seed_catalog(&mut conn, Utc::now()).unwrap();
        let second = seed_catalog(&mut conn, Utc::now()).unwrap();
        assert!(second.is_empty());
        assert_eq!(count_hospitals(&conn).unwrap() as usize, HOSPITALS.len());
    }

    #[test]
    fn seeded_hospitals_are_searchable() {
        let mut conn = open_memory_database().unwrap();
        seed_catalog(&mut conn, Utc::now()).unwrap();
        let query = HospitalQuery {
            state: Some("lagos".into()),
            specialty: Some("Maternity".into()),
            ..HospitalQuery::default()
        };
        let found = search_hospitals(&conn, &query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Lagos University Teaching Hospital");
    }
}
