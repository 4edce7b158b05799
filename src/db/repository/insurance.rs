use chrono::{DateTime, Months, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{fmt_timestamp, parse_date, parse_timestamp, parse_uuid, swap_status, tags_from_json, tags_to_json};
use crate::db::DatabaseError;
use crate::lifecycle::guard_transition;
use crate::models::enums::{PlanType, PurchaseStatus};
use crate::models::{InsurancePlan, InsurancePurchase};

const PLAN_COLUMNS: &str = "id, provider, name, plan_type, monthly_premium, coverage_amount,
     duration_months, features, rating, is_active, created_at";

const PURCHASE_COLUMNS: &str =
    "id, user_id, plan_id, status, start_date, end_date, created_at, updated_at";

type PlanRow = (
    String, String, String, String, i64, i64, u32, String, f64, bool, String,
);

fn read_plan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlanRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn plan_from_row(row: PlanRow) -> Result<InsurancePlan, DatabaseError> {
    let (
        id, provider, name, plan_type, monthly_premium, coverage_amount,
        duration_months, features, rating, is_active, created_at,
    ) = row;
    Ok(InsurancePlan {
        id: parse_uuid(&id)?,
        provider,
        name,
        plan_type: plan_type.parse::<PlanType>()?,
        monthly_premium,
        coverage_amount,
        duration_months,
        features: tags_from_json(&features)?,
        rating,
        is_active,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub fn insert_plan(conn: &Connection, plan: &InsurancePlan) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO insurance_plans ({PLAN_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            plan.id.to_string(),
            plan.provider,
            plan.name,
            plan.plan_type.as_str(),
            plan.monthly_premium,
            plan.coverage_amount,
            plan.duration_months,
            tags_to_json(&plan.features)?,
            plan.rating,
            plan.is_active,
            fmt_timestamp(&plan.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_plan(conn: &Connection, id: &Uuid) -> Result<Option<InsurancePlan>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM insurance_plans WHERE id = ?1"),
            params![id.to_string()],
            read_plan_row,
        )
        .optional()?;
    row.map(plan_from_row).transpose()
}

/// Active plans for `ids`, in the order given. Unknown or retired ids are
/// `NotFound`.
pub fn get_plans(conn: &Connection, ids: &[Uuid]) -> Result<Vec<InsurancePlan>, DatabaseError> {
    ids.iter()
        .map(|id| {
            get_plan(conn, id)?
                .filter(|p| p.is_active)
                .ok_or_else(|| DatabaseError::not_found("insurance plan", id))
        })
        .collect()
}

/// All purchasable plans, cheapest first. Filtering and sorting for the
/// comparison screen happens in [`crate::insurance`].
pub fn list_active_plans(conn: &Connection) -> Result<Vec<InsurancePlan>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLAN_COLUMNS} FROM insurance_plans WHERE is_active = 1
         ORDER BY monthly_premium ASC, name ASC"
    ))?;
    let rows = stmt.query_map([], read_plan_row)?;
    let mut plans = Vec::new();
    for row in rows {
        plans.push(plan_from_row(row?)?);
    }
    Ok(plans)
}

pub fn count_plans(conn: &Connection) -> Result<u32, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM insurance_plans", [], |row| row.get(0))?;
    Ok(count)
}

fn read_purchase_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<[String; 8]> {
    Ok([
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ])
}

fn purchase_from_row(row: [String; 8]) -> Result<InsurancePurchase, DatabaseError> {
    let [id, user_id, plan_id, status, start_date, end_date, created_at, updated_at] = row;
    Ok(InsurancePurchase {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        plan_id: parse_uuid(&plan_id)?,
        status: status.parse::<PurchaseStatus>()?,
        start_date: parse_date(&start_date)?,
        end_date: parse_date(&end_date)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Record a new purchase in `pending`. Coverage runs for the plan's
/// duration starting today; payment confirmation later activates it.
pub fn create_purchase(
    conn: &Connection,
    user_id: &Uuid,
    plan_id: &Uuid,
    now: &DateTime<Utc>,
) -> Result<InsurancePurchase, DatabaseError> {
    let plan = get_plan(conn, plan_id)?
        .filter(|p| p.is_active)
        .ok_or_else(|| DatabaseError::not_found("insurance plan", plan_id))?;

    let start_date = now.date_naive();
    let end_date = start_date
        .checked_add_months(Months::new(plan.duration_months))
        .ok_or_else(|| {
            DatabaseError::ConstraintViolation(format!(
                "plan duration of {} months overflows the calendar",
                plan.duration_months
            ))
        })?;

    let purchase = InsurancePurchase {
        id: Uuid::new_v4(),
        user_id: *user_id,
        plan_id: plan.id,
        status: PurchaseStatus::Pending,
        start_date,
        end_date,
        created_at: *now,
        updated_at: *now,
    };

    conn.execute(
        &format!(
            "INSERT INTO insurance_purchases ({PURCHASE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        params![
            purchase.id.to_string(),
            purchase.user_id.to_string(),
            purchase.plan_id.to_string(),
            purchase.status.as_str(),
            purchase.start_date.to_string(),
            purchase.end_date.to_string(),
            fmt_timestamp(&purchase.created_at),
            fmt_timestamp(&purchase.updated_at),
        ],
    )?;
    Ok(purchase)
}

pub fn get_purchase(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<InsurancePurchase>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PURCHASE_COLUMNS} FROM insurance_purchases WHERE id = ?1"),
            params![id.to_string()],
            read_purchase_row,
        )
        .optional()?;
    row.map(purchase_from_row).transpose()
}

pub fn list_purchases(
    conn: &Connection,
    user_id: &Uuid,
    status: Option<PurchaseStatus>,
) -> Result<Vec<InsurancePurchase>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM insurance_purchases
         WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
         ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(
        params![user_id.to_string(), status.map(|s| s.as_str())],
        read_purchase_row,
    )?;
    let mut purchases = Vec::new();
    for row in rows {
        purchases.push(purchase_from_row(row?)?);
    }
    Ok(purchases)
}

/// Move a purchase to `next`, rejecting transitions the lifecycle forbids.
pub fn update_purchase_status(
    conn: &Connection,
    id: &Uuid,
    next: PurchaseStatus,
    now: &DateTime<Utc>,
) -> Result<InsurancePurchase, DatabaseError> {
    loop {
        let mut purchase =
            get_purchase(conn, id)?.ok_or_else(|| DatabaseError::not_found("insurance purchase", id))?;
        guard_transition(purchase.status, next)?;
        if !swap_status(conn, "insurance_purchases", id, purchase.status.as_str(), next.as_str(), now)? {
            continue;
        }
        tracing::info!(purchase_id = %id, from = %purchase.status, to = %next, "Insurance purchase status changed");
        purchase.status = next;
        purchase.updated_at = *now;
        return Ok(purchase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::lifecycle::LifecycleError;
    use crate::models::PlanInput;
    use chrono::{NaiveDate, TimeZone};

    fn plan(conn: &Connection, name: &str, premium: i64) -> InsurancePlan {
        let plan = InsurancePlan::from_input(
            PlanInput {
                provider: "Hygeia HMO".into(),
                name: name.into(),
                plan_type: PlanType::Maternity,
                monthly_premium: premium,
                coverage_amount: premium * 100,
                duration_months: 12,
                features: vec!["Antenatal care".into(), "Delivery".into()],
                rating: 4.2,
            },
            Utc::now(),
        );
        insert_plan(conn, &plan).unwrap();
        plan
    }

    #[test]
    fn plans_list_cheapest_first() {
        let conn = open_memory_database().unwrap();
        plan(&conn, "Gold", 15_000);
        plan(&conn, "Bronze", 4_500);
        let plans = list_active_plans(&conn).unwrap();
        assert_eq!(plans[0].name, "Bronze");
        assert_eq!(plans[1].features.len(), 2);
    }

    #[test]
    fn get_plans_keeps_request_order() {
        let conn = open_memory_database().unwrap();
        let gold = plan(&conn, "Gold", 15_000);
        let bronze = plan(&conn, "Bronze", 4_500);
        let plans = get_plans(&conn, &[gold.id, bronze.id]).unwrap();
        assert_eq!(plans[0].name, "Gold");

        let err = get_plans(&conn, &[gold.id, Uuid::new_v4()]).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn purchase_starts_pending_with_plan_duration() {
        let conn = open_memory_database().unwrap();
        let p = plan(&conn, "Bronze", 4_500);
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap();
        let purchase = create_purchase(&conn, &Uuid::new_v4(), &p.id, &now).unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Pending);
        assert_eq!(purchase.start_date, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(purchase.end_date, NaiveDate::from_ymd_opt(2027, 1, 31).unwrap());
    }

    #[test]
    fn purchase_of_unknown_plan_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = create_purchase(&conn, &Uuid::new_v4(), &Uuid::new_v4(), &Utc::now()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn list_purchases_filters_by_status() {
        let conn = open_memory_database().unwrap();
        let p = plan(&conn, "Bronze", 4_500);
        let user = Uuid::new_v4();
        let first = create_purchase(&conn, &user, &p.id, &Utc::now()).unwrap();
        create_purchase(&conn, &user, &p.id, &Utc::now()).unwrap();
        update_purchase_status(&conn, &first.id, PurchaseStatus::Active, &Utc::now()).unwrap();

        assert_eq!(list_purchases(&conn, &user, None).unwrap().len(), 2);
        let active = list_purchases(&conn, &user, Some(PurchaseStatus::Active)).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, first.id);
        assert!(list_purchases(&conn, &Uuid::new_v4(), None).unwrap().is_empty());
    }

    #[test]
    fn illegal_status_change_is_not_written() {
        let conn = open_memory_database().unwrap();
        let p = plan(&conn, "Bronze", 4_500);
        let purchase = create_purchase(&conn, &Uuid::new_v4(), &p.id, &Utc::now()).unwrap();

        let err = update_purchase_status(&conn, &purchase.id, PurchaseStatus::Expired, &Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Lifecycle(LifecycleError::IllegalTransition { .. })
        ));
        let stored = get_purchase(&conn, &purchase.id).unwrap().unwrap();
        assert_eq!(stored.status, PurchaseStatus::Pending);
    }
}
