use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{fmt_timestamp, parse_timestamp, parse_uuid, swap_status, tags_from_json, tags_to_json};
use crate::db::DatabaseError;
use crate::lifecycle::guard_transition;
use crate::models::enums::{PharmacyOrderStatus, TestKitOrderStatus};
use crate::models::{
    HomeTestKit, NewPharmacyOrder, NewTestKitOrder, PharmacyOrder, TestKitOrder,
};

// ──────────────────────────────────────────────
// Home test kits
// ──────────────────────────────────────────────

pub fn insert_test_kit(conn: &Connection, kit: &HomeTestKit) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO home_test_kits (id, name, description, price, turnaround_days, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            kit.id.to_string(),
            kit.name,
            kit.description,
            kit.price,
            kit.turnaround_days,
            kit.is_active,
        ],
    )?;
    Ok(())
}

pub fn list_test_kits(conn: &Connection) -> Result<Vec<HomeTestKit>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, price, turnaround_days, is_active
         FROM home_test_kits WHERE is_active = 1 ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, u32>(4)?,
            row.get::<_, bool>(5)?,
        ))
    })?;
    let mut kits = Vec::new();
    for row in rows {
        let (id, name, description, price, turnaround_days, is_active) = row?;
        kits.push(HomeTestKit {
            id: parse_uuid(&id)?,
            name,
            description,
            price,
            turnaround_days,
            is_active,
        });
    }
    Ok(kits)
}

pub fn count_test_kits(conn: &Connection) -> Result<u32, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM home_test_kits", [], |row| row.get(0))?;
    Ok(count)
}

const KIT_ORDER_COLUMNS: &str = "id, user_id, kit_id, status, delivery_address, ordered_at, updated_at";

fn read_kit_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<[String; 7]> {
    Ok([
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ])
}

fn kit_order_from_row(row: [String; 7]) -> Result<TestKitOrder, DatabaseError> {
    let [id, user_id, kit_id, status, delivery_address, ordered_at, updated_at] = row;
    Ok(TestKitOrder {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        kit_id: parse_uuid(&kit_id)?,
        status: status.parse::<TestKitOrderStatus>()?,
        delivery_address,
        ordered_at: parse_timestamp(&ordered_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub fn create_test_kit_order(
    conn: &Connection,
    user_id: &Uuid,
    request: NewTestKitOrder,
    now: &DateTime<Utc>,
) -> Result<TestKitOrder, DatabaseError> {
    if request.delivery_address.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "delivery address is required".into(),
        ));
    }
    let kit_active: Option<bool> = conn
        .query_row(
            "SELECT is_active FROM home_test_kits WHERE id = ?1",
            params![request.kit_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    if kit_active != Some(true) {
        return Err(DatabaseError::not_found("home test kit", request.kit_id));
    }

    let order = TestKitOrder {
        id: Uuid::new_v4(),
        user_id: *user_id,
        kit_id: request.kit_id,
        status: TestKitOrderStatus::Ordered,
        delivery_address: request.delivery_address.trim().to_string(),
        ordered_at: *now,
        updated_at: *now,
    };
    conn.execute(
        &format!("INSERT INTO test_kit_orders ({KIT_ORDER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            order.id.to_string(),
            order.user_id.to_string(),
            order.kit_id.to_string(),
            order.status.as_str(),
            order.delivery_address,
            fmt_timestamp(&order.ordered_at),
            fmt_timestamp(&order.updated_at),
        ],
    )?;
    Ok(order)
}

pub fn get_test_kit_order(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<TestKitOrder>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {KIT_ORDER_COLUMNS} FROM test_kit_orders WHERE id = ?1"),
            params![id.to_string()],
            read_kit_order,
        )
        .optional()?;
    row.map(kit_order_from_row).transpose()
}

pub fn list_test_kit_orders(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<TestKitOrder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {KIT_ORDER_COLUMNS} FROM test_kit_orders WHERE user_id = ?1 ORDER BY ordered_at DESC"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], read_kit_order)?;
    let mut orders = Vec::new();
    for row in rows {
        orders.push(kit_order_from_row(row?)?);
    }
    Ok(orders)
}

pub fn update_test_kit_order_status(
    conn: &Connection,
    id: &Uuid,
    next: TestKitOrderStatus,
    now: &DateTime<Utc>,
) -> Result<TestKitOrder, DatabaseError> {
    loop {
        let mut order =
            get_test_kit_order(conn, id)?.ok_or_else(|| DatabaseError::not_found("test kit order", id))?;
        guard_transition(order.status, next)?;
        if !swap_status(conn, "test_kit_orders", id, order.status.as_str(), next.as_str(), now)? {
            continue;
        }
        tracing::info!(order_id = %id, from = %order.status, to = %next, "Test kit order status changed");
        order.status = next;
        order.updated_at = *now;
        return Ok(order);
    }
}

// ──────────────────────────────────────────────
// Pharmacy orders
// ──────────────────────────────────────────────

const PHARMACY_COLUMNS: &str = "id, user_id, pharmacy_name, items, prescription_ref, status,
     delivery_address, created_at, updated_at";

type PharmacyRow = (
    String, String, String, String, Option<String>, String, String, String, String,
);

fn read_pharmacy_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PharmacyRow> {
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
    ))
}

fn pharmacy_order_from_row(row: PharmacyRow) -> Result<PharmacyOrder, DatabaseError> {
    let (
        id, user_id, pharmacy_name, items, prescription_ref, status,
        delivery_address, created_at, updated_at,
    ) = row;
    Ok(PharmacyOrder {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        pharmacy_name,
        items: tags_from_json(&items)?,
        prescription_ref,
        status: status.parse::<PharmacyOrderStatus>()?,
        delivery_address,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub fn create_pharmacy_order(
    conn: &Connection,
    user_id: &Uuid,
    request: NewPharmacyOrder,
    now: &DateTime<Utc>,
) -> Result<PharmacyOrder, DatabaseError> {
    let items: Vec<String> = request
        .items
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    if items.is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "pharmacy order needs at least one item".into(),
        ));
    }
    if request.delivery_address.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "delivery address is required".into(),
        ));
    }

    let order = PharmacyOrder {
        id: Uuid::new_v4(),
        user_id: *user_id,
        pharmacy_name: request.pharmacy_name.trim().to_string(),
        items,
        prescription_ref: request.prescription_ref,
        status: PharmacyOrderStatus::Pending,
        delivery_address: request.delivery_address.trim().to_string(),
        created_at: *now,
        updated_at: *now,
    };
    conn.execute(
        &format!(
            "INSERT INTO pharmacy_orders ({PHARMACY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        params![
            order.id.to_string(),
            order.user_id.to_string(),
            order.pharmacy_name,
            tags_to_json(&order.items)?,
            order.prescription_ref,
            order.status.as_str(),
            order.delivery_address,
            fmt_timestamp(&order.created_at),
            fmt_timestamp(&order.updated_at),
        ],
    )?;
    Ok(order)
}

pub fn get_pharmacy_order(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<PharmacyOrder>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PHARMACY_COLUMNS} FROM pharmacy_orders WHERE id = ?1"),
            params![id.to_string()],
            read_pharmacy_row,
        )
        .optional()?;
    row.map(pharmacy_order_from_row).transpose()
}

pub fn list_pharmacy_orders(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<PharmacyOrder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PHARMACY_COLUMNS} FROM pharmacy_orders WHERE user_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], read_pharmacy_row)?;
    let mut orders = Vec::new();
    for row in rows {
        orders.push(pharmacy_order_from_row(row?)?);
    }
    Ok(orders)
}

pub fn update_pharmacy_order_status(
    conn: &Connection,
    id: &Uuid,
    next: PharmacyOrderStatus,
    now: &DateTime<Utc>,
) -> Result<PharmacyOrder, DatabaseError> {
    loop {
        let mut order =
            get_pharmacy_order(conn, id)?.ok_or_else(|| DatabaseError::not_found("pharmacy order", id))?;
        guard_transition(order.status, next)?;
        if !swap_status(conn, "pharmacy_orders", id, order.status.as_str(), next.as_str(), now)? {
            continue;
        }
        tracing::info!(order_id = %id, from = %order.status, to = %next, "Pharmacy order status changed");
        order.status = next;
        order.updated_at = *now;
        return Ok(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn kit(conn: &Connection) -> HomeTestKit {
        let kit = HomeTestKit {
            id: Uuid::new_v4(),
            name: "Malaria Rapid Test".into(),
            description: None,
            price: 3_500,
            turnaround_days: 1,
            is_active: true,
        };
        insert_test_kit(conn, &kit).unwrap();
        kit
    }

    #[test]
    fn kit_order_starts_as_ordered() {
        let conn = open_memory_database().unwrap();
        let k = kit(&conn);
        let user = Uuid::new_v4();
        let order = create_test_kit_order(
            &conn,
            &user,
            NewTestKitOrder { kit_id: k.id, delivery_address: "12 Awolowo Rd".into() },
            &Utc::now(),
        )
        .unwrap();
        assert_eq!(order.status, TestKitOrderStatus::Ordered);
        assert_eq!(list_test_kit_orders(&conn, &user).unwrap(), vec![order]);
    }

    #[test]
    fn kit_order_for_unknown_kit_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = create_test_kit_order(
            &conn,
            &Uuid::new_v4(),
            NewTestKitOrder { kit_id: Uuid::new_v4(), delivery_address: "Somewhere".into() },
            &Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn kit_order_status_follows_lifecycle() {
        let conn = open_memory_database().unwrap();
        let k = kit(&conn);
        let order = create_test_kit_order(
            &conn,
            &Uuid::new_v4(),
            NewTestKitOrder { kit_id: k.id, delivery_address: "12 Awolowo Rd".into() },
            &Utc::now(),
        )
        .unwrap();
        assert!(update_test_kit_order_status(&conn, &order.id, TestKitOrderStatus::Delivered, &Utc::now()).is_err());
        let shipped =
            update_test_kit_order_status(&conn, &order.id, TestKitOrderStatus::Shipped, &Utc::now()).unwrap();
        assert_eq!(shipped.status, TestKitOrderStatus::Shipped);
        let stored = get_test_kit_order(&conn, &order.id).unwrap().unwrap();
        assert_eq!(stored.status, TestKitOrderStatus::Shipped);
    }

    #[test]
    fn pharmacy_order_drops_blank_items() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let order = create_pharmacy_order(
            &conn,
            &user,
            NewPharmacyOrder {
                pharmacy_name: "HealthPlus".into(),
                items: vec!["Folic acid".into(), " ".into(), "Ferrous sulphate".into()],
                prescription_ref: None,
                delivery_address: "Wuse 2, Abuja".into(),
            },
            &Utc::now(),
        )
        .unwrap();
        assert_eq!(order.items, vec!["Folic acid", "Ferrous sulphate"]);
        assert_eq!(get_pharmacy_order(&conn, &order.id).unwrap().unwrap(), order);
    }

    #[test]
    fn empty_pharmacy_order_is_rejected() {
        let conn = open_memory_database().unwrap();
        let err = create_pharmacy_order(
            &conn,
            &Uuid::new_v4(),
            NewPharmacyOrder {
                pharmacy_name: "HealthPlus".into(),
                items: vec![],
                prescription_ref: None,
                delivery_address: "Wuse 2, Abuja".into(),
            },
            &Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn dispatched_pharmacy_order_cannot_be_cancelled() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let order = create_pharmacy_order(
            &conn,
            &user,
            NewPharmacyOrder {
                pharmacy_name: "MedPlus".into(),
                items: vec!["Paracetamol".into()],
                prescription_ref: Some("RX-2231".into()),
                delivery_address: "GRA, Port Harcourt".into(),
            },
            &Utc::now(),
        )
        .unwrap();
        update_pharmacy_order_status(&conn, &order.id, PharmacyOrderStatus::Confirmed, &Utc::now()).unwrap();
        update_pharmacy_order_status(&conn, &order.id, PharmacyOrderStatus::Dispatched, &Utc::now()).unwrap();
        let err = update_pharmacy_order_status(&conn, &order.id, PharmacyOrderStatus::Cancelled, &Utc::now())
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Lifecycle(_)));
        assert_eq!(list_pharmacy_orders(&conn, &user).unwrap()[0].status, PharmacyOrderStatus::Dispatched);
    }

    #[test]
    fn racing_status_writers_cannot_both_win() {
        use crate::db::sqlite::open_database;
        use std::sync::{Arc, Barrier};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.db");
        let conn = open_database(&path).unwrap();
        let k = kit(&conn);

        for _ in 0..50 {
            let order = create_test_kit_order(
                &conn,
                &Uuid::new_v4(),
                NewTestKitOrder { kit_id: k.id, delivery_address: "12 Awolowo Rd".into() },
                &Utc::now(),
            )
            .unwrap();
            update_test_kit_order_status(&conn, &order.id, TestKitOrderStatus::Shipped, &Utc::now()).unwrap();

            let barrier = Arc::new(Barrier::new(2));
            let writers: Vec<_> = [TestKitOrderStatus::Delivered, TestKitOrderStatus::Cancelled]
                .into_iter()
                .map(|next| {
                    let barrier = Arc::clone(&barrier);
                    let path = path.clone();
                    let id = order.id;
                    std::thread::spawn(move || {
                        let conn = open_database(&path).unwrap();
                        barrier.wait();
                        update_test_kit_order_status(&conn, &id, next, &Utc::now())
                    })
                })
                .collect();
            let results: Vec<_> = writers.into_iter().map(|w| w.join().unwrap()).collect();

            let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
            assert_eq!(winners.len(), 1, "exactly one writer may advance a shipped order");
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(DatabaseError::Lifecycle(_)))));
            let stored = get_test_kit_order(&conn, &order.id).unwrap().unwrap();
            assert_eq!(stored.status, winners[0].status);
        }
    }
}
