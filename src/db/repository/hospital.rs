use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use super::{fmt_timestamp, parse_timestamp, parse_uuid, tags_from_json, tags_to_json};
use crate::db::DatabaseError;
use crate::models::{Hospital, HospitalOrder, HospitalQuery};

const HOSPITAL_COLUMNS: &str = "id, name, address, state, lga, phone, specialties, facilities,
     rating, has_emergency, is_active, created_at, updated_at";

/// Hard ceiling on a single page of results.
const MAX_PAGE_SIZE: u32 = 100;

struct HospitalRow {
    id: String,
    name: String,
    address: String,
    state: String,
    lga: Option<String>,
    phone: Option<String>,
    specialties: String,
    facilities: String,
    rating: f64,
    has_emergency: bool,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl HospitalRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            address: row.get(2)?,
            state: row.get(3)?,
            lga: row.get(4)?,
            phone: row.get(5)?,
            specialties: row.get(6)?,
            facilities: row.get(7)?,
            rating: row.get(8)?,
            has_emergency: row.get(9)?,
            is_active: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_hospital(self) -> Result<Hospital, DatabaseError> {
        Ok(Hospital {
            id: parse_uuid(&self.id)?,
            name: self.name,
            address: self.address,
            state: self.state,
            lga: self.lga,
            phone: self.phone,
            specialties: tags_from_json(&self.specialties)?,
            facilities: tags_from_json(&self.facilities)?,
            rating: self.rating,
            has_emergency: self.has_emergency,
            is_active: self.is_active,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

pub fn insert_hospital(conn: &Connection, hospital: &Hospital) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO hospitals ({HOSPITAL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
            hospital.id.to_string(),
            hospital.name,
            hospital.address,
            hospital.state,
            hospital.lga,
            hospital.phone,
            tags_to_json(&hospital.specialties)?,
            tags_to_json(&hospital.facilities)?,
            hospital.rating,
            hospital.has_emergency,
            hospital.is_active,
            fmt_timestamp(&hospital.created_at),
            fmt_timestamp(&hospital.updated_at),
        ],
    )?;
    Ok(())
}

/// Full-row update from the admin form. Does not touch `is_active`.
pub fn update_hospital(conn: &Connection, hospital: &Hospital) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE hospitals SET name = ?2, address = ?3, state = ?4, lga = ?5, phone = ?6,
         specialties = ?7, facilities = ?8, rating = ?9, has_emergency = ?10, updated_at = ?11
         WHERE id = ?1",
        params![
            hospital.id.to_string(),
            hospital.name,
            hospital.address,
            hospital.state,
            hospital.lga,
            hospital.phone,
            tags_to_json(&hospital.specialties)?,
            tags_to_json(&hospital.facilities)?,
            hospital.rating,
            hospital.has_emergency,
            fmt_timestamp(&hospital.updated_at),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("hospital", hospital.id));
    }
    Ok(())
}

/// Soft delete: the row stays for appointment history but leaves the directory.
pub fn deactivate_hospital(
    conn: &Connection,
    id: &Uuid,
    now: &chrono::DateTime<chrono::Utc>,
) -> Result<Hospital, DatabaseError> {
    let updated = conn.execute(
        "UPDATE hospitals SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        params![id.to_string(), fmt_timestamp(now)],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("hospital", id));
    }
    get_hospital(conn, id)?.ok_or_else(|| DatabaseError::not_found("hospital", id))
}

pub fn get_hospital(conn: &Connection, id: &Uuid) -> Result<Option<Hospital>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {HOSPITAL_COLUMNS} FROM hospitals WHERE id = ?1"),
            params![id.to_string()],
            HospitalRow::from_row,
        )
        .optional()?;
    row.map(HospitalRow::into_hospital).transpose()
}

/// Directory search over active hospitals.
pub fn search_hospitals(
    conn: &Connection,
    query: &HospitalQuery,
) -> Result<Vec<Hospital>, DatabaseError> {
    let mut clauses = vec!["is_active = 1".to_string()];
    let mut values: Vec<Value> = Vec::new();

    if let Some(state) = query.state.as_deref().filter(|s| !s.trim().is_empty()) {
        values.push(Value::Text(state.trim().to_string()));
        clauses.push(format!("state = ?{} COLLATE NOCASE", values.len()));
    }
    if let Some(specialty) = query.specialty.as_deref().filter(|s| !s.trim().is_empty()) {
        values.push(Value::Text(format!("%{}%", specialty.trim())));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(hospitals.specialties) WHERE json_each.value LIKE ?{})",
            values.len()
        ));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        values.push(Value::Text(format!("%{}%", search.trim())));
        let n = values.len();
        clauses.push(format!(
            "(name LIKE ?{n} OR address LIKE ?{n} OR IFNULL(lga, '') LIKE ?{n})"
        ));
    }
    if query.emergency_only {
        clauses.push("has_emergency = 1".to_string());
    }

    let order = match query.order {
        HospitalOrder::Rating => "rating DESC, name ASC",
        HospitalOrder::Name => "name ASC",
    };

    values.push(Value::Integer(i64::from(query.limit.clamp(1, MAX_PAGE_SIZE))));
    let limit_idx = values.len();
    values.push(Value::Integer(i64::from(query.offset)));
    let offset_idx = values.len();

    let sql = format!(
        "SELECT {HOSPITAL_COLUMNS} FROM hospitals WHERE {} ORDER BY {order} LIMIT ?{limit_idx} OFFSET ?{offset_idx}",
        clauses.join(" AND ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), HospitalRow::from_row)?;

    let mut hospitals = Vec::new();
    for row in rows {
        hospitals.push(row?.into_hospital()?);
    }
    Ok(hospitals)
}

pub fn count_hospitals(conn: &Connection) -> Result<u32, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM hospitals", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::HospitalInput;
    use chrono::Utc;

    fn add(conn: &Connection, name: &str, state: &str, specialties: &[&str], rating: f64) -> Hospital {
        let hospital = Hospital::from_input(
            HospitalInput {
                name: name.into(),
                address: format!("1 Hospital Road, {state}"),
                state: state.into(),
                lga: None,
                phone: None,
                specialties: specialties.iter().map(|s| s.to_string()).collect(),
                facilities: vec!["Pharmacy".into()],
                rating,
                has_emergency: specialties.contains(&"Emergency"),
            },
            Utc::now(),
        );
        insert_hospital(conn, &hospital).unwrap();
        hospital
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let hospital = add(&conn, "Reddington Hospital", "Lagos", &["Cardiology"], 4.5);
        let stored = get_hospital(&conn, &hospital.id).unwrap().unwrap();
        assert_eq!(stored, hospital);
    }

    #[test]
    fn search_filters_by_state_and_orders_by_rating() {
        let conn = open_memory_database().unwrap();
        add(&conn, "Lower Rated", "Lagos", &["General"], 3.9);
        add(&conn, "Higher Rated", "lagos", &["General"], 4.8);
        add(&conn, "Elsewhere", "Kano", &["General"], 5.0);

        let found = search_hospitals(
            &conn,
            &HospitalQuery {
                state: Some("Lagos".into()),
                ..HospitalQuery::default()
            },
        )
        .unwrap();
        let names: Vec<_> = found.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Higher Rated", "Lower Rated"]);
    }

    #[test]
    fn search_matches_specialty_substring() {
        let conn = open_memory_database().unwrap();
        add(&conn, "Mother Care", "Abuja", &["Maternity & Obstetrics"], 4.0);
        add(&conn, "Bone Centre", "Abuja", &["Orthopedics"], 4.0);

        let found = search_hospitals(
            &conn,
            &HospitalQuery {
                specialty: Some("maternity".into()),
                ..HospitalQuery::default()
            },
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Mother Care");
    }

    #[test]
    fn search_text_matches_name_or_address() {
        let conn = open_memory_database().unwrap();
        add(&conn, "Island Clinic", "Lagos", &[], 4.0);
        add(&conn, "Mainland Clinic", "Ogun", &[], 4.0);

        let found = search_hospitals(
            &conn,
            &HospitalQuery {
                search: Some("island".into()),
                ..HospitalQuery::default()
            },
        )
        .unwrap();
        assert_eq!(found.len(), 1);

        let by_address = search_hospitals(
            &conn,
            &HospitalQuery {
                search: Some("Ogun".into()),
                ..HospitalQuery::default()
            },
        )
        .unwrap();
        assert_eq!(by_address[0].name, "Mainland Clinic");
    }

    #[test]
    fn deactivated_hospitals_leave_the_directory() {
        let conn = open_memory_database().unwrap();
        let hospital = add(&conn, "Closing Soon", "Lagos", &[], 4.0);
        let deactivated = deactivate_hospital(&conn, &hospital.id, &Utc::now()).unwrap();
        assert!(!deactivated.is_active);

        let found = search_hospitals(&conn, &HospitalQuery::default()).unwrap();
        assert!(found.is_empty());
        assert!(get_hospital(&conn, &hospital.id).unwrap().is_some());
    }

    #[test]
    fn pagination_uses_offset_and_limit() {
        let conn = open_memory_database().unwrap();
        for i in 0..5 {
            add(&conn, &format!("Clinic {i}"), "Oyo", &[], 4.0);
        }
        let page = search_hospitals(
            &conn,
            &HospitalQuery {
                order: HospitalOrder::Name,
                offset: 2,
                limit: 2,
                ..HospitalQuery::default()
            },
        )
        .unwrap();
        let names: Vec<_> = page.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Clinic 2", "Clinic 3"]);
    }

    #[test]
    fn emergency_only_filter() {
        let conn = open_memory_database().unwrap();
        add(&conn, "ER Ready", "Rivers", &["Emergency"], 4.0);
        add(&conn, "Day Clinic", "Rivers", &["General"], 4.0);
        let found = search_hospitals(
            &conn,
            &HospitalQuery {
                emergency_only: true,
                ..HospitalQuery::default()
            },
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ER Ready");
    }

    #[test]
    fn update_missing_hospital_is_not_found() {
        let conn = open_memory_database().unwrap();
        let hospital = Hospital::from_input(HospitalInput::default(), Utc::now());
        assert!(matches!(
            update_hospital(&conn, &hospital),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
