use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{EmergencyContact, NewEmergencyContact};

/// Add a contact. The first contact a user saves becomes primary.
pub fn add_emergency_contact(
    conn: &mut Connection,
    user_id: &Uuid,
    contact: NewEmergencyContact,
    now: &DateTime<Utc>,
) -> Result<EmergencyContact, DatabaseError> {
    if contact.name.trim().is_empty() || contact.phone.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "emergency contact needs a name and a phone number".into(),
        ));
    }

    let tx = conn.transaction()?;
    let existing: u32 = tx.query_row(
        "SELECT COUNT(*) FROM emergency_contacts WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| row.get(0),
    )?;
    let is_primary = contact.is_primary || existing == 0;
    if is_primary {
        tx.execute(
            "UPDATE emergency_contacts SET is_primary = 0 WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;
    }

    let stored = EmergencyContact {
        id: Uuid::new_v4(),
        user_id: *user_id,
        name: contact.name.trim().to_string(),
        phone: contact.phone.trim().to_string(),
        relationship: contact.relationship,
        is_primary,
        created_at: *now,
    };
    tx.execute(
        "INSERT INTO emergency_contacts (id, user_id, name, phone, relationship, is_primary, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            stored.id.to_string(),
            stored.user_id.to_string(),
            stored.name,
            stored.phone,
            stored.relationship,
            stored.is_primary,
            fmt_timestamp(&stored.created_at),
        ],
    )?;
    tx.commit()?;
    Ok(stored)
}

/// Primary contact first, then in the order they were added.
pub fn list_emergency_contacts(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<EmergencyContact>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, phone, relationship, is_primary, created_at
         FROM emergency_contacts WHERE user_id = ?1
         ORDER BY is_primary DESC, created_at ASC",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, bool>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut contacts = Vec::new();
    for row in rows {
        let (id, user_id, name, phone, relationship, is_primary, created_at) = row?;
        contacts.push(EmergencyContact {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            name,
            phone,
            relationship,
            is_primary,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(contacts)
}

/// Make one contact primary and clear the flag on the user's others.
pub fn set_primary_contact(conn: &mut Connection, contact_id: &Uuid) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;
    let user_id: String = tx
        .query_row(
            "SELECT user_id FROM emergency_contacts WHERE id = ?1",
            params![contact_id.to_string()],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DatabaseError::not_found("emergency contact", contact_id)
            }
            other => DatabaseError::from(other),
        })?;
    tx.execute(
        "UPDATE emergency_contacts SET is_primary = (id = ?2) WHERE user_id = ?1",
        params![user_id, contact_id.to_string()],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn delete_emergency_contact(conn: &Connection, contact_id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM emergency_contacts WHERE id = ?1",
        params![contact_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("emergency contact", contact_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn contact(name: &str, primary: bool) -> NewEmergencyContact {
        NewEmergencyContact {
            name: name.into(),
            phone: "08031234567".into(),
            relationship: Some("Sister".into()),
            is_primary: primary,
        }
    }

    #[test]
    fn first_contact_becomes_primary() {
        let mut conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let first = add_emergency_contact(&mut conn, &user, contact("Ada", false), &Utc::now()).unwrap();
        let second = add_emergency_contact(&mut conn, &user, contact("Bola", false), &Utc::now()).unwrap();
        assert!(first.is_primary);
        assert!(!second.is_primary);
    }

    #[test]
    fn only_one_primary_per_user() {
        let mut conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        add_emergency_contact(&mut conn, &user, contact("Ada", true), &Utc::now()).unwrap();
        let bola = add_emergency_contact(&mut conn, &user, contact("Bola", true), &Utc::now()).unwrap();

        let contacts = list_emergency_contacts(&conn, &user).unwrap();
        let primaries: Vec<_> = contacts.iter().filter(|c| c.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id, bola.id);
        assert_eq!(contacts[0].id, bola.id);
    }

    #[test]
    fn set_primary_moves_the_flag() {
        let mut conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let ada = add_emergency_contact(&mut conn, &user, contact("Ada", false), &Utc::now()).unwrap();
        let bola = add_emergency_contact(&mut conn, &user, contact("Bola", false), &Utc::now()).unwrap();
        set_primary_contact(&mut conn, &bola.id).unwrap();

        let contacts = list_emergency_contacts(&conn, &user).unwrap();
        assert!(contacts.iter().find(|c| c.id == bola.id).unwrap().is_primary);
        assert!(!contacts.iter().find(|c| c.id == ada.id).unwrap().is_primary);
    }

    #[test]
    fn set_primary_on_unknown_contact_is_not_found() {
        let mut conn = open_memory_database().unwrap();
        assert!(matches!(
            set_primary_contact(&mut conn, &Uuid::new_v4()),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn blank_contact_is_rejected() {
        let mut conn = open_memory_database().unwrap();
        let err = add_emergency_contact(&mut conn, &Uuid::new_v4(), contact(" ", false), &Utc::now())
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn delete_removes_contact() {
        let mut conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let ada = add_emergency_contact(&mut conn, &user, contact("Ada", false), &Utc::now()).unwrap();
        delete_emergency_contact(&conn, &ada.id).unwrap();
        assert!(list_emergency_contacts(&conn, &user).unwrap().is_empty());
        assert!(delete_emergency_contact(&conn, &ada.id).is_err());
    }
}
