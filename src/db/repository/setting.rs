use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::fmt_timestamp;
use crate::db::DatabaseError;

/// Get a user setting by key. Returns None if not set.
pub fn get_user_setting(
    conn: &Connection,
    user_id: &Uuid,
    key: &str,
) -> Result<Option<String>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT value FROM user_settings WHERE user_id = ?1 AND key = ?2")?;
    match stmt.query_row(params![user_id.to_string(), key], |row| row.get::<_, String>(0)) {
        Ok(val) => Ok(Some(val)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::from(e)),
    }
}

/// Set a user setting (upsert).
pub fn set_user_setting(
    conn: &Connection,
    user_id: &Uuid,
    key: &str,
    value: &str,
    now: &DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO user_settings (user_id, key, value, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
        params![user_id.to_string(), key, value, fmt_timestamp(now)],
    )?;
    Ok(())
}

/// Delete a user setting.
pub fn delete_user_setting(
    conn: &Connection,
    user_id: &Uuid,
    key: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM user_settings WHERE user_id = ?1 AND key = ?2",
        params![user_id.to_string(), key],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn set_get_overwrite_delete() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        assert_eq!(get_user_setting(&conn, &user, "theme").unwrap(), None);

        set_user_setting(&conn, &user, "theme", "light", &Utc::now()).unwrap();
        set_user_setting(&conn, &user, "theme", "dark", &Utc::now()).unwrap();
        assert_eq!(get_user_setting(&conn, &user, "theme").unwrap().as_deref(), Some("dark"));

        delete_user_setting(&conn, &user, "theme").unwrap();
        assert_eq!(get_user_setting(&conn, &user, "theme").unwrap(), None);
    }

    #[test]
    fn settings_are_per_user() {
        let conn = open_memory_database().unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        set_user_setting(&conn, &a, "onboarding_completed", "true", &Utc::now()).unwrap();
        assert_eq!(get_user_setting(&conn, &b, "onboarding_completed").unwrap(), None);
    }
}
