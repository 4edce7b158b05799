use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{fmt_timestamp, parse_date, parse_timestamp, parse_uuid, tags_from_json, tags_to_json};
use crate::db::DatabaseError;
use crate::models::enums::{Gender, LifeStage};
use crate::models::Profile;

const PROFILE_COLUMNS: &str = "user_id, full_name, phone_number, date_of_birth, gender, state, lga,
     address, blood_group, genotype, allergies, chronic_conditions, emergency_contact_name,
     emergency_contact_phone, emergency_contact_relationship, insurance_provider,
     insurance_number, is_pregnant, due_date, life_stage, updated_at";

struct ProfileRow {
    user_id: String,
    full_name: Option<String>,
    phone_number: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    state: Option<String>,
    lga: Option<String>,
    address: Option<String>,
    blood_group: Option<String>,
    genotype: Option<String>,
    allergies: String,
    chronic_conditions: String,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    emergency_contact_relationship: Option<String>,
    insurance_provider: Option<String>,
    insurance_number: Option<String>,
    is_pregnant: bool,
    due_date: Option<String>,
    life_stage: Option<String>,
    updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            full_name: row.get(1)?,
            phone_number: row.get(2)?,
            date_of_birth: row.get(3)?,
            gender: row.get(4)?,
            state: row.get(5)?,
            lga: row.get(6)?,
            address: row.get(7)?,
            blood_group: row.get(8)?,
            genotype: row.get(9)?,
            allergies: row.get(10)?,
            chronic_conditions: row.get(11)?,
            emergency_contact_name: row.get(12)?,
            emergency_contact_phone: row.get(13)?,
            emergency_contact_relationship: row.get(14)?,
            insurance_provider: row.get(15)?,
            insurance_number: row.get(16)?,
            is_pregnant: row.get(17)?,
            due_date: row.get(18)?,
            life_stage: row.get(19)?,
            updated_at: row.get(20)?,
        })
    }

    fn into_profile(self) -> Result<Profile, DatabaseError> {
        Ok(Profile {
            user_id: parse_uuid(&self.user_id)?,
            full_name: self.full_name,
            phone_number: self.phone_number,
            date_of_birth: self.date_of_birth.as_deref().map(parse_date).transpose()?,
            gender: self.gender.as_deref().map(str::parse::<Gender>).transpose()?,
            state: self.state,
            lga: self.lga,
            address: self.address,
            blood_group: self.blood_group,
            genotype: self.genotype,
            allergies: tags_from_json(&self.allergies)?,
            chronic_conditions: tags_from_json(&self.chronic_conditions)?,
            emergency_contact_name: self.emergency_contact_name,
            emergency_contact_phone: self.emergency_contact_phone,
            emergency_contact_relationship: self.emergency_contact_relationship,
            insurance_provider: self.insurance_provider,
            insurance_number: self.insurance_number,
            is_pregnant: self.is_pregnant,
            due_date: self.due_date.as_deref().map(parse_date).transpose()?,
            life_stage: self.life_stage.as_deref().map(str::parse::<LifeStage>).transpose()?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

pub fn get_profile(conn: &Connection, user_id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1"),
            params![user_id.to_string()],
            ProfileRow::from_row,
        )
        .optional()?;
    row.map(ProfileRow::into_profile).transpose()
}

/// Insert or replace the whole profile row (form submission semantics).
pub fn upsert_profile(conn: &Connection, profile: &Profile) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO profiles ({PROFILE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
             ON CONFLICT(user_id) DO UPDATE SET
                full_name = excluded.full_name,
                phone_number = excluded.phone_number,
                date_of_birth = excluded.date_of_birth,
                gender = excluded.gender,
                state = excluded.state,
                lga = excluded.lga,
                address = excluded.address,
                blood_group = excluded.blood_group,
                genotype = excluded.genotype,
                allergies = excluded.allergies,
                chronic_conditions = excluded.chronic_conditions,
                emergency_contact_name = excluded.emergency_contact_name,
                emergency_contact_phone = excluded.emergency_contact_phone,
                emergency_contact_relationship = excluded.emergency_contact_relationship,
                insurance_provider = excluded.insurance_provider,
                insurance_number = excluded.insurance_number,
                is_pregnant = excluded.is_pregnant,
                due_date = excluded.due_date,
                life_stage = excluded.life_stage,
                updated_at = excluded.updated_at"
        ),
        params![
            profile.user_id.to_string(),
            profile.full_name,
            profile.phone_number,
            profile.date_of_birth.map(|d| d.to_string()),
            profile.gender.map(|g| g.as_str()),
            profile.state,
            profile.lga,
            profile.address,
            profile.blood_group,
            profile.genotype,
            tags_to_json(&profile.allergies)?,
            tags_to_json(&profile.chronic_conditions)?,
            profile.emergency_contact_name,
            profile.emergency_contact_phone,
            profile.emergency_contact_relationship,
            profile.insurance_provider,
            profile.insurance_number,
            profile.is_pregnant,
            profile.due_date.map(|d| d.to_string()),
            profile.life_stage.map(|s| s.as_str()),
            fmt_timestamp(&profile.updated_at),
        ],
    )?;
    Ok(())
}

pub fn delete_profile(conn: &Connection, user_id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM profiles WHERE user_id = ?1",
        params![user_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("profile", user_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn missing_profile_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_profile(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn upsert_then_read_back() {
        let conn = open_memory_database().unwrap();
        let user_id = Uuid::new_v4();
        let mut profile = Profile::empty(user_id);
        profile.full_name = Some("Ngozi Okafor".into());
        profile.gender = Some(Gender::Female);
        profile.allergies = vec!["penicillin".into()];
        profile.is_pregnant = true;
        profile.due_date = NaiveDate::from_ymd_opt(2027, 2, 14);
        profile.life_stage = Some(LifeStage::Mother);
        profile.updated_at = Utc::now();
        upsert_profile(&conn, &profile).unwrap();

        let stored = get_profile(&conn, &user_id).unwrap().unwrap();
        assert_eq!(stored, profile);
    }

    #[test]
    fn upsert_overwrites_existing_row() {
        let conn = open_memory_database().unwrap();
        let user_id = Uuid::new_v4();
        let mut profile = Profile::empty(user_id);
        profile.genotype = Some("AS".into());
        upsert_profile(&conn, &profile).unwrap();

        profile.genotype = Some("AA".into());
        profile.state = Some("Lagos".into());
        upsert_profile(&conn, &profile).unwrap();

        let stored = get_profile(&conn, &user_id).unwrap().unwrap();
        assert_eq!(stored.genotype.as_deref(), Some("AA"));
        assert_eq!(stored.state.as_deref(), Some("Lagos"));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn delete_missing_profile_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = delete_profile(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
