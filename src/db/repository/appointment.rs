use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{fmt_timestamp, parse_timestamp, parse_uuid, swap_status};
use crate::db::DatabaseError;
use crate::lifecycle::guard_transition;
use crate::models::enums::AppointmentStatus;
use crate::models::{Appointment, BookingRequest};

const APPOINTMENT_COLUMNS: &str =
    "id, user_id, hospital_id, scheduled_at, reason, status, created_at, updated_at";

type AppointmentRow = (String, String, String, String, Option<String>, String, String, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let (id, user_id, hospital_id, scheduled_at, reason, status, created_at, updated_at) = row;
    Ok(Appointment {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        hospital_id: parse_uuid(&hospital_id)?,
        scheduled_at: parse_timestamp(&scheduled_at)?,
        reason,
        status: status.parse::<AppointmentStatus>()?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Book a visit at an active hospital. Slots in the past are refused.
pub fn book_appointment(
    conn: &Connection,
    user_id: &Uuid,
    request: BookingRequest,
    now: &DateTime<Utc>,
) -> Result<Appointment, DatabaseError> {
    if request.scheduled_at <= *now {
        return Err(DatabaseError::ConstraintViolation(
            "appointment must be scheduled in the future".into(),
        ));
    }
    let active: Option<bool> = conn
        .query_row(
            "SELECT is_active FROM hospitals WHERE id = ?1",
            params![request.hospital_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    if active != Some(true) {
        return Err(DatabaseError::not_found("hospital", request.hospital_id));
    }

    let appointment = Appointment {
        id: Uuid::new_v4(),
        user_id: *user_id,
        hospital_id: request.hospital_id,
        scheduled_at: request.scheduled_at,
        reason: request.reason.filter(|r| !r.trim().is_empty()),
        status: AppointmentStatus::Scheduled,
        created_at: *now,
        updated_at: *now,
    };

    conn.execute(
        &format!(
            "INSERT INTO appointments ({APPOINTMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        params![
            appointment.id.to_string(),
            appointment.user_id.to_string(),
            appointment.hospital_id.to_string(),
            fmt_timestamp(&appointment.scheduled_at),
            appointment.reason,
            appointment.status.as_str(),
            fmt_timestamp(&appointment.created_at),
            fmt_timestamp(&appointment.updated_at),
        ],
    )?;
    Ok(appointment)
}

pub fn get_appointment(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id.to_string()],
            read_row,
        )
        .optional()?;
    row.map(appointment_from_row).transpose()
}

/// Appointments in schedule order. With `upcoming_after`, only open
/// (scheduled or confirmed) visits after that instant are returned.
pub fn list_appointments(
    conn: &Connection,
    user_id: &Uuid,
    upcoming_after: Option<&DateTime<Utc>>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE user_id = ?1
           AND (?2 IS NULL OR (scheduled_at > ?2 AND status IN ('scheduled', 'confirmed')))
         ORDER BY scheduled_at ASC"
    ))?;
    let rows = stmt.query_map(
        params![user_id.to_string(), upcoming_after.map(fmt_timestamp)],
        read_row,
    )?;
    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    next: AppointmentStatus,
    now: &DateTime<Utc>,
) -> Result<Appointment, DatabaseError> {
    loop {
        let mut appointment =
            get_appointment(conn, id)?.ok_or_else(|| DatabaseError::not_found("appointment", id))?;
        guard_transition(appointment.status, next)?;
        if !swap_status(conn, "appointments", id, appointment.status.as_str(), next.as_str(), now)? {
            continue;
        }
        tracing::info!(appointment_id = %id, from = %appointment.status, to = %next, "Appointment status changed");
        appointment.status = next;
        appointment.updated_at = *now;
        return Ok(appointment);
    }
}
