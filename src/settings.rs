//! Per-user local settings: dismissal flags and timestamps.
//!
//! Settings are loaded into a plain value and passed to whatever needs them,
//! so expiry rules are testable with an explicit `now`.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repository::{delete_user_setting, get_user_setting, set_user_setting};
use crate::db::DatabaseError;
use crate::models::enums::NotificationPermission;

/// How long a dismissed premium card stays hidden.
pub const PREMIUM_CARD_SNOOZE_DAYS: i64 = 7;

const KEY_PREMIUM_DISMISSED: &str = "premium_card_dismissed_at";
const KEY_ONBOARDING: &str = "onboarding_completed";
const KEY_NOTIFICATIONS: &str = "notification_permission";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSettings {
    pub premium_card_dismissed_at: Option<DateTime<Utc>>,
    pub onboarding_completed: bool,
    pub notification_permission: NotificationPermission,
}

impl LocalSettings {
    /// Shown until dismissed, then again once the snooze has elapsed.
    pub fn should_show_premium_card(&self, now: DateTime<Utc>) -> bool {
        match self.premium_card_dismissed_at {
            None => true,
            Some(at) => now - at >= Duration::days(PREMIUM_CARD_SNOOZE_DAYS),
        }
    }

    pub fn dismiss_premium_card(&mut self, now: DateTime<Utc>) {
        self.premium_card_dismissed_at = Some(now);
    }

    pub fn complete_onboarding(&mut self) {
        self.onboarding_completed = true;
    }
}

/// Unparseable stored values fall back to defaults with a warning rather
/// than failing the whole load.
pub fn load_settings(conn: &Connection, user_id: &Uuid) -> Result<LocalSettings, DatabaseError> {
    let mut settings = LocalSettings::default();

    if let Some(raw) = get_user_setting(conn, user_id, KEY_PREMIUM_DISMISSED)? {
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => settings.premium_card_dismissed_at = Some(at.with_timezone(&Utc)),
            Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Ignoring bad premium card timestamp"),
        }
    }
    if let Some(raw) = get_user_setting(conn, user_id, KEY_ONBOARDING)? {
        settings.onboarding_completed = raw == "true";
    }
    if let Some(raw) = get_user_setting(conn, user_id, KEY_NOTIFICATIONS)? {
        match raw.parse::<NotificationPermission>() {
            Ok(p) => settings.notification_permission = p,
            Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Ignoring bad notification permission"),
        }
    }
    Ok(settings)
}

pub fn save_settings(
    conn: &Connection,
    user_id: &Uuid,
    settings: &LocalSettings,
    now: &DateTime<Utc>,
) -> Result<(), DatabaseError> {
    match settings.premium_card_dismissed_at {
        Some(at) => set_user_setting(conn, user_id, KEY_PREMIUM_DISMISSED, &at.to_rfc3339(), now)?,
        None => delete_user_setting(conn, user_id, KEY_PREMIUM_DISMISSED)?,
    }
    set_user_setting(
        conn,
        user_id,
        KEY_ONBOARDING,
        if settings.onboarding_completed { "true" } else { "false" },
        now,
    )?;
    set_user_setting(
        conn,
        user_id,
        KEY_NOTIFICATIONS,
        settings.notification_permission.as_str(),
        now,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn premium_card_shows_until_dismissed() {
        let settings = LocalSettings::default();
        assert!(settings.should_show_premium_card(t0()));
    }

    #[test]
    fn premium_card_reappears_after_seven_days() {
        let mut settings = LocalSettings::default();
        settings.dismiss_premium_card(t0());
        assert!(!settings.should_show_premium_card(t0() + Duration::days(6)));
        assert!(!settings.should_show_premium_card(t0() + Duration::days(7) - Duration::seconds(1)));
        assert!(settings.should_show_premium_card(t0() + Duration::days(7)));
    }

    #[test]
    fn settings_persist_per_user() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        assert_eq!(load_settings(&conn, &user).unwrap(), LocalSettings::default());

        let mut settings = LocalSettings::default();
        settings.dismiss_premium_card(t0());
        settings.complete_onboarding();
        settings.notification_permission = NotificationPermission::Granted;
        save_settings(&conn, &user, &settings, &t0()).unwrap();

        assert_eq!(load_settings(&conn, &user).unwrap(), settings);
        assert_eq!(load_settings(&conn, &Uuid::new_v4()).unwrap(), LocalSettings::default());
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        set_user_setting(&conn, &user, KEY_PREMIUM_DISMISSED, "yesterday", &t0()).unwrap();
        set_user_setting(&conn, &user, KEY_NOTIFICATIONS, "maybe", &t0()).unwrap();
        assert_eq!(load_settings(&conn, &user).unwrap(), LocalSettings::default());
    }
}
