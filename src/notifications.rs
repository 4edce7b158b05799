//! Permission-gated local notifications.
//!
//! A [`NotificationGate`] lives for one session. It asks for permission at
//! most once, and only forwards notifications to its sink when the user has
//! granted permission.

use serde::{Deserialize, Serialize};

use crate::models::enums::NotificationPermission;
use crate::profile_completion::{ProfileReminder, ReminderPriority};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Notifications with the same tag replace each other on the device.
    pub tag: String,
    pub require_interaction: bool,
}

/// Asks the user for notification permission.
pub trait PermissionPrompt {
    fn request(&mut self) -> NotificationPermission;
}

/// Displays a notification.
pub trait NotificationSink {
    fn show(&mut self, notification: &Notification);
}

/// Collects notifications for delivery to the device in a response body.
impl NotificationSink for Vec<Notification> {
    fn show(&mut self, notification: &Notification) {
        self.push(notification.clone());
    }
}

#[derive(Debug)]
pub struct NotificationGate {
    permission: NotificationPermission,
    requested_this_session: bool,
}

impl NotificationGate {
    pub fn new(stored: NotificationPermission) -> Self {
        Self {
            permission: stored,
            requested_this_session: false,
        }
    }

    pub fn permission(&self) -> NotificationPermission {
        self.permission
    }

    /// Prompts only while the permission is undecided and only once per
    /// session; later calls return the cached answer.
    pub fn ensure_permission(&mut self, prompt: &mut dyn PermissionPrompt) -> NotificationPermission {
        if self.permission == NotificationPermission::Default && !self.requested_this_session {
            self.requested_this_session = true;
            self.permission = prompt.request();
            tracing::debug!(permission = %self.permission, "Notification permission requested");
        }
        self.permission
    }

    /// Returns whether the notification was shown.
    pub fn notify(&self, sink: &mut dyn NotificationSink, notification: &Notification) -> bool {
        if self.permission != NotificationPermission::Granted {
            return false;
        }
        sink.show(notification);
        true
    }
}

pub fn reminder_notification(reminder: &ProfileReminder) -> Notification {
    let body = if reminder.missing_fields.is_empty() {
        reminder.message.clone()
    } else {
        format!("{} Missing: {}.", reminder.message, reminder.missing_fields.join(", "))
    };
    Notification {
        title: reminder.title.clone(),
        body,
        tag: format!("profile-{}", reminder.category.as_str()),
        require_interaction: reminder.priority == ReminderPriority::High,
    }
}

/// Show one notification per reminder. Returns how many were shown.
pub fn notify_reminders(
    gate: &NotificationGate,
    sink: &mut dyn NotificationSink,
    reminders: &[ProfileReminder],
) -> usize {
    reminders
        .iter()
        .map(reminder_notification)
        .filter(|n| gate.notify(sink, n))
        .count()
}
