use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Female => "female",
    Male => "male",
    Other => "other",
});

str_enum!(LifeStage {
    Pregnant => "pregnant",
    Mother => "mother",
    Elderly => "elderly",
    Other => "other",
});

str_enum!(PlanType {
    Individual => "individual",
    Family => "family",
    Maternity => "maternity",
    Senior => "senior",
    Corporate => "corporate",
});

str_enum!(PurchaseStatus {
    Pending => "pending",
    Active => "active",
    Expired => "expired",
    Cancelled => "cancelled",
});

str_enum!(TestKitOrderStatus {
    Ordered => "ordered",
    Shipped => "shipped",
    Delivered => "delivered",
    SampleCollected => "sample_collected",
    Processing => "processing",
    ResultsReady => "results_ready",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(PharmacyOrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Dispatched => "dispatched",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no_show",
});

str_enum!(TimelineEventType {
    Appointment => "appointment",
    Vaccination => "vaccination",
    Checkup => "checkup",
    Symptom => "symptom",
    Medication => "medication",
    TestResult => "test_result",
    Milestone => "milestone",
    Note => "note",
});

str_enum!(NotificationPermission {
    Default => "default",
    Granted => "granted",
    Denied => "denied",
});

impl Default for NotificationPermission {
    fn default() -> Self {
        Self::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn purchase_status_round_trip() {
        for (variant, s) in [
            (PurchaseStatus::Pending, "pending"),
            (PurchaseStatus::Active, "active"),
            (PurchaseStatus::Expired, "expired"),
            (PurchaseStatus::Cancelled, "cancelled"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(PurchaseStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn serde_matches_storage_strings() {
        let json = serde_json::to_string(&TestKitOrderStatus::SampleCollected).unwrap();
        assert_eq!(json, "\"sample_collected\"");
        let parsed: AppointmentStatus = serde_json::from_str("\"no_show\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::NoShow);
    }

    #[test]
    fn display_uses_storage_string() {
        assert_eq!(LifeStage::Pregnant.to_string(), "pregnant");
        assert_eq!(PlanType::Maternity.to_string(), "maternity");
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(LifeStage::from_str("teenager").is_err());
        assert!(PurchaseStatus::from_str("").is_err());
        let err = Gender::from_str("unknown").unwrap_err();
        assert!(err.to_string().contains("Gender"));
    }
}
