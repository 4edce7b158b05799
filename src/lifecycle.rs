//! Status transition guards.
//!
//! Purchases, orders and appointments carry status enums that are advanced
//! by staff tools, couriers or payment callbacks. Every status write goes
//! through [`guard_transition`] so an order can never jump from `ordered`
//! straight to `completed`, and terminal states stay terminal.

use serde::Serialize;

use crate::models::enums::{
    AppointmentStatus, PharmacyOrderStatus, PurchaseStatus, TestKitOrderStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("{entity} cannot move from {from} to {to}")]
    IllegalTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },
}

/// A status enum with an explicit successor table.
pub trait Lifecycle: Copy + PartialEq + 'static {
    const ENTITY: &'static str;

    fn allowed_next(self) -> &'static [Self];

    fn label(self) -> &'static str;

    fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }
}

pub fn guard_transition<S: Lifecycle>(from: S, to: S) -> Result<(), LifecycleError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(LifecycleError::IllegalTransition {
            entity: S::ENTITY,
            from: from.label(),
            to: to.label(),
        })
    }
}

impl Lifecycle for PurchaseStatus {
    const ENTITY: &'static str = "insurance purchase";

    fn allowed_next(self) -> &'static [Self] {
        use PurchaseStatus::*;
        match self {
            Pending => &[Active, Cancelled],
            Active => &[Expired, Cancelled],
            Expired | Cancelled => &[],
        }
    }

    fn label(self) -> &'static str {
        self.as_str()
    }
}

impl Lifecycle for TestKitOrderStatus {
    const ENTITY: &'static str = "test kit order";

    fn allowed_next(self) -> &'static [Self] {
        use TestKitOrderStatus::*;
        match self {
            Ordered => &[Shipped, Cancelled],
            Shipped => &[Delivered, Cancelled],
            Delivered => &[SampleCollected],
            SampleCollected => &[Processing],
            Processing => &[ResultsReady],
            ResultsReady => &[Completed],
            Completed | Cancelled => &[],
        }
    }

    fn label(self) -> &'static str {
        self.as_str()
    }
}

impl Lifecycle for PharmacyOrderStatus {
    const ENTITY: &'static str = "pharmacy order";

    fn allowed_next(self) -> &'static [Self] {
        use PharmacyOrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Dispatched, Cancelled],
            Dispatched => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    fn label(self) -> &'static str {
        self.as_str()
    }
}

impl Lifecycle for AppointmentStatus {
    const ENTITY: &'static str = "appointment";

    fn allowed_next(self) -> &'static [Self] {
        use AppointmentStatus::*;
        match self {
            Scheduled => &[Confirmed, Cancelled],
            Confirmed => &[Completed, Cancelled, NoShow],
            Completed | Cancelled | NoShow => &[],
        }
    }

    fn label(self) -> &'static str {
        self.as_str()
    }
}

/// Display text and badge colour for a test kit order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    pub message: &'static str,
    pub color: &'static str,
}

pub fn test_kit_status_display(status: TestKitOrderStatus) -> StatusDisplay {
    use TestKitOrderStatus::*;
    let (message, color) = match status {
        Ordered => ("Your order has been placed", "blue"),
        Shipped => ("Your kit is on its way", "indigo"),
        Delivered => ("Kit delivered. Follow the instructions to collect your sample", "purple"),
        SampleCollected => ("Sample collected and heading to the lab", "orange"),
        Processing => ("The lab is processing your sample", "yellow"),
        ResultsReady => ("Your results are ready to view", "green"),
        Completed => ("Test completed", "gray"),
        Cancelled => ("Order cancelled", "red"),
    };
    StatusDisplay { message, color }
}
