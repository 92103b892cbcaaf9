//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// Pending ──┬──► Cancelled
///           ├──► Approved
///           ├──► Rejected ──► (soft-delete)
///           └──► Completed ──► (soft-delete)
/// ```
///
/// The admin override (`Order::set_status`) may move between any recognized
/// statuses; the guarded transitions above are what customers and the
/// regular admin actions can reach. `Unknown` represents an unrecognized
/// stored value and rejects every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order was placed and awaits an admin decision.
    #[default]
    Pending,

    /// Cancelled by the customer or an admin.
    Cancelled,

    /// Accepted by an admin.
    Approved,

    /// Declined by an admin.
    Rejected,

    /// Fulfilled and closed out.
    Completed,

    /// A stored status string this version does not recognize.
    Unknown,
}

impl OrderStatus {
    /// Parses a stored status string, case-insensitively.
    ///
    /// Unrecognized values map to [`OrderStatus::Unknown`] rather than
    /// failing, so old rows never make reads error; transitions out of
    /// `Unknown` are rejected instead.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "pending" => OrderStatus::Pending,
            "cancelled" => OrderStatus::Cancelled,
            "approved" => OrderStatus::Approved,
            "rejected" => OrderStatus::Rejected,
            "completed" => OrderStatus::Completed,
            _ => OrderStatus::Unknown,
        }
    }

    /// Returns the status name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Approved => "Approved",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Completed => "Completed",
            OrderStatus::Unknown => "Unknown",
        }
    }

    /// Returns true for every status except `Unknown`.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, OrderStatus::Unknown)
    }

    /// Returns true if the order can be cancelled from this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be approved from this status.
    pub fn can_approve(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be soft-deleted from this status.
    pub fn can_delete(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Completed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
