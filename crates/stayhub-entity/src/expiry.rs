//! Time-bound entities that leave their pending state once a deadline passes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal status shared by every expirable kind.
pub const EXPIRED_STATUS: &str = "EXPIRED";

/// The kinds of record the expiry sweep transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirableKind {
    /// Booking requests accepted by the host but not completed in time.
    BookingRequest,
    /// Host special offers.
    SpecialOffer,
    /// Co-host invitations.
    CoHostInvitation,
}

impl ExpirableKind {
    /// Every kind, in sweep order.
    pub const ALL: [ExpirableKind; 3] = [
        ExpirableKind::BookingRequest,
        ExpirableKind::SpecialOffer,
        ExpirableKind::CoHostInvitation,
    ];

    /// Backing table.
    pub fn table(&self) -> &'static str {
        match self {
            Self::BookingRequest => "bookings",
            Self::SpecialOffer => "special_offers",
            Self::CoHostInvitation => "property_co_hosts",
        }
    }

    /// The status value that is still "pending" for this kind.
    pub fn pending_status(&self) -> &'static str {
        match self {
            Self::BookingRequest => "ACCEPTED",
            Self::SpecialOffer => "PENDING",
            Self::CoHostInvitation => "PENDING",
        }
    }

    /// The terminal status written by the sweep.
    pub fn expired_status(&self) -> &'static str {
        EXPIRED_STATUS
    }
}

impl fmt::Display for ExpirableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BookingRequest => "booking_request",
            Self::SpecialOffer => "special_offer",
            Self::CoHostInvitation => "co_host_invitation",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_values() {
        assert_eq!(ExpirableKind::BookingRequest.pending_status(), "ACCEPTED");
        assert_eq!(ExpirableKind::SpecialOffer.pending_status(), "PENDING");
        assert_eq!(ExpirableKind::CoHostInvitation.pending_status(), "PENDING");
        assert!(ExpirableKind::ALL.iter().all(|k| k.expired_status() == EXPIRED_STATUS));
    }

    #[test]
    fn test_tables_are_distinct() {
        let tables: std::collections::HashSet<_> =
            ExpirableKind::ALL.iter().map(|k| k.table()).collect();
        assert_eq!(tables.len(), 3);
    }
}
