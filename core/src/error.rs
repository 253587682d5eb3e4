//! Error taxonomy for the reservation engine.
//!
//! Every failure is a typed [`BookingError`] returned to the immediate
//! caller; nothing here is fatal to the process. A failed claim degrades to
//! "offer alternatives", never to a crash.

use crate::types::{MembershipId, ReservationId, ResourceId, SlotId};
use std::fmt;
use thiserror::Error;

/// What exactly was unavailable when a claim was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotConflict {
    /// These requested seat labels were already held (or not part of the
    /// resource's layout).
    Seats(Vec<SlotId>),
    /// Not enough anonymous units left.
    Quantity {
        /// Units requested.
        requested: u32,
        /// Units actually free at the time of the claim.
        available: u32,
    },
}

impl fmt::Display for SlotConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seats(seats) => {
                let labels: Vec<&str> = seats.iter().map(SlotId::as_str).collect();
                write!(f, "seats [{}] taken", labels.join(", "))
            }
            Self::Quantity {
                requested,
                available,
            } => write!(f, "{requested} unit(s) requested, {available} free"),
        }
    }
}

/// A business-rule violation distinct from capacity and state failures.
///
/// Carried inside [`BookingError::PolicyViolation`] so callers can pick a
/// user-facing message per reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PolicyReason {
    /// Claim or release for zero seats/units.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Resource registered with no capacity.
    #[error("capacity must be at least 1")]
    ZeroCapacity,
    /// A resource with this identifier is already registered.
    #[error("resource already registered")]
    DuplicateResource,
    /// Seat labels sent to an anonymous-slot resource, or a bare quantity
    /// sent to a numbered-seat resource.
    #[error("claim shape does not match the resource's unit kind")]
    UnitKindMismatch,
    /// The resource's booking window has closed.
    #[error("booking is closed for this departure")]
    BookingClosed,
    /// The requester already has a live request on this group.
    #[error("a live membership request already exists for this traveler")]
    DuplicateRequest,
    /// The organizer cannot file a membership request for their own group.
    #[error("the organizer is already a member of their own group")]
    OrganizerCannotJoin,
    /// The acting traveler is not the group's organizer.
    #[error("only the organizer may decide this")]
    NotOrganizer,
    /// The acting traveler is not the member who filed the request.
    #[error("only the requesting member may withdraw")]
    NotRequester,
    /// The resource is not a group tour.
    #[error("resource is not a group tour")]
    NotAGroupTour,
}

/// Failures surfaced by the ledger, processor and approval workflow.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Requested seat(s) already held, or insufficient anonymous capacity.
    /// Recoverable: re-quote against a fresh seat map and retry.
    #[error("slot unavailable on resource {resource_id}: {conflict}")]
    SlotUnavailable {
        /// Resource the claim targeted.
        resource_id: ResourceId,
        /// What was unavailable.
        conflict: SlotConflict,
    },

    /// Operation attempted from a state that does not permit it. Always a
    /// caller error; never silently ignored.
    #[error("cannot {operation} a {state} record")]
    InvalidStateTransition {
        /// The operation attempted.
        operation: &'static str,
        /// The record's state at the time.
        state: &'static str,
    },

    /// Platform approval succeeded procedurally but the group filled during
    /// the approval window ("someone else was approved first").
    #[error("group {resource_id} filled while the request was awaiting approval")]
    CapacityExceededOnApproval {
        /// The group that filled up.
        resource_id: ResourceId,
    },

    /// A business-rule violation; see [`PolicyReason`].
    #[error("policy violation: {reason}")]
    PolicyViolation {
        /// Which rule was violated.
        reason: PolicyReason,
    },

    /// No resource registered under this identifier.
    #[error("unknown resource {0}")]
    UnknownResource(ResourceId),

    /// No reservation recorded under this identifier.
    #[error("unknown reservation {0}")]
    UnknownReservation(ReservationId),

    /// No membership request recorded under this identifier.
    #[error("unknown membership request {0}")]
    UnknownMembership(MembershipId),
}

impl BookingError {
    /// Shorthand for a [`PolicyViolation`](Self::PolicyViolation).
    #[must_use]
    pub const fn policy(reason: PolicyReason) -> Self {
        Self::PolicyViolation { reason }
    }
}

/// Result alias used throughout the engine.
pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlotId;

    #[test]
    fn slot_conflict_lists_offending_seats() {
        let err = BookingError::SlotUnavailable {
            resource_id: ResourceId::new(),
            conflict: SlotConflict::Seats(vec![SlotId::new("A1"), SlotId::new("A2")]),
        };
        let message = err.to_string();
        assert!(message.contains("A1, A2"));
    }

    #[test]
    fn invalid_transition_names_operation_and_state() {
        let err = BookingError::InvalidStateTransition {
            operation: "confirm_payment",
            state: "cancelled",
        };
        assert_eq!(err.to_string(), "cannot confirm_payment a cancelled record");
    }
}
