//! Lifecycle events emitted for the notification collaborator.
//!
//! The engine emits events but never delivers notifications itself: the
//! embedding service subscribes and forwards to email / ticket-rendering
//! systems. Publishing is fire-and-forget; a slow or absent subscriber must
//! never stall a claim or a cancellation.

use crate::types::{
    MembershipId, Money, ReservationId, ResourceId, SlotIds, TravelerId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Which gate refused a membership request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionStage {
    /// The organizer said no.
    Host,
    /// The platform said no.
    Platform,
    /// The group filled during the approval window.
    Capacity,
}

/// A fact about a reservation or membership lifecycle transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BookingEvent {
    /// Capacity was provisionally claimed for a reservation.
    ReservationHeld {
        /// The reservation.
        reservation_id: ReservationId,
        /// Resource claimed against.
        resource_id: ResourceId,
        /// Seat labels granted (empty for anonymous-slot resources).
        slot_ids: SlotIds,
        /// When the hold was taken.
        at: DateTime<Utc>,
    },
    /// A claim was refused and the reservation rejected.
    ReservationRejected {
        /// The reservation.
        reservation_id: ReservationId,
        /// Resource the claim targeted.
        resource_id: ResourceId,
        /// When the claim was refused.
        at: DateTime<Utc>,
    },
    /// Payment was confirmed; the booking is binding.
    ReservationConfirmed {
        /// The reservation.
        reservation_id: ReservationId,
        /// Resource booked.
        resource_id: ResourceId,
        /// Amount captured upstream.
        paid_amount: Money,
        /// When payment was confirmed.
        at: DateTime<Utc>,
    },
    /// A reservation was cancelled and its capacity released.
    ReservationCancelled {
        /// The reservation.
        reservation_id: ReservationId,
        /// Resource released.
        resource_id: ResourceId,
        /// Refund owed per the resource's policy.
        refund: Money,
        /// When the cancellation happened.
        at: DateTime<Utc>,
    },
    /// A traveler asked to join a group tour.
    MembershipRequested {
        /// The membership request.
        membership_id: MembershipId,
        /// The group tour.
        resource_id: ResourceId,
        /// Who asked.
        requester: TravelerId,
        /// When the request was filed.
        at: DateTime<Utc>,
    },
    /// A membership request passed both gates and holds capacity.
    MembershipApproved {
        /// The membership request.
        membership_id: MembershipId,
        /// The group tour.
        resource_id: ResourceId,
        /// The approved member.
        requester: TravelerId,
        /// When final approval landed.
        at: DateTime<Utc>,
    },
    /// A membership request was refused.
    MembershipRejected {
        /// The membership request.
        membership_id: MembershipId,
        /// The group tour.
        resource_id: ResourceId,
        /// Which gate refused it.
        stage: RejectionStage,
        /// When the refusal landed.
        at: DateTime<Utc>,
    },
    /// An approved member left (or was removed); capacity released.
    MembershipWithdrawn {
        /// The membership request.
        membership_id: MembershipId,
        /// The group tour.
        resource_id: ResourceId,
        /// True when the organizer removed the member rather than the
        /// member leaving.
        by_organizer: bool,
        /// When the member left.
        at: DateTime<Utc>,
    },
}

impl BookingEvent {
    /// Stable event name, `reservation.held` style, for log fields and
    /// downstream topic routing.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReservationHeld { .. } => "reservation.held",
            Self::ReservationRejected { .. } => "reservation.rejected",
            Self::ReservationConfirmed { .. } => "reservation.confirmed",
            Self::ReservationCancelled { .. } => "reservation.cancelled",
            Self::MembershipRequested { .. } => "membership.requested",
            Self::MembershipApproved { .. } => "membership.approved",
            Self::MembershipRejected { .. } => "membership.rejected",
            Self::MembershipWithdrawn { .. } => "membership.withdrawn",
        }
    }
}

/// Sink for lifecycle events.
///
/// Implementations must not block: the engine publishes while holding a
/// record lock.
pub trait EventSink: Send + Sync {
    /// Publish one event. Infallible by contract; sinks swallow their own
    /// delivery problems.
    fn publish(&self, event: BookingEvent);
}

/// Sink that drops every event; the default when an embedder does not care.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: BookingEvent) {}
}

/// Fan-out sink over a tokio broadcast channel.
///
/// Subscribers that lag past the channel capacity lose oldest events, which
/// is acceptable for notifications (delivery guarantees are the embedding
/// service's concern).
#[derive(Clone, Debug)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<BookingEvent>,
}

impl BroadcastEventSink {
    /// Create a sink buffering up to `capacity` undelivered events per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Open a new subscription; only events published afterwards are seen.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: BookingEvent) {
        tracing::debug!(event = event.name(), "publishing booking event");
        // send only errors when no receiver is subscribed; that is fine.
        let _ = self.sender.send(event);
    }
}
