//! Single-party reservation lifecycle (bus seats, tour slots).
//!
//! Splitting `held` from `confirmed` lets a seat survive the payment step
//! without double-booking it, while leaving an explicit abandonment path:
//! an external sweeper can `cancel` holds older than its policy allows
//! through the same code path a traveler uses.

use crate::environment::Clock;
use crate::error::{BookingError, BookingResult, PolicyReason};
use crate::events::{BookingEvent, EventSink};
use crate::ledger::CapacityLedger;
use crate::refund::compute_refund;
use crate::types::{
    ClaimRequest, Money, Reservation, ReservationDraft, ReservationId, ReservationState,
    ResourceId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Orchestrates the `requested → held → confirmed / rejected / cancelled`
/// state machine over the [`CapacityLedger`].
///
/// Records are never deleted; terminal reservations stay queryable for
/// audit and refund history.
pub struct ReservationProcessor {
    ledger: Arc<CapacityLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    reservations: RwLock<HashMap<ReservationId, Reservation>>,
}

impl ReservationProcessor {
    /// Create a processor over the given ledger.
    #[must_use]
    pub fn new(
        ledger: Arc<CapacityLedger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            ledger,
            clock,
            events,
            reservations: RwLock::new(HashMap::new()),
        }
    }

    /// Submit a reservation request, claiming capacity atomically.
    ///
    /// On success the reservation is `held`: capacity is claimed but the
    /// booking is not yet monetarily binding. When the claim loses a race
    /// ("someone took that seat while you were filling the form"), the
    /// record is retained as `rejected` and the `SlotUnavailable` failure
    /// is returned so the caller can re-quote from a fresh seat map.
    ///
    /// # Errors
    ///
    /// - `SlotUnavailable` when the claim cannot be satisfied.
    /// - `PolicyViolation` when the booking window has closed, the claim is
    ///   empty, or its shape does not match the resource.
    /// - `UnknownResource` for an unregistered resource.
    pub async fn submit(&self, draft: ReservationDraft) -> BookingResult<Reservation> {
        let resource = self.ledger.resource(draft.resource_id).await?;
        let now = self.clock.now();

        if let Some(closing) = resource.closing_policy {
            if now > closing.cutoff(resource.start_time) {
                return Err(BookingError::policy(PolicyReason::BookingClosed));
            }
        }

        let mut reservation = Reservation {
            id: ReservationId::new(),
            resource_id: draft.resource_id,
            requester: draft.requester,
            claim: draft.claim,
            state: ReservationState::Requested,
            created_at: now,
            payment_confirmed_at: None,
            paid_amount: None,
            cancelled_at: None,
            refund_amount: None,
        };

        match self.ledger.try_claim(draft.resource_id, &reservation.claim).await {
            Ok(grant) => {
                reservation.state = ReservationState::Held;
                // The grant is authoritative: duplicate labels in the draft
                // collapse, and the stored claim must match what is held so
                // the audit record and the eventual release agree with it.
                if matches!(reservation.claim, ClaimRequest::Seats(_)) {
                    reservation.claim = ClaimRequest::Seats(grant.slot_ids.clone());
                }
                tracing::info!(
                    reservation_id = %reservation.id,
                    resource_id = %reservation.resource_id,
                    quantity = grant.quantity,
                    "reservation held"
                );
                self.events.publish(BookingEvent::ReservationHeld {
                    reservation_id: reservation.id,
                    resource_id: reservation.resource_id,
                    slot_ids: grant.slot_ids,
                    at: now,
                });
                self.store(reservation.clone()).await;
                Ok(reservation)
            }
            Err(err @ BookingError::SlotUnavailable { .. }) => {
                reservation.state = ReservationState::Rejected;
                tracing::warn!(
                    reservation_id = %reservation.id,
                    resource_id = %reservation.resource_id,
                    error = %err,
                    "reservation rejected"
                );
                self.events.publish(BookingEvent::ReservationRejected {
                    reservation_id: reservation.id,
                    resource_id: reservation.resource_id,
                    at: now,
                });
                self.store(reservation).await;
                Err(err)
            }
            // Shape/quantity problems are caller errors; no record retained.
            Err(err) => Err(err),
        }
    }

    /// Record the payment collaborator's confirmation. Valid only from
    /// `held`.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` from any state but `held`.
    /// - `UnknownReservation` for an unknown ID.
    pub async fn confirm_payment(
        &self,
        reservation_id: ReservationId,
        paid_amount: Money,
    ) -> BookingResult<Reservation> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations
            .get_mut(&reservation_id)
            .ok_or(BookingError::UnknownReservation(reservation_id))?;

        if reservation.state != ReservationState::Held {
            return Err(BookingError::InvalidStateTransition {
                operation: "confirm_payment",
                state: reservation.state.label(),
            });
        }

        let now = self.clock.now();
        reservation.state = ReservationState::Confirmed;
        reservation.payment_confirmed_at = Some(now);
        reservation.paid_amount = Some(paid_amount);
        tracing::info!(
            reservation_id = %reservation.id,
            resource_id = %reservation.resource_id,
            paid = %paid_amount,
            "reservation confirmed"
        );
        self.events.publish(BookingEvent::ReservationConfirmed {
            reservation_id: reservation.id,
            resource_id: reservation.resource_id,
            paid_amount,
            at: now,
        });
        Ok(reservation.clone())
    }

    /// Cancel a `held` or `confirmed` reservation: compute the refund from
    /// the resource's policy, release the capacity, retain the record.
    ///
    /// Cancelling an already-cancelled reservation is an idempotent no-op
    /// returning the stored record, so duplicate cancellation retries are
    /// harmless. A `held` reservation with no captured payment runs the
    /// same policy-driven formula against a paid amount of zero.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` from `requested` or `rejected`.
    /// - `UnknownReservation` / `UnknownResource` for unknown IDs.
    pub async fn cancel(&self, reservation_id: ReservationId) -> BookingResult<Reservation> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations
            .get_mut(&reservation_id)
            .ok_or(BookingError::UnknownReservation(reservation_id))?;

        match reservation.state {
            ReservationState::Cancelled => return Ok(reservation.clone()),
            ReservationState::Held | ReservationState::Confirmed => {}
            other => {
                return Err(BookingError::InvalidStateTransition {
                    operation: "cancel",
                    state: other.label(),
                })
            }
        }

        let resource = self.ledger.resource(reservation.resource_id).await?;
        let now = self.clock.now();
        let paid = reservation.paid_amount.unwrap_or(Money::ZERO);
        let refund = compute_refund(&resource.refund_policy, resource.start_time, now, paid);

        self.ledger
            .release(reservation.resource_id, &reservation.claim)
            .await?;

        reservation.state = ReservationState::Cancelled;
        reservation.cancelled_at = Some(now);
        reservation.refund_amount = Some(refund);
        tracing::info!(
            reservation_id = %reservation.id,
            resource_id = %reservation.resource_id,
            refund = %refund,
            "reservation cancelled"
        );
        self.events.publish(BookingEvent::ReservationCancelled {
            reservation_id: reservation.id,
            resource_id: reservation.resource_id,
            refund,
            at: now,
        });
        Ok(reservation.clone())
    }

    /// Look up a reservation record by ID.
    ///
    /// # Errors
    ///
    /// `UnknownReservation` when no record exists.
    pub async fn reservation(
        &self,
        reservation_id: ReservationId,
    ) -> BookingResult<Reservation> {
        self.reservations
            .read()
            .await
            .get(&reservation_id)
            .cloned()
            .ok_or(BookingError::UnknownReservation(reservation_id))
    }

    /// All retained records for one resource, in no particular order. This
    /// is the audit view an external sweeper walks to find stale holds.
    pub async fn reservations_for(&self, resource_id: ResourceId) -> Vec<Reservation> {
        self.reservations
            .read()
            .await
            .values()
            .filter(|r| r.resource_id == resource_id)
            .cloned()
            .collect()
    }

    async fn store(&self, reservation: Reservation) {
        self.reservations
            .write()
            .await
            .insert(reservation.id, reservation);
    }
}
