//! End-to-end booking scenarios across processor, ledger, seat map, refund
//! calculator and approval workflow.
//!
//! Run with: `cargo test --test booking_flow_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tripdesk_core::{
    seatmap, ApprovalWorkflow, BookingError, BookingEvent, CapacityLedger, ClaimRequest,
    Decision, MembershipState, Money, RefundPolicy, RefundTier, Reservation, ReservationDraft,
    ReservationProcessor, ReservationState, Resource, ResourceId, SeatLayout, SlotId,
    SlotStatus, TravelerId, UnitKind,
};
use tripdesk_testing::{fixtures, AdjustableClock, RecordingEventSink};

fn booking_day() -> chrono::DateTime<chrono::Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
}

/// A two-seat shuttle with a "50% beyond 6 hours" refund policy.
fn two_seat_shuttle(start: chrono::DateTime<chrono::Utc>) -> Resource {
    Resource {
        id: ResourceId::new(),
        start_time: start,
        unit_kind: UnitKind::NumberedSeat(SeatLayout::new(1, 2, [])),
        closing_policy: None,
        refund_policy: RefundPolicy::new([RefundTier::new(6, 50)], 0),
    }
}

fn seat_draft(resource_id: ResourceId, requester: TravelerId, label: &str) -> ReservationDraft {
    ReservationDraft {
        resource_id,
        requester,
        claim: ClaimRequest::seats([SlotId::new(label)]),
    }
}

/// The race-and-refund scenario: two clients contend for seat A1, the loser
/// re-quotes onto A2, and the winner later cancels 10 hours before
/// departure for a 50% refund that frees A1 again.
#[tokio::test]
async fn seat_race_then_policy_refund_and_release() {
    let start = booking_day() + Duration::hours(24);
    let resource = two_seat_shuttle(start);
    let resource_id = resource.id;
    let layout = match &resource.unit_kind {
        UnitKind::NumberedSeat(layout) => layout.clone(),
        UnitKind::AnonymousSlot { .. } => unreachable!(),
    };

    let ledger = Arc::new(CapacityLedger::new());
    ledger.register(resource).await.unwrap();
    let clock = Arc::new(AdjustableClock::new(booking_day()));
    let events = Arc::new(RecordingEventSink::default());
    let processor = ReservationProcessor::new(
        Arc::clone(&ledger),
        Arc::clone(&clock) as Arc<dyn tripdesk_core::Clock>,
        Arc::clone(&events) as Arc<dyn tripdesk_core::EventSink>,
    );

    let (alice, bruno) = (TravelerId::new(), TravelerId::new());

    // Client 1 takes A1.
    let booking = processor
        .submit(seat_draft(resource_id, alice, "A1"))
        .await
        .unwrap();
    assert_eq!(booking.state, ReservationState::Held);

    // Client 2 loses the race for A1 and re-quotes.
    let err = processor
        .submit(seat_draft(resource_id, bruno, "A1"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable { .. }));

    let snapshot = ledger.occupancy_snapshot(resource_id).await.unwrap();
    let cells = seatmap::project(&layout, &snapshot).unwrap();
    let free_labels: Vec<&SlotId> = cells
        .iter()
        .filter_map(|cell| match cell {
            seatmap::SeatMapCell::Seat {
                slot_id,
                status: SlotStatus::Free,
                ..
            } => Some(slot_id),
            _ => None,
        })
        .collect();
    assert_eq!(free_labels, vec![&SlotId::new("A2")]);

    let rebooked = processor
        .submit(seat_draft(resource_id, bruno, "A2"))
        .await
        .unwrap();
    assert_eq!(rebooked.state, ReservationState::Held);

    // Client 1 pays, then cancels 10 hours before departure: the 6-hour
    // tier applies and half of the 120.00 comes back.
    processor
        .confirm_payment(booking.id, Money::from_cents(12_000))
        .await
        .unwrap();
    clock.set(start - Duration::hours(10));
    let cancelled = processor.cancel(booking.id).await.unwrap();
    assert_eq!(cancelled.state, ReservationState::Cancelled);
    assert_eq!(cancelled.refund_amount, Some(Money::from_cents(6_000)));

    // A1 is observable as free again in the next snapshot.
    let snapshot = ledger.occupancy_snapshot(resource_id).await.unwrap();
    assert_eq!(
        snapshot,
        tripdesk_core::OccupancySnapshot::Numbered {
            free: vec![SlotId::new("A1")],
            held: vec![SlotId::new("A2")],
        }
    );

    assert_eq!(
        events.names(),
        vec![
            "reservation.held",
            "reservation.rejected",
            "reservation.held",
            "reservation.confirmed",
            "reservation.cancelled",
        ]
    );
}

/// Refund tiers degrade as departure approaches; duplicate cancellations
/// stay no-ops whatever the clock says.
#[tokio::test]
async fn later_cancellations_refund_less() {
    let start = booking_day() + Duration::days(5);
    let clock = Arc::new(AdjustableClock::new(booking_day()));
    let ledger = Arc::new(CapacityLedger::new());
    let resource = fixtures::tour_instance(start, 10);
    let resource_id = resource.id;
    ledger.register(resource).await.unwrap();
    let processor = ReservationProcessor::new(
        Arc::clone(&ledger),
        Arc::clone(&clock) as Arc<dyn tripdesk_core::Clock>,
        Arc::new(tripdesk_core::NullEventSink),
    );

    async fn book_and_pay(
        processor: &ReservationProcessor,
        resource_id: ResourceId,
    ) -> Reservation {
        let reservation = processor
            .submit(ReservationDraft {
                resource_id,
                requester: TravelerId::new(),
                claim: ClaimRequest::Quantity(1),
            })
            .await
            .unwrap();
        processor
            .confirm_payment(reservation.id, Money::from_cents(10_000))
            .await
            .unwrap()
    }

    // 48h out: full refund.
    let generous = book_and_pay(&processor, resource_id).await;
    clock.set(start - Duration::hours(48));
    let generous = processor.cancel(generous.id).await.unwrap();
    assert_eq!(generous.refund_amount, Some(Money::from_cents(10_000)));

    // 7h out: 50%.
    let tight = book_and_pay(&processor, resource_id).await;
    clock.set(start - Duration::hours(7));
    let tight = processor.cancel(tight.id).await.unwrap();
    assert_eq!(tight.refund_amount, Some(Money::from_cents(5_000)));

    // 1h out: the 10% fallback.
    let late = book_and_pay(&processor, resource_id).await;
    clock.set(start - Duration::hours(1));
    let late = processor.cancel(late.id).await.unwrap();
    assert_eq!(late.refund_amount, Some(Money::from_cents(1_000)));

    // Re-cancelling the generous booking now must not recompute anything.
    let again = processor.cancel(generous.id).await.unwrap();
    assert_eq!(again.refund_amount, Some(Money::from_cents(10_000)));

    assert_eq!(ledger.held_count(resource_id).await.unwrap(), 0);
}

/// The group-tour approval scenario: three-member group, organizer counts
/// as one, and of the two requests pending platform approval for the final
/// two slots, the second loses only when the group actually fills.
#[tokio::test]
async fn group_fills_during_platform_approval_window() {
    let start = booking_day() + Duration::days(14);
    let ledger = Arc::new(CapacityLedger::new());
    let events = Arc::new(RecordingEventSink::default());
    let workflow = ApprovalWorkflow::new(
        Arc::clone(&ledger),
        Arc::new(AdjustableClock::new(booking_day())) as Arc<dyn tripdesk_core::Clock>,
        Arc::clone(&events) as Arc<dyn tripdesk_core::EventSink>,
    );

    let group = fixtures::group_tour(start, 3);
    let (resource_id, organizer) = (group.resource_id, group.organizer);
    workflow.register_group(group).await.unwrap();
    assert_eq!(workflow.current_members(resource_id).await.unwrap(), 1);

    // One member is already in, taking the group to 2 of 3.
    let settled = workflow.request(resource_id, TravelerId::new()).await.unwrap();
    let settled = workflow
        .host_decide(settled.id, organizer, Decision::Approve)
        .await
        .unwrap();
    workflow
        .platform_decide(settled.id, Decision::Approve)
        .await
        .unwrap();
    assert_eq!(workflow.current_members(resource_id).await.unwrap(), 2);

    // Two more requests reach pending_platform for the single last slot.
    let quick = workflow.request(resource_id, TravelerId::new()).await.unwrap();
    let slow = workflow.request(resource_id, TravelerId::new()).await.unwrap();
    workflow
        .host_decide(quick.id, organizer, Decision::Approve)
        .await
        .unwrap();
    workflow
        .host_decide(slow.id, organizer, Decision::Approve)
        .await
        .unwrap();

    workflow.platform_decide(quick.id, Decision::Approve).await.unwrap();
    let err = workflow
        .platform_decide(slow.id, Decision::Approve)
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::CapacityExceededOnApproval { resource_id });
    assert_eq!(
        workflow.membership(slow.id).await.unwrap().state,
        MembershipState::RejectedCapacity
    );
    assert_eq!(workflow.current_members(resource_id).await.unwrap(), 3);

    // The approved-member tally always matches the ledger: a withdrawal
    // reopens the slot and the rejected traveler can try again.
    let quick_member = workflow.membership(quick.id).await.unwrap();
    workflow
        .withdraw(quick.id, quick_member.requester)
        .await
        .unwrap();
    assert_eq!(workflow.current_members(resource_id).await.unwrap(), 2);

    let retry = workflow
        .request(resource_id, workflow.membership(slow.id).await.unwrap().requester)
        .await
        .unwrap();
    let retry = workflow
        .host_decide(retry.id, organizer, Decision::Approve)
        .await
        .unwrap();
    let retry = workflow.platform_decide(retry.id, Decision::Approve).await.unwrap();
    assert_eq!(retry.state, MembershipState::Approved);
    assert_eq!(workflow.current_members(resource_id).await.unwrap(), 3);

    let rejected_capacity_events = events
        .events()
        .iter()
        .filter(|event| {
            matches!(
                event,
                BookingEvent::MembershipRejected {
                    stage: tripdesk_core::RejectionStage::Capacity,
                    ..
                }
            )
        })
        .count();
    assert_eq!(rejected_capacity_events, 1);
}
