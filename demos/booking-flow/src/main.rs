//! Booking flow walkthrough binary
//!
//! Drives the two tripdesk reservation styles end to end: a numbered-seat
//! bus trip (immediate claim, seat race, cancellation refund) and a group
//! tour (host + platform approval with deferred capacity claim).

use std::sync::Arc;

use chrono::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripdesk_core::{
    seatmap, ApprovalWorkflow, BroadcastEventSink, CapacityLedger, ClaimRequest, Clock, Decision,
    EventSink, Money, ReservationDraft, ReservationProcessor, SlotId, SlotStatus, TravelerId,
    UnitKind,
};
use tripdesk_testing::{fixtures, AdjustableClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_flow=debug,tripdesk_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Tripdesk Booking Flow Walkthrough ===\n");

    let clock = Arc::new(AdjustableClock::new(chrono::Utc::now()));
    let ledger = Arc::new(CapacityLedger::new());
    let events = Arc::new(BroadcastEventSink::new(64));
    let mut event_feed = events.subscribe();

    bus_trip_flow(
        Arc::clone(&ledger),
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&events) as Arc<dyn EventSink>,
        &clock,
    )
    .await?;

    group_tour_flow(
        Arc::clone(&ledger),
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&events) as Arc<dyn EventSink>,
    )
    .await?;

    println!("\n--- Event feed ---");
    while let Ok(event) = event_feed.try_recv() {
        println!("  {}", event.name());
    }

    println!("\n=== Walkthrough Complete ===");
    Ok(())
}

/// Numbered-seat path: submit claims capacity immediately, losers are told
/// up front, cancellation refunds by policy and frees the seat.
async fn bus_trip_flow(
    ledger: Arc<CapacityLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    wall: &AdjustableClock,
) -> anyhow::Result<()> {
    println!(">>> Part 1: numbered-seat bus trip");

    let departure = wall.now() + Duration::days(3);
    let trip = fixtures::bus_trip(departure);
    let trip_id = trip.id;
    let layout = match &trip.unit_kind {
        UnitKind::NumberedSeat(layout) => layout.clone(),
        UnitKind::AnonymousSlot { .. } => anyhow::bail!("bus trip must be numbered-seat"),
    };
    ledger.register(trip).await?;

    let processor = ReservationProcessor::new(Arc::clone(&ledger), clock, events);
    let (alice, bruno) = (TravelerId::new(), TravelerId::new());

    let held = processor
        .submit(ReservationDraft {
            resource_id: trip_id,
            requester: alice,
            claim: ClaimRequest::seats([SlotId::new("A1"), SlotId::new("A2")]),
        })
        .await?;
    println!("  alice holds A1+A2 (reservation {})", held.id);

    let contested = processor
        .submit(ReservationDraft {
            resource_id: trip_id,
            requester: bruno,
            claim: ClaimRequest::seats([SlotId::new("A2")]),
        })
        .await;
    match contested {
        Err(err) => println!("  bruno's A2 claim refused: {err}"),
        Ok(_) => anyhow::bail!("A2 should already be held"),
    }

    processor
        .confirm_payment(held.id, Money::from_cents(15_800))
        .await?;
    println!("  alice paid {}", Money::from_cents(15_800));

    // 30 hours out lands in the 75% refund tier.
    wall.set(departure - Duration::hours(30));
    let cancelled = processor.cancel(held.id).await?;
    println!(
        "  alice cancelled 30h before departure, refund {}",
        cancelled
            .refund_amount
            .unwrap_or(Money::ZERO)
    );

    let snapshot = ledger.occupancy_snapshot(trip_id).await?;
    let free = seatmap::project(&layout, &snapshot)?
        .into_iter()
        .filter(|cell| {
            matches!(
                cell,
                seatmap::SeatMapCell::Seat {
                    status: SlotStatus::Free,
                    ..
                }
            )
        })
        .count();
    println!("  seat map shows {free} free seats again\n");
    Ok(())
}

/// Group-tour path: membership needs organizer and platform approval, and
/// capacity is only claimed at the final approval.
async fn group_tour_flow(
    ledger: Arc<CapacityLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
) -> anyhow::Result<()> {
    println!(">>> Part 2: group tour approvals");

    let start = clock.now() + Duration::days(21);
    let group = fixtures::group_tour(start, 3);
    let (tour_id, organizer) = (group.resource_id, group.organizer);

    let workflow = ApprovalWorkflow::new(ledger, clock, events);
    workflow.register_group(group).await?;
    println!(
        "  group registered, members {}/3 (organizer counts)",
        workflow.current_members(tour_id).await?
    );

    let carol = workflow.request(tour_id, TravelerId::new()).await?;
    let dana = workflow.request(tour_id, TravelerId::new()).await?;
    println!("  carol and dana requested membership");

    workflow
        .host_decide(carol.id, organizer, Decision::Approve)
        .await?;
    workflow
        .host_decide(dana.id, organizer, Decision::Approve)
        .await?;
    println!("  organizer approved both, awaiting platform clearance");
    println!(
        "  members still {}/3: nothing claimed before final approval",
        workflow.current_members(tour_id).await?
    );

    workflow.platform_decide(carol.id, Decision::Approve).await?;
    workflow.platform_decide(dana.id, Decision::Approve).await?;
    println!(
        "  platform cleared both, members {}/3",
        workflow.current_members(tour_id).await?
    );

    // The group is now full. A late request gets through both approvals
    // only to lose at the capacity claim.
    let late = workflow.request(tour_id, TravelerId::new()).await?;
    workflow
        .host_decide(late.id, organizer, Decision::Approve)
        .await?;
    match workflow.platform_decide(late.id, Decision::Approve).await {
        Err(err) => println!("  late joiner rejected at claim time: {err}"),
        Ok(_) => anyhow::bail!("group was already full"),
    }

    workflow.withdraw(dana.id, dana.requester).await?;
    println!(
        "  dana withdrew, members back to {}/3",
        workflow.current_members(tour_id).await?
    );
    Ok(())
}
