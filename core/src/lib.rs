//! # Tripdesk Core
//!
//! Capacity-constrained reservation engine for a tourism booking platform:
//! bus seats, tour-package slots, and group-tour membership, claimed against
//! one authoritative ledger without over-allocation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   quote    ┌──────────────────┐
//! │    Client    │──────────▶│ SeatMapProjector  │ (read-only view)
//! └──────┬───────┘            └────────┬─────────┘
//!        │ submit / cancel             │ snapshot
//!        ▼                             ▼
//! ┌──────────────────────┐    ┌──────────────────┐
//! │ ReservationProcessor │───▶│  CapacityLedger  │◀─── ApprovalWorkflow
//! └──────────┬───────────┘    │ (per-resource    │     (group tours,
//!            │ cancel         │  critical        │      host + platform
//!            ▼                │  section)        │      approval)
//! ┌──────────────────────┐    └──────────────────┘
//! │   RefundCalculator   │  (pure: policy × timing)
//! └──────────────────────┘
//! ```
//!
//! The [`ledger::CapacityLedger`] is the single source of truth for
//! occupancy: every seat count elsewhere is a projection of it. Claims are
//! all-or-nothing and linearizable per resource; the losing side of a race
//! sees a clean `SlotUnavailable`, re-quotes, and retries.
//!
//! Two booking shapes share the ledger:
//!
//! - **Immediate claim** ([`reservation::ReservationProcessor`]): submit
//!   claims capacity right away and holds it across the payment step
//!   (`requested → held → confirmed`).
//! - **Deferred claim** ([`approval::ApprovalWorkflow`]): a group-tour
//!   membership request claims nothing until the final human approval, so
//!   slow decisions never hold capacity hostage - at the price of the
//!   explicit `rejected_capacity` outcome when the group fills first.
//!
//! Payment, identity, catalog and notification delivery are external
//! collaborators: the engine receives opaque IDs and "payment confirmed"
//! facts, and emits [`events::BookingEvent`]s for the embedder to forward.

pub mod approval;
pub mod environment;
pub mod error;
pub mod events;
pub mod ledger;
pub mod refund;
pub mod reservation;
pub mod seatmap;
pub mod types;

pub use approval::ApprovalWorkflow;
pub use environment::{Clock, SystemClock};
pub use error::{BookingError, BookingResult, PolicyReason, SlotConflict};
pub use events::{BookingEvent, BroadcastEventSink, EventSink, NullEventSink, RejectionStage};
pub use ledger::CapacityLedger;
pub use refund::compute_refund;
pub use reservation::ReservationProcessor;
pub use seatmap::{project, summarize, OccupancySummary, SeatMapCell};
pub use types::{
    ClaimGrant, ClaimRequest, ClosingPolicy, Decision, GroupTour, MembershipId,
    MembershipRequest, MembershipState, Money, OccupancySnapshot, RefundPolicy, RefundTier,
    Reservation, ReservationDraft, ReservationId, ReservationState, Resource, ResourceId,
    SeatLayout, SlotId, SlotIds, SlotStatus, TravelerId, UnitKind,
};
