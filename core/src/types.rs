//! Core domain types for the Tripdesk reservation engine.
//!
//! Everything here is a plain value object: identifiers, money, capacity
//! descriptors, refund policies and the reservation / membership records
//! themselves. Behavior lives in the `ledger`, `reservation`, `approval`,
//! `refund` and `seatmap` modules; this module only defines the data they
//! operate on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a bookable capacity pool (one bus trip on one date,
/// one tour instance, one group tour).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Creates a new random `ResourceId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID (e.g. supplied by the catalog service).
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a reservation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Creates a new random `ReservationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a group-tour membership request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembershipId(Uuid);

impl MembershipId {
    /// Creates a new random `MembershipId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for MembershipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MembershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a traveler (requester or group organizer).
///
/// Supplied by the identity collaborator; the engine never authenticates it,
/// it only compares identifiers for ownership checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TravelerId(Uuid);

impl TravelerId {
    /// Creates a new random `TravelerId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TravelerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TravelerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable label for one numbered seat within a resource, e.g. `"A1"`.
///
/// Labels are generated by the resource's [`SeatLayout`]; the ledger treats
/// them as opaque keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(String);

impl SlotId {
    /// Wrap a seat label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slot lists are almost always a handful of seats; `SmallVec` keeps the
/// common case off the heap.
pub type SlotIds = SmallVec<[SlotId; 4]>;

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Takes an integer percentage of the amount, rounding down.
    ///
    /// Percentages above 100 are clamped; the widening multiply cannot
    /// overflow, so the operation is total.
    #[must_use]
    pub const fn percent(self, percent: u8) -> Self {
        let pct = if percent > 100 { 100 } else { percent };
        let wide = (self.0 as u128 * pct as u128) / 100;
        #[allow(clippy::cast_possible_truncation)] // <= self.0, fits u64
        let cents = wide as u64;
        Self(cents)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Capacity descriptors
// ============================================================================

/// Physical seat grid for a `numbered-seat` resource.
///
/// Rows are labeled `A`, `B`, … (`AA` after `Z`), columns are numbered from
/// 1. `aisles_after` lists the columns an aisle follows, purely for the seat
/// map projection; aisles consume no capacity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatLayout {
    /// Number of seat rows (at least 1).
    pub rows: u16,
    /// Number of seat columns per row (at least 1).
    pub columns: u16,
    /// Columns after which an aisle runs, e.g. `[2]` for a 2+2 bus.
    pub aisles_after: SmallVec<[u16; 2]>,
}

impl SeatLayout {
    /// Create a layout with the given grid and aisle positions.
    #[must_use]
    pub fn new(rows: u16, columns: u16, aisles_after: impl IntoIterator<Item = u16>) -> Self {
        Self {
            rows,
            columns,
            aisles_after: aisles_after.into_iter().collect(),
        }
    }

    /// Total number of seats in the grid.
    #[must_use]
    pub const fn seat_count(&self) -> u32 {
        self.rows as u32 * self.columns as u32
    }

    /// Spreadsheet-style label for a zero-based row index (`A`, `B`, … `AA`).
    #[must_use]
    pub fn row_label(mut row: u16) -> String {
        let mut label = String::new();
        loop {
            #[allow(clippy::cast_possible_truncation)] // row % 26 < 26
            label.insert(0, (b'A' + (row % 26) as u8) as char);
            if row < 26 {
                break;
            }
            row = row / 26 - 1;
        }
        label
    }

    /// Label for the seat at a zero-based row and column, e.g. `(0, 0)` → `A1`.
    #[must_use]
    pub fn seat_label(row: u16, column: u16) -> SlotId {
        SlotId::new(format!("{}{}", Self::row_label(row), column + 1))
    }

    /// All seat labels in row-major order.
    #[must_use]
    pub fn slot_ids(&self) -> Vec<SlotId> {
        let mut ids = Vec::with_capacity(self.seat_count() as usize);
        for row in 0..self.rows {
            for column in 0..self.columns {
                ids.push(Self::seat_label(row, column));
            }
        }
        ids
    }
}

/// How a resource's capacity is unitized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// Individually identified seats laid out on a grid (bus trips).
    NumberedSeat(SeatLayout),
    /// Interchangeable units tracked only as a count (tour slots, group
    /// memberships).
    AnonymousSlot {
        /// Total number of units.
        capacity_total: u32,
    },
}

/// Booking cutoff relative to the resource's start time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingPolicy {
    /// Booking closes this many minutes before start.
    pub minutes_before_start: u32,
}

impl ClosingPolicy {
    /// Closing policy expressed in minutes before start.
    #[must_use]
    pub const fn minutes(minutes_before_start: u32) -> Self {
        Self {
            minutes_before_start,
        }
    }

    /// Closing policy expressed in whole hours before start.
    #[must_use]
    pub const fn hours(hours: u32) -> Self {
        Self {
            minutes_before_start: hours * 60,
        }
    }

    /// The instant after which new reservations are refused.
    #[must_use]
    pub fn cutoff(&self, start_time: DateTime<Utc>) -> DateTime<Utc> {
        start_time - Duration::minutes(i64::from(self.minutes_before_start))
    }
}

/// One refund tier: cancelling at least `hours_before_start` hours ahead of
/// the start time refunds `refund_percent` of the paid amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundTier {
    /// Minimum lead time, in hours before start, for this tier to apply.
    pub hours_before_start: u32,
    /// Percentage of the paid amount refunded (0–100).
    pub refund_percent: u8,
}

impl RefundTier {
    /// Create a tier, clamping the percentage to 100.
    #[must_use]
    pub const fn new(hours_before_start: u32, refund_percent: u8) -> Self {
        Self {
            hours_before_start,
            refund_percent: if refund_percent > 100 {
                100
            } else {
                refund_percent
            },
        }
    }
}

/// Declarative cancellation refund schedule, attached to a resource by the
/// catalog service and immutable thereafter.
///
/// Tiers are kept sorted most-generous-first (descending lead time), so the
/// calculator can take the first tier whose threshold the cancellation lead
/// time meets. The boundary is inclusive: cancelling exactly
/// `hours_before_start` hours ahead earns that tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicy {
    tiers: Vec<RefundTier>,
    no_refund_percent: u8,
}

impl RefundPolicy {
    /// Build a policy from tiers in any order plus the fallback percentage
    /// applied when no tier matches.
    #[must_use]
    pub fn new(tiers: impl IntoIterator<Item = RefundTier>, no_refund_percent: u8) -> Self {
        let mut tiers: Vec<RefundTier> = tiers.into_iter().collect();
        tiers.sort_by(|a, b| b.hours_before_start.cmp(&a.hours_before_start));
        Self {
            tiers,
            no_refund_percent: if no_refund_percent > 100 {
                100
            } else {
                no_refund_percent
            },
        }
    }

    /// Policy that never refunds anything.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            tiers: Vec::new(),
            no_refund_percent: 0,
        }
    }

    /// Tiers, most generous (longest lead time) first.
    #[must_use]
    pub fn tiers(&self) -> &[RefundTier] {
        &self.tiers
    }

    /// Fallback percentage when no tier matches.
    #[must_use]
    pub const fn no_refund_percent(&self) -> u8 {
        self.no_refund_percent
    }
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// A bookable capacity pool: one bus trip on one date, one tour instance, or
/// one group tour.
///
/// Created when the catalog item is published; capacity is immutable
/// afterwards (operator resizes are out of scope).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier.
    pub id: ResourceId,
    /// When the trip/tour starts; anchors the refund and closing policies.
    pub start_time: DateTime<Utc>,
    /// Seat grid or anonymous unit count.
    pub unit_kind: UnitKind,
    /// Optional booking cutoff before start.
    pub closing_policy: Option<ClosingPolicy>,
    /// Cancellation refund schedule.
    pub refund_policy: RefundPolicy,
}

impl Resource {
    /// Total capacity of the pool.
    #[must_use]
    pub const fn capacity_total(&self) -> u32 {
        match &self.unit_kind {
            UnitKind::NumberedSeat(layout) => layout.seat_count(),
            UnitKind::AnonymousSlot { capacity_total } => *capacity_total,
        }
    }
}

// ============================================================================
// Claims and occupancy views
// ============================================================================

/// What a caller asks the ledger for: specific seats, or a unit count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimRequest {
    /// Specific seat labels on a `numbered-seat` resource.
    Seats(SlotIds),
    /// A unit count on an `anonymous-slot` resource.
    Quantity(u32),
}

impl ClaimRequest {
    /// Convenience constructor for a seat-label claim.
    #[must_use]
    pub fn seats(labels: impl IntoIterator<Item = SlotId>) -> Self {
        Self::Seats(labels.into_iter().collect())
    }

    /// Number of capacity units this request covers.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        match self {
            Self::Seats(slots) => slots.len() as u32,
            Self::Quantity(quantity) => *quantity,
        }
    }
}

/// Successful outcome of [`ClaimRequest`]: the units now held.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimGrant {
    /// Seat labels granted (empty for anonymous-slot resources).
    pub slot_ids: SlotIds,
    /// Number of units granted.
    pub quantity: u32,
}

/// Occupancy of one seat in a snapshot or seat map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    /// Available to claim.
    Free,
    /// Claimed by a live reservation.
    Held,
}

/// Consistent point-in-time view of a resource's occupancy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancySnapshot {
    /// Per-seat view for `numbered-seat` resources.
    Numbered {
        /// Seats currently free, in label order.
        free: Vec<SlotId>,
        /// Seats currently held, in label order.
        held: Vec<SlotId>,
    },
    /// Counter view for `anonymous-slot` resources.
    Anonymous {
        /// Total units.
        capacity_total: u32,
        /// Units currently held.
        held: u32,
    },
}

impl OccupancySnapshot {
    /// Units currently held.
    #[must_use]
    pub fn held_count(&self) -> u32 {
        match self {
            Self::Numbered { held, .. } => held.len() as u32,
            Self::Anonymous { held, .. } => *held,
        }
    }

    /// Total capacity of the resource.
    #[must_use]
    pub fn capacity_total(&self) -> u32 {
        match self {
            Self::Numbered { free, held } => (free.len() + held.len()) as u32,
            Self::Anonymous { capacity_total, .. } => *capacity_total,
        }
    }

    /// Units currently free.
    #[must_use]
    pub fn free_count(&self) -> u32 {
        self.capacity_total() - self.held_count()
    }
}

// ============================================================================
// Reservation records
// ============================================================================

/// Lifecycle state of a single-party reservation.
///
/// `requested → held → confirmed`, `requested → rejected`, and
/// `{held, confirmed} → cancelled`. Terminal records are retained for audit
/// and refund history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationState {
    /// Submitted, no capacity claimed yet.
    Requested,
    /// Capacity provisionally claimed, payment not yet confirmed.
    Held,
    /// Payment confirmed; booking is binding.
    Confirmed,
    /// Claim refused (seat taken / insufficient capacity).
    Rejected,
    /// Cancelled; capacity released, refund recorded.
    Cancelled,
}

impl ReservationState {
    /// Stable lowercase name, used in errors and log fields.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Held => "held",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a traveler wants to book; input to
/// [`ReservationProcessor::submit`](crate::reservation::ReservationProcessor::submit).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDraft {
    /// Resource to book.
    pub resource_id: ResourceId,
    /// Who is booking.
    pub requester: TravelerId,
    /// Desired seats or unit count.
    pub claim: ClaimRequest,
}

/// A claim on capacity by one requester, retained through its whole
/// lifecycle (cancelled and rejected records are never deleted).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation identifier.
    pub id: ReservationId,
    /// Resource the claim targets.
    pub resource_id: ResourceId,
    /// Who booked.
    pub requester: TravelerId,
    /// The granted claim (seat labels, or a bare quantity).
    pub claim: ClaimRequest,
    /// Current lifecycle state.
    pub state: ReservationState,
    /// When the reservation was submitted.
    pub created_at: DateTime<Utc>,
    /// When payment was confirmed, if it was.
    pub payment_confirmed_at: Option<DateTime<Utc>>,
    /// Amount captured by the payment collaborator, if any.
    pub paid_amount: Option<Money>,
    /// When the reservation was cancelled, if it was.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Refund computed at cancellation, if any.
    pub refund_amount: Option<Money>,
}

// ============================================================================
// Group-tour membership records
// ============================================================================

/// A group tour as the approval workflow sees it: an anonymous-slot resource
/// plus the organizer who rules on membership requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupTour {
    /// Backing resource (capacity pool) for the group.
    pub resource_id: ResourceId,
    /// The traveler who defined the group; occupies one unit of capacity
    /// from registration and decides host approvals.
    pub organizer: TravelerId,
    /// Maximum members including the organizer.
    pub max_members: u32,
    /// Tour start, anchors the (rarely used) refund/closing policies.
    pub start_time: DateTime<Utc>,
    /// Whether the platform must also approve each membership after the
    /// host does. When false the host's approval is final and claims
    /// capacity directly.
    pub requires_platform_clearance: bool,
}

/// An approve/reject ruling by a host or the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Let the request proceed.
    Approve,
    /// Refuse the request.
    Reject,
}

/// Lifecycle state of a group-tour membership request.
///
/// `pending_host → pending_platform → approved`, with terminal rejections at
/// each gate, `rejected_capacity` when the group filled during the approval
/// window, and `withdrawn` / `removed` after approval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipState {
    /// Waiting on the organizer's ruling. No capacity claimed.
    PendingHost,
    /// Host approved; waiting on the platform's ruling. No capacity claimed.
    PendingPlatform,
    /// Fully approved; one unit of capacity held.
    Approved,
    /// Rejected by the organizer.
    RejectedHost,
    /// Rejected by the platform.
    RejectedPlatform,
    /// Approved procedurally, but the group filled during the approval
    /// window.
    RejectedCapacity,
    /// Member left after approval; capacity released.
    Withdrawn,
    /// Organizer removed the member after approval; capacity released.
    Removed,
}

impl MembershipState {
    /// Stable lowercase name, used in errors and log fields.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingHost => "pending_host",
            Self::PendingPlatform => "pending_platform",
            Self::Approved => "approved",
            Self::RejectedHost => "rejected_host",
            Self::RejectedPlatform => "rejected_platform",
            Self::RejectedCapacity => "rejected_capacity",
            Self::Withdrawn => "withdrawn",
            Self::Removed => "removed",
        }
    }

    /// A request is live while it is pending or holds capacity; a traveler
    /// may only have one live request per group.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::PendingHost | Self::PendingPlatform | Self::Approved)
    }
}

impl fmt::Display for MembershipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A traveler's request to join a group tour, gated by host and platform
/// approval before it consumes capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MembershipRequest {
    /// Membership request identifier.
    pub id: MembershipId,
    /// Group tour the request targets.
    pub resource_id: ResourceId,
    /// Who wants to join.
    pub requester: TravelerId,
    /// Current lifecycle state.
    pub state: MembershipState,
    /// When the request was filed.
    pub created_at: DateTime<Utc>,
    /// When the organizer ruled, if they have.
    pub host_decided_at: Option<DateTime<Utc>>,
    /// When the platform ruled, if it has.
    pub platform_decided_at: Option<DateTime<Utc>>,
    /// When the membership was withdrawn or removed, if it was.
    pub closed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_labels_extend_past_z() {
        assert_eq!(SeatLayout::row_label(0), "A");
        assert_eq!(SeatLayout::row_label(25), "Z");
        assert_eq!(SeatLayout::row_label(26), "AA");
        assert_eq!(SeatLayout::row_label(27), "AB");
    }

    #[test]
    fn seat_labels_are_row_major() {
        let layout = SeatLayout::new(2, 2, [1]);
        let ids = layout.slot_ids();
        assert_eq!(
            ids,
            vec![
                SlotId::new("A1"),
                SlotId::new("A2"),
                SlotId::new("B1"),
                SlotId::new("B2"),
            ]
        );
        assert_eq!(layout.seat_count(), 4);
    }

    #[test]
    fn money_percent_rounds_down_and_clamps() {
        let paid = Money::from_cents(999);
        assert_eq!(paid.percent(50), Money::from_cents(499));
        assert_eq!(paid.percent(0), Money::ZERO);
        assert_eq!(paid.percent(150), paid);
        assert_eq!(Money::ZERO.percent(100), Money::ZERO);
    }

    #[test]
    fn refund_policy_sorts_tiers_most_generous_first() {
        let policy = RefundPolicy::new(
            [RefundTier::new(6, 50), RefundTier::new(48, 100), RefundTier::new(24, 75)],
            0,
        );
        let hours: Vec<u32> = policy.tiers().iter().map(|t| t.hours_before_start).collect();
        assert_eq!(hours, vec![48, 24, 6]);
    }

    #[test]
    fn closing_policy_cutoff_precedes_start() {
        let start = Utc::now();
        let policy = ClosingPolicy::hours(2);
        assert_eq!(policy.cutoff(start), start - Duration::hours(2));
    }

    #[test]
    fn snapshot_counts_are_consistent() {
        let snapshot = OccupancySnapshot::Numbered {
            free: vec![SlotId::new("A1")],
            held: vec![SlotId::new("A2"), SlotId::new("B1")],
        };
        assert_eq!(snapshot.capacity_total(), 3);
        assert_eq!(snapshot.held_count(), 2);
        assert_eq!(snapshot.free_count(), 1);
    }
}
