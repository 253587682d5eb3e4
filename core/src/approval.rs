//! Group-tour membership, gated by host and platform approval.
//!
//! A membership request is a *request*, not a hold: unlike the bus-seat
//! flow it never touches the ledger until the final approval, so a refusal
//! leaves no capacity to clean up and slow human decisions never hold
//! capacity hostage. The claim happens inside the deciding call, which is
//! where the "group filled while you waited" outcome surfaces.
//!
//! `current_members` is always the ledger's held count for the group's
//! resource (the organizer claims one unit at registration); there is no
//! second counter to drift under concurrent approvals.

use crate::environment::Clock;
use crate::error::{BookingError, BookingResult, PolicyReason};
use crate::events::{BookingEvent, EventSink, RejectionStage};
use crate::ledger::CapacityLedger;
use crate::types::{
    ClaimRequest, Decision, GroupTour, MembershipId, MembershipRequest, MembershipState,
    RefundPolicy, Resource, ResourceId, TravelerId, UnitKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One unit, the shape of every membership claim and release.
const ONE_MEMBER: ClaimRequest = ClaimRequest::Quantity(1);

/// Orchestrates the membership request state machine for group tours.
pub struct ApprovalWorkflow {
    ledger: Arc<CapacityLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    groups: RwLock<HashMap<ResourceId, GroupTour>>,
    requests: RwLock<HashMap<MembershipId, MembershipRequest>>,
}

impl ApprovalWorkflow {
    /// Create a workflow over the given ledger.
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
            groups: RwLock::new(HashMap::new()),
            requests: RwLock::new(HashMap::new()),
        }
    }

    /// Register a group tour: an anonymous-slot resource of `max_members`
    /// units with the organizer's unit claimed immediately.
    ///
    /// # Errors
    ///
    /// `PolicyViolation` on zero `max_members` or a duplicate resource ID.
    pub async fn register_group(&self, group: GroupTour) -> BookingResult<()> {
        self.ledger
            .register(Resource {
                id: group.resource_id,
                start_time: group.start_time,
                unit_kind: UnitKind::AnonymousSlot {
                    capacity_total: group.max_members,
                },
                closing_policy: None,
                refund_policy: RefundPolicy::none(),
            })
            .await?;
        // The organizer counts against capacity from day one.
        self.ledger.try_claim(group.resource_id, &ONE_MEMBER).await?;
        tracing::info!(
            resource_id = %group.resource_id,
            organizer = %group.organizer,
            max_members = group.max_members,
            "registered group tour"
        );
        self.groups.write().await.insert(group.resource_id, group);
        Ok(())
    }

    /// File a membership request. Created in `pending_host`; no capacity is
    /// claimed.
    ///
    /// # Errors
    ///
    /// - `PolicyViolation` when the organizer tries to join their own group
    ///   or the requester already has a live request on it.
    /// - `UnknownResource` / `PolicyViolation(NotAGroupTour)` for bad IDs.
    pub async fn request(
        &self,
        resource_id: ResourceId,
        requester: TravelerId,
    ) -> BookingResult<MembershipRequest> {
        let group = self.group(resource_id).await?;
        if requester == group.organizer {
            return Err(BookingError::policy(PolicyReason::OrganizerCannotJoin));
        }

        let mut requests = self.requests.write().await;
        let already_live = requests.values().any(|r| {
            r.resource_id == resource_id && r.requester == requester && r.state.is_live()
        });
        if already_live {
            return Err(BookingError::policy(PolicyReason::DuplicateRequest));
        }

        let now = self.clock.now();
        let membership = MembershipRequest {
            id: MembershipId::new(),
            resource_id,
            requester,
            state: MembershipState::PendingHost,
            created_at: now,
            host_decided_at: None,
            platform_decided_at: None,
            closed_at: None,
        };
        tracing::info!(
            membership_id = %membership.id,
            resource_id = %resource_id,
            requester = %requester,
            "membership requested"
        );
        self.events.publish(BookingEvent::MembershipRequested {
            membership_id: membership.id,
            resource_id,
            requester,
            at: now,
        });
        requests.insert(membership.id, membership.clone());
        Ok(membership)
    }

    /// The organizer's ruling on a `pending_host` request.
    ///
    /// Approval advances to `pending_platform` when the group requires
    /// platform clearance; otherwise the host's approval is final and the
    /// capacity claim happens here.
    ///
    /// # Errors
    ///
    /// - `PolicyViolation(NotOrganizer)` when `actor` is not the group's
    ///   organizer.
    /// - `InvalidStateTransition` from any state but `pending_host`.
    /// - `CapacityExceededOnApproval` when the direct-claim path loses the
    ///   last unit (request lands in `rejected_capacity`).
    /// - `UnknownMembership` for an unknown ID.
    pub async fn host_decide(
        &self,
        membership_id: MembershipId,
        actor: TravelerId,
        decision: Decision,
    ) -> BookingResult<MembershipRequest> {
        let mut requests = self.requests.write().await;
        let membership = requests
            .get_mut(&membership_id)
            .ok_or(BookingError::UnknownMembership(membership_id))?;
        let group = self.group(membership.resource_id).await?;
        if actor != group.organizer {
            return Err(BookingError::policy(PolicyReason::NotOrganizer));
        }
        if membership.state != MembershipState::PendingHost {
            return Err(BookingError::InvalidStateTransition {
                operation: "host_decide",
                state: membership.state.label(),
            });
        }

        let now = self.clock.now();
        membership.host_decided_at = Some(now);
        match decision {
            Decision::Reject => {
                membership.state = MembershipState::RejectedHost;
                tracing::info!(membership_id = %membership.id, "membership rejected by host");
                self.events.publish(BookingEvent::MembershipRejected {
                    membership_id: membership.id,
                    resource_id: membership.resource_id,
                    stage: RejectionStage::Host,
                    at: now,
                });
                Ok(membership.clone())
            }
            Decision::Approve if group.requires_platform_clearance => {
                membership.state = MembershipState::PendingPlatform;
                tracing::info!(
                    membership_id = %membership.id,
                    "membership approved by host, awaiting platform"
                );
                Ok(membership.clone())
            }
            Decision::Approve => {
                // No platform gate on this group: the host's approval is
                // the final approval and claims the unit now.
                Self::claim_for_member(&self.ledger, &*self.events, membership, now).await
            }
        }
    }

    /// The platform's ruling on a `pending_platform` request. Approval
    /// claims one unit; the ledger refusing it means the group filled
    /// during the approval window and the request lands in
    /// `rejected_capacity`.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` from any state but `pending_platform`.
    /// - `CapacityExceededOnApproval` when the group filled in the interim.
    /// - `UnknownMembership` for an unknown ID.
    pub async fn platform_decide(
        &self,
        membership_id: MembershipId,
        decision: Decision,
    ) -> BookingResult<MembershipRequest> {
        let mut requests = self.requests.write().await;
        let membership = requests
            .get_mut(&membership_id)
            .ok_or(BookingError::UnknownMembership(membership_id))?;
        if membership.state != MembershipState::PendingPlatform {
            return Err(BookingError::InvalidStateTransition {
                operation: "platform_decide",
                state: membership.state.label(),
            });
        }

        let now = self.clock.now();
        membership.platform_decided_at = Some(now);
        match decision {
            Decision::Reject => {
                membership.state = MembershipState::RejectedPlatform;
                tracing::info!(membership_id = %membership.id, "membership rejected by platform");
                self.events.publish(BookingEvent::MembershipRejected {
                    membership_id: membership.id,
                    resource_id: membership.resource_id,
                    stage: RejectionStage::Platform,
                    at: now,
                });
                Ok(membership.clone())
            }
            Decision::Approve => {
                Self::claim_for_member(&self.ledger, &*self.events, membership, now).await
            }
        }
    }

    /// A member leaves an `approved` membership; their unit is released.
    ///
    /// # Errors
    ///
    /// - `PolicyViolation(NotRequester)` when `actor` did not file the
    ///   request.
    /// - `InvalidStateTransition` from any state but `approved`.
    /// - `UnknownMembership` for an unknown ID.
    pub async fn withdraw(
        &self,
        membership_id: MembershipId,
        actor: TravelerId,
    ) -> BookingResult<MembershipRequest> {
        self.leave(membership_id, actor, false).await
    }

    /// The organizer removes an `approved` member; capacity-wise identical
    /// to a withdrawal.
    ///
    /// # Errors
    ///
    /// - `PolicyViolation(NotOrganizer)` when `actor` is not the organizer.
    /// - `InvalidStateTransition` from any state but `approved`.
    /// - `UnknownMembership` for an unknown ID.
    pub async fn remove(
        &self,
        membership_id: MembershipId,
        actor: TravelerId,
    ) -> BookingResult<MembershipRequest> {
        self.leave(membership_id, actor, true).await
    }

    /// Members currently in the group, organizer included. Always the
    /// ledger's held count, never a separate tally.
    ///
    /// # Errors
    ///
    /// `UnknownResource` / `PolicyViolation(NotAGroupTour)` for bad IDs.
    pub async fn current_members(&self, resource_id: ResourceId) -> BookingResult<u32> {
        let group = self.group(resource_id).await?;
        self.ledger.held_count(group.resource_id).await
    }

    /// Look up a membership request by ID.
    ///
    /// # Errors
    ///
    /// `UnknownMembership` when no record exists.
    pub async fn membership(
        &self,
        membership_id: MembershipId,
    ) -> BookingResult<MembershipRequest> {
        self.requests
            .read()
            .await
            .get(&membership_id)
            .cloned()
            .ok_or(BookingError::UnknownMembership(membership_id))
    }

    /// All retained membership records for one group, for the organizer's
    /// console.
    pub async fn requests_for(&self, resource_id: ResourceId) -> Vec<MembershipRequest> {
        self.requests
            .read()
            .await
            .values()
            .filter(|r| r.resource_id == resource_id)
            .cloned()
            .collect()
    }

    async fn leave(
        &self,
        membership_id: MembershipId,
        actor: TravelerId,
        by_organizer: bool,
    ) -> BookingResult<MembershipRequest> {
        let mut requests = self.requests.write().await;
        let membership = requests
            .get_mut(&membership_id)
            .ok_or(BookingError::UnknownMembership(membership_id))?;
        let group = self.group(membership.resource_id).await?;

        if by_organizer {
            if actor != group.organizer {
                return Err(BookingError::policy(PolicyReason::NotOrganizer));
            }
        } else if actor != membership.requester {
            return Err(BookingError::policy(PolicyReason::NotRequester));
        }

        if membership.state != MembershipState::Approved {
            return Err(BookingError::InvalidStateTransition {
                operation: if by_organizer { "remove" } else { "withdraw" },
                state: membership.state.label(),
            });
        }

        self.ledger.release(membership.resource_id, &ONE_MEMBER).await?;
        let now = self.clock.now();
        membership.state = if by_organizer {
            MembershipState::Removed
        } else {
            MembershipState::Withdrawn
        };
        membership.closed_at = Some(now);
        tracing::info!(
            membership_id = %membership.id,
            by_organizer,
            "membership closed"
        );
        self.events.publish(BookingEvent::MembershipWithdrawn {
            membership_id: membership.id,
            resource_id: membership.resource_id,
            by_organizer,
            at: now,
        });
        Ok(membership.clone())
    }

    /// Final-approval claim shared by the host direct path and the
    /// platform path.
    async fn claim_for_member(
        ledger: &CapacityLedger,
        events: &dyn EventSink,
        membership: &mut MembershipRequest,
        now: chrono::DateTime<chrono::Utc>,
    ) -> BookingResult<MembershipRequest> {
        match ledger.try_claim(membership.resource_id, &ONE_MEMBER).await {
            Ok(_) => {
                membership.state = MembershipState::Approved;
                tracing::info!(membership_id = %membership.id, "membership approved");
                events.publish(BookingEvent::MembershipApproved {
                    membership_id: membership.id,
                    resource_id: membership.resource_id,
                    requester: membership.requester,
                    at: now,
                });
                Ok(membership.clone())
            }
            Err(BookingError::SlotUnavailable { .. }) => {
                membership.state = MembershipState::RejectedCapacity;
                tracing::warn!(
                    membership_id = %membership.id,
                    resource_id = %membership.resource_id,
                    "group filled during approval window"
                );
                events.publish(BookingEvent::MembershipRejected {
                    membership_id: membership.id,
                    resource_id: membership.resource_id,
                    stage: RejectionStage::Capacity,
                    at: now,
                });
                Err(BookingError::CapacityExceededOnApproval {
                    resource_id: membership.resource_id,
                })
            }
            Err(other) => Err(other),
        }
    }

    async fn group(&self, resource_id: ResourceId) -> BookingResult<GroupTour> {
        if let Some(group) = self.groups.read().await.get(&resource_id) {
            return Ok(group.clone());
        }
        // Distinguish an unregistered ID from a resource that is not a
        // group tour.
        match self.ledger.resource(resource_id).await {
            Ok(_) => Err(BookingError::policy(PolicyReason::NotAGroupTour)),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::environment::Clock;
    use crate::events::NullEventSink;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    #[derive(Debug)]
    struct TestClock(DateTime<Utc>);

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 10, 9, 0, 0).unwrap()
    }

    fn group(max_members: u32, platform_gate: bool) -> GroupTour {
        GroupTour {
            resource_id: ResourceId::new(),
            organizer: TravelerId::new(),
            max_members,
            start_time: start(),
            requires_platform_clearance: platform_gate,
        }
    }

    async fn workflow() -> ApprovalWorkflow {
        ApprovalWorkflow::new(
            Arc::new(CapacityLedger::new()),
            Arc::new(TestClock(start() - Duration::days(30))),
            Arc::new(NullEventSink),
        )
    }

    #[tokio::test]
    async fn organizer_counts_as_a_member_from_registration() {
        let wf = workflow().await;
        let g = group(3, true);
        let id = g.resource_id;
        wf.register_group(g).await.unwrap();
        assert_eq!(wf.current_members(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn two_stage_approval_claims_capacity_at_the_end() {
        let wf = workflow().await;
        let g = group(3, true);
        let (id, organizer) = (g.resource_id, g.organizer);
        wf.register_group(g).await.unwrap();

        let member = TravelerId::new();
        let request = wf.request(id, member).await.unwrap();
        assert_eq!(request.state, MembershipState::PendingHost);
        assert_eq!(wf.current_members(id).await.unwrap(), 1);

        let request = wf
            .host_decide(request.id, organizer, Decision::Approve)
            .await
            .unwrap();
        assert_eq!(request.state, MembershipState::PendingPlatform);
        // Still nothing claimed while the platform deliberates.
        assert_eq!(wf.current_members(id).await.unwrap(), 1);

        let request = wf
            .platform_decide(request.id, Decision::Approve)
            .await
            .unwrap();
        assert_eq!(request.state, MembershipState::Approved);
        assert_eq!(wf.current_members(id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn host_approval_is_final_without_platform_gate() {
        let wf = workflow().await;
        let g = group(3, false);
        let (id, organizer) = (g.resource_id, g.organizer);
        wf.register_group(g).await.unwrap();

        let request = wf.request(id, TravelerId::new()).await.unwrap();
        let request = wf
            .host_decide(request.id, organizer, Decision::Approve)
            .await
            .unwrap();
        assert_eq!(request.state, MembershipState::Approved);
        assert_eq!(wf.current_members(id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn host_rejection_is_terminal_and_touches_no_capacity() {
        let wf = workflow().await;
        let g = group(3, true);
        let (id, organizer) = (g.resource_id, g.organizer);
        wf.register_group(g).await.unwrap();

        let request = wf.request(id, TravelerId::new()).await.unwrap();
        let request = wf
            .host_decide(request.id, organizer, Decision::Reject)
            .await
            .unwrap();
        assert_eq!(request.state, MembershipState::RejectedHost);
        assert_eq!(wf.current_members(id).await.unwrap(), 1);

        // Terminal: the platform cannot rule on it afterwards.
        let err = wf
            .platform_decide(request.id, Decision::Approve)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidStateTransition {
                operation: "platform_decide",
                state: "rejected_host",
            }
        );
    }

    #[tokio::test]
    async fn only_the_organizer_may_host_decide() {
        let wf = workflow().await;
        let g = group(3, true);
        let id = g.resource_id;
        wf.register_group(g).await.unwrap();

        let request = wf.request(id, TravelerId::new()).await.unwrap();
        let err = wf
            .host_decide(request.id, TravelerId::new(), Decision::Approve)
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::policy(PolicyReason::NotOrganizer));
        assert_eq!(
            wf.membership(request.id).await.unwrap().state,
            MembershipState::PendingHost
        );
    }

    #[tokio::test]
    async fn organizer_cannot_request_their_own_group() {
        let wf = workflow().await;
        let g = group(3, true);
        let (id, organizer) = (g.resource_id, g.organizer);
        wf.register_group(g).await.unwrap();

        let err = wf.request(id, organizer).await.unwrap_err();
        assert_eq!(err, BookingError::policy(PolicyReason::OrganizerCannotJoin));
    }

    #[tokio::test]
    async fn one_live_request_per_traveler_per_group() {
        let wf = workflow().await;
        let g = group(3, true);
        let id = g.resource_id;
        wf.register_group(g).await.unwrap();

        let member = TravelerId::new();
        wf.request(id, member).await.unwrap();
        let err = wf.request(id, member).await.unwrap_err();
        assert_eq!(err, BookingError::policy(PolicyReason::DuplicateRequest));
    }

    #[tokio::test]
    async fn rejected_travelers_may_request_again() {
        let wf = workflow().await;
        let g = group(3, true);
        let (id, organizer) = (g.resource_id, g.organizer);
        wf.register_group(g).await.unwrap();

        let member = TravelerId::new();
        let request = wf.request(id, member).await.unwrap();
        wf.host_decide(request.id, organizer, Decision::Reject)
            .await
            .unwrap();
        wf.request(id, member).await.unwrap();
    }

    #[tokio::test]
    async fn group_filling_during_approval_is_surfaced() {
        // max_members = 2: organizer plus one slot.
        let wf = workflow().await;
        let g = group(2, true);
        let (id, organizer) = (g.resource_id, g.organizer);
        wf.register_group(g).await.unwrap();

        let first = wf.request(id, TravelerId::new()).await.unwrap();
        let second = wf.request(id, TravelerId::new()).await.unwrap();
        let first = wf
            .host_decide(first.id, organizer, Decision::Approve)
            .await
            .unwrap();
        let second = wf
            .host_decide(second.id, organizer, Decision::Approve)
            .await
            .unwrap();

        wf.platform_decide(first.id, Decision::Approve).await.unwrap();
        let err = wf
            .platform_decide(second.id, Decision::Approve)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::CapacityExceededOnApproval { resource_id: id }
        );
        assert_eq!(
            wf.membership(second.id).await.unwrap().state,
            MembershipState::RejectedCapacity
        );
        assert_eq!(wf.current_members(id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn withdrawal_releases_the_unit() {
        let wf = workflow().await;
        let g = group(2, false);
        let (id, organizer) = (g.resource_id, g.organizer);
        wf.register_group(g).await.unwrap();

        let member = TravelerId::new();
        let request = wf.request(id, member).await.unwrap();
        wf.host_decide(request.id, organizer, Decision::Approve)
            .await
            .unwrap();
        assert_eq!(wf.current_members(id).await.unwrap(), 2);

        let request = wf.withdraw(request.id, member).await.unwrap();
        assert_eq!(request.state, MembershipState::Withdrawn);
        assert_eq!(wf.current_members(id).await.unwrap(), 1);

        // The freed slot is claimable by someone else.
        let next = wf.request(id, TravelerId::new()).await.unwrap();
        let next = wf
            .host_decide(next.id, organizer, Decision::Approve)
            .await
            .unwrap();
        assert_eq!(next.state, MembershipState::Approved);
    }

    #[tokio::test]
    async fn removal_is_organizer_only() {
        let wf = workflow().await;
        let g = group(2, false);
        let (id, organizer) = (g.resource_id, g.organizer);
        wf.register_group(g).await.unwrap();

        let member = TravelerId::new();
        let request = wf.request(id, member).await.unwrap();
        wf.host_decide(request.id, organizer, Decision::Approve)
            .await
            .unwrap();

        let err = wf.remove(request.id, member).await.unwrap_err();
        assert_eq!(err, BookingError::policy(PolicyReason::NotOrganizer));

        let request = wf.remove(request.id, organizer).await.unwrap();
        assert_eq!(request.state, MembershipState::Removed);
        assert_eq!(wf.current_members(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn withdrawal_requires_approval_first() {
        let wf = workflow().await;
        let g = group(3, true);
        let id = g.resource_id;
        wf.register_group(g).await.unwrap();

        let member = TravelerId::new();
        let request = wf.request(id, member).await.unwrap();
        let err = wf.withdraw(request.id, member).await.unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidStateTransition {
                operation: "withdraw",
                state: "pending_host",
            }
        );
    }

    #[tokio::test]
    async fn non_group_resources_are_refused() {
        let ledger = Arc::new(CapacityLedger::new());
        let wf = ApprovalWorkflow::new(
            Arc::clone(&ledger),
            Arc::new(TestClock(start())),
            Arc::new(NullEventSink),
        );
        let bus = Resource {
            id: ResourceId::new(),
            start_time: start(),
            unit_kind: UnitKind::AnonymousSlot { capacity_total: 10 },
            closing_policy: None,
            refund_policy: RefundPolicy::none(),
        };
        let bus_id = bus.id;
        ledger.register(bus).await.unwrap();

        let err = wf.request(bus_id, TravelerId::new()).await.unwrap_err();
        assert_eq!(err, BookingError::policy(PolicyReason::NotAGroupTour));

        let err = wf.request(ResourceId::new(), TravelerId::new()).await.unwrap_err();
        assert!(matches!(err, BookingError::UnknownResource(_)));
    }
}
