//! Authoritative slot accounting, one critical section per resource.
//!
//! The ledger is the single source of truth for occupancy. Every "seats
//! left" number anywhere else in the platform is a read-only projection of
//! this state; nothing maintains a second counter that could drift.
//!
//! # Concurrency
//!
//! Each registered resource owns its own `tokio::sync::RwLock` around its
//! occupancy. Mutations (`try_claim`, `release`) take the write side, so
//! two concurrent claims for overlapping seats serialize and exactly one
//! wins; snapshots take the read side and therefore never observe a torn
//! state. Different resources never contend: the outer registry lock is
//! held only long enough to clone the per-resource handle.

use crate::error::{BookingError, BookingResult, PolicyReason, SlotConflict};
use crate::types::{
    ClaimGrant, ClaimRequest, OccupancySnapshot, Resource, ResourceId, SlotId, SlotIds,
    SlotStatus, UnitKind,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Live occupancy of one resource.
#[derive(Debug)]
enum Occupancy {
    /// Per-seat state for `numbered-seat` resources, keyed by label.
    Numbered { seats: BTreeMap<SlotId, SlotStatus> },
    /// Held counter for `anonymous-slot` resources.
    Anonymous { capacity_total: u32, held: u32 },
}

#[derive(Debug)]
struct ResourceEntry {
    resource: Resource,
    occupancy: RwLock<Occupancy>,
}

/// Concurrency-safe bookkeeping of slot occupancy across all registered
/// resources.
///
/// `try_claim` is all-or-nothing, `release` is idempotent, and
/// `occupancy_snapshot` is a consistent point-in-time view; see the module
/// docs for the locking discipline behind those guarantees.
#[derive(Debug, Default)]
pub struct CapacityLedger {
    resources: RwLock<HashMap<ResourceId, Arc<ResourceEntry>>>,
}

impl CapacityLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource supplied by the catalog service.
    ///
    /// Numbered-seat resources materialize one free slot per layout label;
    /// anonymous-slot resources start with nothing held.
    ///
    /// # Errors
    ///
    /// `PolicyViolation` on zero capacity or a duplicate resource ID.
    pub async fn register(&self, resource: Resource) -> BookingResult<()> {
        if resource.capacity_total() == 0 {
            return Err(BookingError::policy(PolicyReason::ZeroCapacity));
        }

        let occupancy = match &resource.unit_kind {
            UnitKind::NumberedSeat(layout) => Occupancy::Numbered {
                seats: layout
                    .slot_ids()
                    .into_iter()
                    .map(|id| (id, SlotStatus::Free))
                    .collect(),
            },
            UnitKind::AnonymousSlot { capacity_total } => Occupancy::Anonymous {
                capacity_total: *capacity_total,
                held: 0,
            },
        };

        let mut resources = self.resources.write().await;
        if resources.contains_key(&resource.id) {
            return Err(BookingError::policy(PolicyReason::DuplicateResource));
        }
        tracing::info!(
            resource_id = %resource.id,
            capacity = resource.capacity_total(),
            "registered resource"
        );
        resources.insert(
            resource.id,
            Arc::new(ResourceEntry {
                resource,
                occupancy: RwLock::new(occupancy),
            }),
        );
        Ok(())
    }

    /// The resource record (capacity, policies, layout) as registered.
    ///
    /// # Errors
    ///
    /// `UnknownResource` if nothing is registered under `resource_id`.
    pub async fn resource(&self, resource_id: ResourceId) -> BookingResult<Resource> {
        Ok(self.entry(resource_id).await?.resource.clone())
    }

    /// Atomically claim seats or units. All-or-nothing: if any requested
    /// seat is taken (or the anonymous pool is short), nothing changes and
    /// the conflict is reported.
    ///
    /// # Errors
    ///
    /// - `SlotUnavailable` when the claim cannot be satisfied in full.
    /// - `PolicyViolation` for an empty claim or a claim whose shape does
    ///   not match the resource's unit kind.
    /// - `UnknownResource` if nothing is registered under `resource_id`.
    pub async fn try_claim(
        &self,
        resource_id: ResourceId,
        request: &ClaimRequest,
    ) -> BookingResult<ClaimGrant> {
        if request.unit_count() == 0 {
            return Err(BookingError::policy(PolicyReason::ZeroQuantity));
        }
        let entry = self.entry(resource_id).await?;
        let mut occupancy = entry.occupancy.write().await;

        match (&mut *occupancy, request) {
            (Occupancy::Numbered { seats }, ClaimRequest::Seats(requested)) => {
                // Duplicate labels in one request collapse to a single seat.
                let mut wanted: SlotIds = SlotIds::new();
                for id in requested {
                    if !wanted.contains(id) {
                        wanted.push(id.clone());
                    }
                }

                let unavailable: Vec<SlotId> = wanted
                    .iter()
                    .filter(|id| seats.get(*id) != Some(&SlotStatus::Free))
                    .cloned()
                    .collect();
                if !unavailable.is_empty() {
                    return Err(BookingError::SlotUnavailable {
                        resource_id,
                        conflict: SlotConflict::Seats(unavailable),
                    });
                }

                for id in &wanted {
                    seats.insert(id.clone(), SlotStatus::Held);
                }
                let quantity = wanted.len() as u32;
                tracing::debug!(
                    resource_id = %resource_id,
                    seats = ?wanted.iter().map(SlotId::as_str).collect::<Vec<_>>(),
                    "claimed seats"
                );
                Ok(ClaimGrant {
                    slot_ids: wanted,
                    quantity,
                })
            }
            (
                Occupancy::Anonymous {
                    capacity_total,
                    held,
                },
                ClaimRequest::Quantity(quantity),
            ) => {
                let available = *capacity_total - *held;
                if *quantity > available {
                    return Err(BookingError::SlotUnavailable {
                        resource_id,
                        conflict: SlotConflict::Quantity {
                            requested: *quantity,
                            available,
                        },
                    });
                }
                *held += quantity;
                tracing::debug!(
                    resource_id = %resource_id,
                    quantity,
                    held = *held,
                    "claimed units"
                );
                Ok(ClaimGrant {
                    slot_ids: SlotIds::new(),
                    quantity: *quantity,
                })
            }
            _ => Err(BookingError::policy(PolicyReason::UnitKindMismatch)),
        }
    }

    /// Release previously claimed seats or units.
    ///
    /// Idempotent: freeing an already-free seat, an unknown label, or more
    /// units than are held is a no-op, so duplicate cancellation events are
    /// harmless. A release whose shape does not match the resource's unit
    /// kind is likewise a no-op. Only an unregistered `resource_id` is
    /// surfaced, since that cannot come from event replay or a retry, only
    /// from a caller wiring bug.
    ///
    /// # Errors
    ///
    /// `UnknownResource` if nothing is registered under `resource_id`.
    pub async fn release(
        &self,
        resource_id: ResourceId,
        request: &ClaimRequest,
    ) -> BookingResult<()> {
        let entry = self.entry(resource_id).await?;
        let mut occupancy = entry.occupancy.write().await;

        match (&mut *occupancy, request) {
            (Occupancy::Numbered { seats }, ClaimRequest::Seats(labels)) => {
                for id in labels {
                    if let Some(status) = seats.get_mut(id) {
                        *status = SlotStatus::Free;
                    }
                }
                tracing::debug!(resource_id = %resource_id, count = labels.len(), "released seats");
            }
            (Occupancy::Anonymous { held, .. }, ClaimRequest::Quantity(quantity)) => {
                *held = held.saturating_sub(*quantity);
                tracing::debug!(resource_id = %resource_id, quantity, "released units");
            }
            _ => {}
        }
        Ok(())
    }

    /// A consistent point-in-time view of the resource's occupancy.
    ///
    /// # Errors
    ///
    /// `UnknownResource` if nothing is registered under `resource_id`.
    pub async fn occupancy_snapshot(
        &self,
        resource_id: ResourceId,
    ) -> BookingResult<OccupancySnapshot> {
        let entry = self.entry(resource_id).await?;
        let occupancy = entry.occupancy.read().await;
        Ok(match &*occupancy {
            Occupancy::Numbered { seats } => {
                let mut free = Vec::new();
                let mut held = Vec::new();
                for (id, status) in seats {
                    match status {
                        SlotStatus::Free => free.push(id.clone()),
                        SlotStatus::Held => held.push(id.clone()),
                    }
                }
                OccupancySnapshot::Numbered { free, held }
            }
            Occupancy::Anonymous {
                capacity_total,
                held,
            } => OccupancySnapshot::Anonymous {
                capacity_total: *capacity_total,
                held: *held,
            },
        })
    }

    /// Units currently held on the resource. The approval workflow derives
    /// `current_members` from this, never from its own counter.
    ///
    /// # Errors
    ///
    /// `UnknownResource` if nothing is registered under `resource_id`.
    pub async fn held_count(&self, resource_id: ResourceId) -> BookingResult<u32> {
        Ok(self.occupancy_snapshot(resource_id).await?.held_count())
    }

    async fn entry(&self, resource_id: ResourceId) -> BookingResult<Arc<ResourceEntry>> {
        self.resources
            .read()
            .await
            .get(&resource_id)
            .cloned()
            .ok_or(BookingError::UnknownResource(resource_id))
    }
}
