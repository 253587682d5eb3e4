//! Read-only seat map projection for booking UIs.
//!
//! Pure transformation of a ledger snapshot plus a layout descriptor into a
//! row-major grid with aisle markers. Never touches the ledger itself, so
//! it can only ever observe the consistent snapshots the ledger hands out.

use crate::error::{BookingError, BookingResult, PolicyReason};
use crate::types::{OccupancySnapshot, SeatLayout, SlotId, SlotStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One cell of the projected seat map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatMapCell {
    /// A seat at a grid position.
    Seat {
        /// Seat label, e.g. `A1`.
        slot_id: SlotId,
        /// Zero-based row.
        row: u16,
        /// Zero-based column.
        column: u16,
        /// Free or held, per the snapshot.
        status: SlotStatus,
    },
    /// An aisle gap following `after_column` in `row`.
    Aisle {
        /// Zero-based row the gap sits in.
        row: u16,
        /// Zero-based column the gap follows.
        after_column: u16,
    },
}

/// Aggregate availability counts, the UI shape for anonymous-slot
/// resources (and the header line above a seat map).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySummary {
    /// Total units.
    pub capacity_total: u32,
    /// Units held.
    pub held: u32,
    /// Units free.
    pub free: u32,
}

/// Summarize any snapshot into bare counts.
#[must_use]
pub fn summarize(snapshot: &OccupancySnapshot) -> OccupancySummary {
    OccupancySummary {
        capacity_total: snapshot.capacity_total(),
        held: snapshot.held_count(),
        free: snapshot.free_count(),
    }
}

/// Project a numbered-seat snapshot onto its layout.
///
/// Cells come out row-major; each row interleaves [`SeatMapCell::Aisle`]
/// markers at the layout's aisle positions. Seats the snapshot does not
/// mention (possible only if layout and snapshot disagree) render as held
/// rather than inviting a claim that must fail.
///
/// # Errors
///
/// `PolicyViolation` when handed an anonymous-slot snapshot; those have no
/// per-seat identity to project (use [`summarize`]).
pub fn project(
    layout: &SeatLayout,
    snapshot: &OccupancySnapshot,
) -> BookingResult<Vec<SeatMapCell>> {
    let OccupancySnapshot::Numbered { free, .. } = snapshot else {
        return Err(BookingError::policy(PolicyReason::UnitKindMismatch));
    };
    let free: HashSet<&SlotId> = free.iter().collect();

    let mut cells = Vec::new();
    for row in 0..layout.rows {
        for column in 0..layout.columns {
            let slot_id = SeatLayout::seat_label(row, column);
            let status = if free.contains(&slot_id) {
                SlotStatus::Free
            } else {
                SlotStatus::Held
            };
            cells.push(SeatMapCell::Seat {
                slot_id,
                row,
                column,
                status,
            });
            if layout.aisles_after.contains(&(column + 1)) && column + 1 < layout.columns {
                cells.push(SeatMapCell::Aisle {
                    row,
                    after_column: column,
                });
            }
        }
    }
    Ok(cells)
}
