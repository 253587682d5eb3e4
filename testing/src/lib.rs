//! # Tripdesk Testing
//!
//! Deterministic test doubles and fixture builders for the reservation
//! engine:
//!
//! - [`mocks::FixedClock`] / [`mocks::AdjustableClock`] - control "now" so
//!   refund math and closing-policy checks are reproducible
//! - [`mocks::RecordingEventSink`] - capture published lifecycle events for
//!   assertions
//! - [`fixtures`] - ready-made resources, layouts and refund policies
//!
//! ## Example
//!
//! ```ignore
//! use tripdesk_testing::{fixtures, mocks::{test_clock, RecordingEventSink}};
//!
//! #[tokio::test]
//! async fn cancel_refunds_half() {
//!     let clock = Arc::new(test_clock());
//!     let events = Arc::new(RecordingEventSink::default());
//!     let processor = ReservationProcessor::new(ledger, clock, events.clone());
//!     // ... drive the flow, then:
//!     assert_eq!(events.names(), vec!["reservation.held", "reservation.cancelled"]);
//! }
//! ```

use chrono::{DateTime, Utc};

/// Mock implementations for testing.
pub mod mocks {
    use super::{DateTime, Utc};
    use chrono::Duration;
    use std::sync::Mutex;
    use tripdesk_core::environment::Clock;
    use tripdesk_core::events::{BookingEvent, EventSink};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tripdesk_testing::mocks::FixedClock;
    /// use tripdesk_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock whose "now" a test can move forward, for flows where the
    /// cancellation time must differ from the booking time.
    #[derive(Debug)]
    pub struct AdjustableClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl AdjustableClock {
        /// Create a clock starting at the given time.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward.
        ///
        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned, which only happens
        /// after another panic in the same test.
        #[allow(clippy::unwrap_used)]
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap();
            *time += by;
        }

        /// Set the clock to an absolute time.
        ///
        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned.
        #[allow(clippy::unwrap_used)]
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap() = to;
        }
    }

    impl Clock for AdjustableClock {
        #[allow(clippy::unwrap_used)]
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap()
        }
    }

    /// Event sink that records everything published, in order.
    #[derive(Debug, Default)]
    pub struct RecordingEventSink {
        events: Mutex<Vec<BookingEvent>>,
    }

    impl RecordingEventSink {
        /// All events captured so far.
        ///
        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned.
        #[allow(clippy::unwrap_used)]
        #[must_use]
        pub fn events(&self) -> Vec<BookingEvent> {
            self.events.lock().unwrap().clone()
        }

        /// Just the event names (`reservation.held` style), for terse
        /// sequence assertions.
        ///
        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned.
        #[allow(clippy::unwrap_used)]
        #[must_use]
        pub fn names(&self) -> Vec<&'static str> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(BookingEvent::name)
                .collect()
        }

        /// Drop everything captured so far.
        ///
        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned.
        #[allow(clippy::unwrap_used)]
        pub fn clear(&self) {
            self.events.lock().unwrap().clear();
        }
    }

    impl EventSink for RecordingEventSink {
        #[allow(clippy::unwrap_used)]
        fn publish(&self, event: BookingEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    /// Create a default fixed clock for tests (2026-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Ready-made domain fixtures.
pub mod fixtures {
    use super::{DateTime, Utc};
    use tripdesk_core::types::{
        ClosingPolicy, GroupTour, RefundPolicy, RefundTier, Resource, ResourceId, SeatLayout,
        TravelerId, UnitKind,
    };

    /// The refund schedule most tests use: 100% beyond 48h, 75% beyond
    /// 24h, 50% beyond 6h, 10% afterwards.
    #[must_use]
    pub fn tiered_refund_policy() -> RefundPolicy {
        RefundPolicy::new(
            [
                RefundTier::new(48, 100),
                RefundTier::new(24, 75),
                RefundTier::new(6, 50),
            ],
            10,
        )
    }

    /// A 10-row 2+2 coach layout (40 seats, aisle after column 2).
    #[must_use]
    pub fn coach_layout() -> SeatLayout {
        SeatLayout::new(10, 4, [2])
    }

    /// A numbered-seat bus trip departing at `start_time`, with the tiered
    /// refund policy and a 1-hour closing policy.
    #[must_use]
    pub fn bus_trip(start_time: DateTime<Utc>) -> Resource {
        Resource {
            id: ResourceId::new(),
            start_time,
            unit_kind: UnitKind::NumberedSeat(coach_layout()),
            closing_policy: Some(ClosingPolicy::hours(1)),
            refund_policy: tiered_refund_policy(),
        }
    }

    /// An anonymous-slot tour instance with the given capacity and no
    /// closing policy.
    #[must_use]
    pub fn tour_instance(start_time: DateTime<Utc>, capacity: u32) -> Resource {
        Resource {
            id: ResourceId::new(),
            start_time,
            unit_kind: UnitKind::AnonymousSlot {
                capacity_total: capacity,
            },
            closing_policy: None,
            refund_policy: tiered_refund_policy(),
        }
    }

    /// A group tour with a fresh organizer and the platform gate enabled.
    #[must_use]
    pub fn group_tour(start_time: DateTime<Utc>, max_members: u32) -> GroupTour {
        GroupTour {
            resource_id: ResourceId::new(),
            organizer: TravelerId::new(),
            max_members,
            start_time,
            requires_platform_clearance: true,
        }
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, AdjustableClock, FixedClock, RecordingEventSink};
