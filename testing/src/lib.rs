//! # Navalha Testing
//!
//! Test support for the Navalha booking core.
//!
//! This crate provides:
//! - [`memory_store::InMemoryLedgerStore`]: a deterministic, single-lock
//!   implementation of the ledger store, including the atomic balance
//!   credit/debit the store contract requires
//! - [`mocks`]: a movable [`mocks::FixedClock`], a scriptable
//!   [`mocks::MockPaymentGateway`] and a [`mocks::RecordingMessenger`]
//! - [`fixtures`]: seeding helpers and a pre-wired [`fixtures::Harness`]
//!   with all three engines over the in-memory store
//!
//! ## Example
//!
//! ```ignore
//! use navalha_testing::fixtures::Harness;
//!
//! #[tokio::test]
//! async fn booking_flow() {
//!     let harness = Harness::new();
//!     let shop = harness.seed_shop().await;
//!     let appointment = harness
//!         .lifecycle
//!         .create(shop.online_booking(harness.tomorrow_at_ten()))
//!         .await
//!         .unwrap();
//!     assert!(appointment.confirmation_code.is_some());
//! }
//! ```

/// Fixture builders and the pre-wired engine harness
pub mod fixtures;

/// In-memory ledger store
pub mod memory_store;

/// Mock clocks and gateways
pub mod mocks;

pub use fixtures::Harness;
pub use memory_store::InMemoryLedgerStore;
pub use mocks::{FixedClock, MockPaymentGateway, RecordingMessenger, test_clock};
