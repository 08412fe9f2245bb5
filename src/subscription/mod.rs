//! Subscription management.
//!
//! This module provides `Subscriber` for handling pushed values, errors and
//! completions, and `Subscription` for controlling a subscription's lifetime:
//! teardown logic, awaiting task-backed producers and unsubscribing.
pub mod subscribe;
