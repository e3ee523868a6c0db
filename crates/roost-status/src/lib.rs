//! Status dashboard for roost.
//!
//! A thin read-only HTTP layer over the lifecycle supervisor's
//! published snapshots:
//!
//! - `GET /api/status` — the current [`StatusBody`] as JSON
//! - `GET /` — a small self-contained page that polls the endpoint
//! - anything else — a JSON 404
//!
//! The reporter observes through a `watch` receiver and never talks
//! back to the state machine; killing the dashboard cannot affect the
//! connection, and vice versa.

mod server;

pub use server::{StatusBody, router, serve};
