//! # PlotLedger - Plot Sales Management Server
//!
//! Library crate for the PlotLedger application. The binary in `main.rs`
//! is a thin shell around these modules; they are exposed as a library so
//! integration tests can build the router and exercise the API in-process.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │              apps/plotledger (THE BINARY)          │
//! │                                                    │
//! │  ┌─────────────┐        ┌─────────────┐           │
//! │  │   CLI       │        │   HTTP API  │           │
//! │  │  (clap)     │        │   (axum)    │           │
//! │  └──────┬──────┘        └──────┬──────┘           │
//! │         │                      │                   │
//! │         └──────────┬───────────┘                   │
//! │                    ▼                               │
//! │          ┌──────────────────┐                      │
//! │          │ plotledger-core  │                      │
//! │          │   (THE LOGIC)    │                      │
//! │          └──────────────────┘                      │
//! └────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod cli;
pub mod config;
