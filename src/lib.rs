//! Stockflow
//!
//! Multi-tenant warehouse inventory movement engine: per-warehouse balances,
//! an append-only flow log, and stock-in, stock-out and transfer orders.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod quantity;
pub mod repositories;
pub mod services;

pub use common::RequestContext;
pub use errors::ServiceError;
