//! Core library components.
//!
//! Leaf modules (`permission`, `resolve`, `membership`) are pure or only
//! read from the remote. `reconcile` composes them around remote calls, and
//! `provider` is the entry point orchestrators hold.

pub mod config;
pub mod constants;
pub mod domain;
pub mod lookup;
pub mod membership;
pub mod permission;
pub mod provider;
pub mod reconcile;
pub mod remote;
pub mod resolve;
pub mod types;
