//! ZimReader: client core for an offline ZIM knowledge-base reader.
//!
//! Manages article tabs, streamed search sessions with optional AI answers,
//! and per-tab translation overlays. This library crate exposes all modules
//! for use by the RPC binary and integration tests.

pub mod app;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
