// Shared type definitions for the reader core.
// Each submodule defines types used across managers and services.

pub mod errors;
pub mod search;
pub mod settings;
pub mod tab;
pub mod translation;
