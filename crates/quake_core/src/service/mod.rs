//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into payload-shaped APIs.
//! - Keep callers decoupled from storage details.

pub mod earthquake_service;
