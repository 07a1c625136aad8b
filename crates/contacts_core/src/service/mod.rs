//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate DAO calls into request-level APIs.
//! - Keep CLI and other callers decoupled from storage details.

pub mod contact_service;
