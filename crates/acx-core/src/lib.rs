//! # acx-core
//!
//! Core types and pure rules for academy content exchange.
//!
//! This crate provides the foundational types shared across all acx crates:
//! - The export document model (academy, settings, course tree, export metadata)
//! - Canonical checksums and content fingerprints
//! - Structural validation of export documents
//! - Conflict detection against a snapshot of the target store
//! - Deterministic slug resolution
//! - Import options, results, and preview responses
//! - Persisted record types and cross-cutting error types

pub mod checksum;
pub mod conflict;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod format;
pub mod ids;
pub mod responses;
pub mod slug;
pub mod validation;
