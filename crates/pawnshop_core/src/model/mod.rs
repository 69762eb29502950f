//! Client domain model and validation rules.
//!
//! # Responsibility
//! - Define the canonical client record and its summary projection.
//! - Keep every field rule in one pure validation module.
//!
//! # Invariants
//! - Every persisted client is identified by a non-negative `ClientId`.
//! - Validation never depends on other stored records; uniqueness lives in
//!   the repository layer.

pub mod client;
pub mod validation;
