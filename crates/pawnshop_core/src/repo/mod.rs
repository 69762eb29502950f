//! Repository layer: the client contract and its storage backends.
//!
//! # Responsibility
//! - Define one CRUD/query contract (`ClientRepository`) for every backend.
//! - Isolate file encoding and SQLite details from service/business callers.
//!
//! # Invariants
//! - Every backend enforces `Client::validate()` and the uniqueness rules
//!   before persistence, in the same order.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to storage transport errors.

pub mod client_repo;
pub mod collection;
pub mod file_repo;
pub mod sqlite_repo;
pub mod uniqueness;
