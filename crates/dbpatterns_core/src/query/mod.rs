//! Read-only composite queries over the repositories' tables.
//!
//! # Responsibility
//! - Provide join/aggregate reads used by the demonstrations.
//! - Decide per query shape whether an empty result is an error.
//!
//! # Invariants
//! - Functions here never write.
//! - Queries that treat absence as exceptional return `RepoError::NoRows`;
//!   list-shaped queries return an empty `Vec` instead.

pub mod blog;
pub mod company;
