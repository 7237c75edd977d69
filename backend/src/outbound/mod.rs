//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **cache**: Redis-backed reset token storage
//! - **crypto**: Argon2id password hashing
//! - **notify**: reset link delivery
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business rules.

pub mod cache;
pub mod crypto;
pub mod notify;
pub mod persistence;
