//! Credential hashing for portal accounts
//!
//! Passwords are stored as Argon2id PHC strings. The audit trail never sees
//! them in clear because the `password` field is always redacted.

pub mod password;

pub use password::{hash_password, verify_password};
