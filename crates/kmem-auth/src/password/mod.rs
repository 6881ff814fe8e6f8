//! Password hashing and credential rules.

pub mod hasher;
pub mod policy;

pub use hasher::PasswordHasher;
pub use policy::CredentialPolicy;
