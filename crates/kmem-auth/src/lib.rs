//! # kmem-auth
//!
//! Authentication primitives for kmem.
//!
//! ## Modules
//!
//! - `jwt`: access and refresh token creation and validation
//! - `password`: Argon2id password hashing and credential rules

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair, TokenType};
pub use password::{CredentialPolicy, PasswordHasher};
