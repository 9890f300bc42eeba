//! Credential handling: Argon2id hashes for stored passwords, HS256 JWTs
//! for access, opaque hashed tokens for refresh.

pub mod jwt;
pub mod password;
