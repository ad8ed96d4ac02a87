/// Estate Crypto Library
///
/// Password hashing for stored user credentials (Argon2id, PHC string format).
pub mod password;

pub use password::{PasswordError, hash_password, verify_password};
