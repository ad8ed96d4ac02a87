use estate_types::models::UserProfile;

/// A user row including the stored password digest.
/// Only the auth handlers see this; everything else gets `UserProfile`.
pub struct UserRow {
    pub profile: UserProfile,
    pub password_hash: String,
}
