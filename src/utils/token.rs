// src/utils/token.rs

use uuid::Uuid;

/// Generates an invitation token: 128 bits from the OS RNG (UUID v4) rendered
/// as 32 lowercase hex characters.
pub fn generate_invitation_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_invitation_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_invitation_token(), generate_invitation_token());
    }
}
