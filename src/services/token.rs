use rand::Rng;
use sha2::{Digest, Sha256};

/// Generates an opaque 256-bit token, hex encoded. Used for session,
/// refresh and password-reset tokens.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// SHA-256 of a token, hex encoded. Only hashes are persisted; a leaked
/// table never yields usable tokens.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)
}

/// Six-digit numeric OTP code, zero padded.
pub fn generate_otp_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{:06}", n)
}

/// Masks an email for display in token-info responses: `jo***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{}***@{}", visible, domain)
        }
        None => "***".to_string(),
    }
}
