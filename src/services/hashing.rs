use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Tunable Argon2id cost parameters, loaded from the environment so
/// operators can trade hashing throughput against work factor.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Config {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Config {
    // m=8MB, t=2, p=1: faster than the library defaults but still secure
    fn default() -> Self {
        Self {
            memory_kib: 8192,
            iterations: 2,
            parallelism: 1,
        }
    }
}

fn get_argon2(cfg: &Argon2Config) -> Result<Argon2<'static>, argon2::password_hash::Error> {
    let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
        .map_err(|_| argon2::password_hash::Error::ParamNameInvalid)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_password(
    password: &str,
    cfg: &Argon2Config,
) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = get_argon2(cfg)?;
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    // Params are read back from the hash string, so verification keeps
    // working after the configured cost changes.
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Syntactically valid hash that no password matches. Verified against on the
/// unknown-email login path so response timing does not reveal whether the
/// account exists.
pub const DUMMY_HASH: &str =
    "$argon2id$v=19$m=8192,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
