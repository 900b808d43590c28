use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Algorithm, Params, Pbkdf2};
use rand_core::OsRng;

/// Salted PBKDF2-SHA256 hash in PHC string format.
pub fn hash_password(password: &str, rounds: u32) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params {
        rounds,
        output_length: 32,
    };

    Pbkdf2
        .hash_password_customized(
            password.as_bytes(),
            Some(Algorithm::Pbkdf2Sha256.ident()),
            None,
            params,
            &salt,
        )
        .map(|hash| hash.to_string())
        .map_err(|e| format!("password hashing failed: {}", e))
}

/// Checks `password` against a stored PHC hash. Unparseable hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
