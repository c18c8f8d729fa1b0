use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use crate::error::AppError;

/// Tunable Argon2id cost. Verification reads the cost back from the stored
/// PHC string, so changing it only affects newly hashed passwords.
#[derive(Debug, Clone, Copy)]
pub struct HashCost {
    pub iterations: u32,
    pub memory_kib: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            iterations: Params::DEFAULT_T_COST,
            memory_kib: Params::DEFAULT_M_COST,
        }
    }
}

pub fn hash_password(password: &str, cost: HashCost) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(cost.memory_kib, cost.iterations, 1, None)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);

    Ok(result.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEAP: HashCost = HashCost {
        iterations: 1,
        memory_kib: 1024,
    };

    #[test]
    fn hash_is_salted_and_verifiable() {
        let a = hash_password("admin123", CHEAP).unwrap();
        let b = hash_password("admin123", CHEAP).unwrap();

        assert_ne!(a, b);
        assert_ne!(a, "admin123");
        assert!(verify_password("admin123", &a).unwrap());
        assert!(!verify_password("admin124", &a).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AppError::InternalServerError(_))
        ));
    }
}
