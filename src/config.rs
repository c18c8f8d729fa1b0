// src/config.rs

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When unset the in-memory store is used.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,

    /// Lifetime of tokens issued by `register`.
    pub register_token_ttl_days: i64,
    /// Lifetime of tokens issued by `login`.
    pub login_token_ttl_days: i64,

    /// Argon2 time cost (iterations).
    pub password_hash_iterations: u32,
    /// Argon2 memory cost in KiB.
    pub password_hash_memory_kib: u32,

    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub cors_origins: Vec<String>,

    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            database_url,
            jwt_secret,
            rust_log,
            port: parse_or("SERVER_PORT", 3000),
            register_token_ttl_days: parse_or("REGISTER_TOKEN_TTL_DAYS", 30),
            login_token_ttl_days: parse_or("LOGIN_TOKEN_TTL_DAYS", 7),
            password_hash_iterations: parse_or("PASSWORD_HASH_ITERATIONS", 2),
            password_hash_memory_kib: parse_or("PASSWORD_HASH_MEMORY_KIB", 19 * 1024),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            cors_origins,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }

    /// Settings suitable for tests: in-memory store, cheap hashing, temp uploads.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            rust_log: "error".to_string(),
            port: 0,
            register_token_ttl_days: 30,
            login_token_ttl_days: 7,
            password_hash_iterations: 1,
            password_hash_memory_kib: 1024,
            upload_dir: env::temp_dir().join("foodblog-test-uploads"),
            public_base_url: "http://127.0.0.1".to_string(),
            cors_origins: Vec::new(),
            admin_username: None,
            admin_email: None,
            admin_password: None,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
