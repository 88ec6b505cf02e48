//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use doccon_auth::AuthConfig;
use doccon_db::DbConfig;

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Directory the certificate PDFs are written to.
    pub certificates_dir: PathBuf,
    /// JSON array of hospitals loaded when the catalogue is empty.
    pub hospital_seed_file: Option<PathBuf>,
    /// Registered doctor promoted to admin at startup.
    pub bootstrap_admin_email: Option<String>,
}

impl AppConfig {
    /// Load `.env` (if present) and read the `DOCCON_*` variables.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).context("failed to load .env"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = var("DOCCON_BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".into())
            .parse()
            .context("DOCCON_BIND_ADDR is not a socket address")?;

        let db_defaults = DbConfig::default();
        let db = DbConfig {
            url: var("DOCCON_DB_URL").unwrap_or(db_defaults.url),
            namespace: var("DOCCON_DB_NAMESPACE").unwrap_or(db_defaults.namespace),
            database: var("DOCCON_DB_DATABASE").unwrap_or(db_defaults.database),
            username: var("DOCCON_DB_USER"),
            password: var("DOCCON_DB_PASS"),
        };

        let private_key_file =
            var("DOCCON_JWT_PRIVATE_KEY_FILE").context("DOCCON_JWT_PRIVATE_KEY_FILE is required")?;
        let public_key_file =
            var("DOCCON_JWT_PUBLIC_KEY_FILE").context("DOCCON_JWT_PUBLIC_KEY_FILE is required")?;

        let auth_defaults = AuthConfig::default();
        let auth = AuthConfig {
            jwt_private_key_pem: std::fs::read_to_string(&private_key_file)
                .with_context(|| format!("cannot read JWT private key {private_key_file}"))?,
            jwt_public_key_pem: std::fs::read_to_string(&public_key_file)
                .with_context(|| format!("cannot read JWT public key {public_key_file}"))?,
            access_token_lifetime_secs: match var("DOCCON_TOKEN_LIFETIME_SECS") {
                Some(raw) => raw
                    .parse()
                    .context("DOCCON_TOKEN_LIFETIME_SECS is not a number")?,
                None => auth_defaults.access_token_lifetime_secs,
            },
            jwt_issuer: var("DOCCON_JWT_ISSUER").unwrap_or(auth_defaults.jwt_issuer),
            pepper: var("DOCCON_PASSWORD_PEPPER"),
            min_password_length: auth_defaults.min_password_length,
        };

        Ok(Self {
            bind_addr,
            db,
            auth,
            certificates_dir: var("DOCCON_CERTIFICATES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./certificates")),
            hospital_seed_file: var("DOCCON_HOSPITAL_SEED_FILE").map(PathBuf::from),
            bootstrap_admin_email: var("DOCCON_BOOTSTRAP_ADMIN_EMAIL"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn key_files() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("doccon-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let private = dir.join("private.pem");
        let public = dir.join("public.pem");
        std::fs::write(&private, "private").unwrap();
        std::fs::write(&public, "public").unwrap();
        (private, public)
    }

    fn lookup(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_keys_are_set() {
        let (private, public) = key_files();
        let vars = HashMap::from([
            ("DOCCON_JWT_PRIVATE_KEY_FILE", private.display().to_string()),
            ("DOCCON_JWT_PUBLIC_KEY_FILE", public.display().to_string()),
        ]);

        let config = AppConfig::from_lookup(lookup(vars)).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.db.url, "ws://127.0.0.1:8000");
        assert_eq!(config.db.namespace, "doccon");
        assert_eq!(config.auth.jwt_private_key_pem, "private");
        assert_eq!(config.auth.access_token_lifetime_secs, 86_400);
        assert_eq!(config.certificates_dir, PathBuf::from("./certificates"));
        assert!(config.hospital_seed_file.is_none());
        assert!(config.bootstrap_admin_email.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let (private, public) = key_files();
        let vars = HashMap::from([
            ("DOCCON_JWT_PRIVATE_KEY_FILE", private.display().to_string()),
            ("DOCCON_JWT_PUBLIC_KEY_FILE", public.display().to_string()),
            ("DOCCON_BIND_ADDR", "127.0.0.1:8080".to_string()),
            ("DOCCON_DB_URL", "mem://".to_string()),
            ("DOCCON_TOKEN_LIFETIME_SECS", "600".to_string()),
            ("DOCCON_PASSWORD_PEPPER", "pepper".to_string()),
            ("DOCCON_BOOTSTRAP_ADMIN_EMAIL", "admin@example.com".to_string()),
        ]);

        let config = AppConfig::from_lookup(lookup(vars)).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.db.url, "mem://");
        assert_eq!(config.auth.access_token_lifetime_secs, 600);
        assert_eq!(config.auth.pepper.as_deref(), Some("pepper"));
        assert_eq!(
            config.bootstrap_admin_email.as_deref(),
            Some("admin@example.com")
        );
    }

    #[test]
    fn missing_key_file_is_an_error() {
        let err = AppConfig::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("DOCCON_JWT_PRIVATE_KEY_FILE"));
    }

    #[test]
    fn bad_bind_addr_is_an_error() {
        let err = AppConfig::from_lookup(|key| {
            (key == "DOCCON_BIND_ADDR").then(|| "not-an-address".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("DOCCON_BIND_ADDR"));
    }
}
