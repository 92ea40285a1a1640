//! Configuración centralizada del servicio.
//!
//! Todas las variables de entorno se cargan y validan al arrancar, para
//! fallar rápido ante una configuración inválida.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Backend de persistencia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Archivos JSON planos (ruta legacy)
    Json,
    /// MongoDB
    Mongo,
}

impl StorageBackend {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("mongo") || s.eq_ignore_ascii_case("mongodb") {
            Self::Mongo
        } else {
            Self::Json
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Mongo => "mongo",
        }
    }
}

#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Parámetros de emisión y verificación de JWT.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

pub const DEFAULT_JWT_SECRET: &str = "default-secret-change-me";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub jwt: JwtSettings,
    /// Acepta X-User-Id como sustituto del JWT (solo desarrollo)
    pub allow_header_auth: bool,
    pub bcrypt_cost: u32,
    pub tax_rate: f64,
    pub cors_origins: Vec<String>,
    pub seed_on_start: bool,
    pub import_legacy_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|e| ConfigError {
                field: "PORT",
                message: format!("'{}' is not a valid port: {}", raw, e),
            })?,
            Err(_) => 3001,
        };

        let storage =
            StorageBackend::from_str(&env::var("STORAGE").unwrap_or_else(|_| "json".into()));

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".into()));

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if storage == StorageBackend::Mongo && database_url.is_none() {
            return Err(ConfigError {
                field: "DATABASE_URL",
                message: "Required when STORAGE=mongo".into(),
            });
        }

        let ttl_hours = match env::var("JWT_TTL_HOURS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| ConfigError {
                    field: "JWT_TTL_HOURS",
                    message: format!("'{}' must be a positive integer", raw),
                })?,
            Err(_) => 24,
        };

        let jwt = JwtSettings {
            secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "jersey-club".to_string()),
            audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "jersey-club-web".to_string()),
            ttl_hours,
        };

        let allow_header_auth = parse_flag(&env::var("AUTH_HEADER_FALLBACK").unwrap_or_default());

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or_else(|| ConfigError {
                    field: "BCRYPT_COST",
                    message: format!("'{}' must be between 4 and 31", raw),
                })?,
            Err(_) => bcrypt::DEFAULT_COST,
        };

        let tax_rate = match env::var("TAX_RATE") {
            Ok(raw) => parse_tax_rate(&raw).ok_or_else(|| ConfigError {
                field: "TAX_RATE",
                message: format!("'{}' must be a fraction in [0, 1)", raw),
            })?,
            Err(_) => 0.15,
        };

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".into()),
        );

        let seed_on_start = env::var("SEED_ON_START")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        let import_legacy_dir = env::var("IMPORT_LEGACY_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            storage,
            data_dir,
            database_url,
            jwt,
            allow_header_auth,
            bcrypt_cost,
            tax_rate,
            cors_origins,
            seed_on_start,
            import_legacy_dir,
        })
    }

    /// Advierte sobre configuración insegura.
    pub fn warn_if_insecure(&self) {
        if self.jwt.secret == DEFAULT_JWT_SECRET {
            log::warn!("⚠️  JWT_SECRET not set: using the default secret. DO NOT USE IN PRODUCTION.");
        }
        if self.allow_header_auth {
            log::warn!(
                "⚠️  AUTH_HEADER_FALLBACK is on: X-User-Id is accepted without a token. \
                 DO NOT USE IN PRODUCTION."
            );
        }
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_tax_rate(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite() && (0.0..1.0).contains(r))
}

fn parse_origins(s: &str) -> Vec<String> {
    s.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
impl AppConfig {
    /// Config para tests: backend JSON en `data_dir`, bcrypt barato.
    pub fn for_tests(data_dir: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            storage: StorageBackend::Json,
            data_dir,
            database_url: None,
            jwt: JwtSettings {
                secret: "test-secret".into(),
                issuer: "jersey-club".into(),
                audience: "jersey-club-web".into(),
                ttl_hours: 1,
            },
            allow_header_auth: true,
            bcrypt_cost: 4,
            tax_rate: 0.15,
            cors_origins: vec![],
            seed_on_start: false,
            import_legacy_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parsing() {
        assert_eq!(StorageBackend::from_str("json"), StorageBackend::Json);
        assert_eq!(StorageBackend::from_str("MONGO"), StorageBackend::Mongo);
        assert_eq!(StorageBackend::from_str("mongodb"), StorageBackend::Mongo);
        assert_eq!(StorageBackend::from_str("postgres"), StorageBackend::Json);
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" YES "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn tax_rate_bounds() {
        assert_eq!(parse_tax_rate("0.15"), Some(0.15));
        assert_eq!(parse_tax_rate("0"), Some(0.0));
        assert_eq!(parse_tax_rate("1"), None);
        assert_eq!(parse_tax_rate("-0.1"), None);
        assert_eq!(parse_tax_rate("quince"), None);
    }

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            parse_origins(" http://a.test/ , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
