use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    config::{AppConfig, JwtSettings},
    models::{new_id, now_ts, User, UserInfo, ROLE_ADMIN, ROLE_CUSTOMER},
    store::Store,
    utils::{spawn_hash_blocking, AppError},
};

const MIN_PASSWORD_LEN: usize = 6;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub name: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(alias = "correo")]
    pub email: String,
    #[serde(alias = "contrasena")]
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(alias = "correo")]
    pub email: String,
    #[serde(alias = "contrasena")]
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

// Generate JWT token
pub fn generate_jwt(user: &User, jwt: &JwtSettings) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(jwt.ttl_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: jwt.audience.clone(),
        iss: jwt.issuer.clone(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt.secret.as_ref()))
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str, jwt: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[jwt.audience.as_str()]);

    let mut issuers = HashSet::new();
    issuers.insert(jwt.issuer.clone());
    validation.iss = Some(issuers);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(jwt.secret.as_ref()), &validation)?;
    Ok(data.claims)
}

/// Trim + minúsculas; exige `local@dominio.tld`
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::InvalidRequest("Invalid email address".to_string()));
    }
    Ok(email)
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    spawn_hash_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hash task failed: {}", e)))?
        .map_err(AppError::from)
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let outcome = spawn_hash_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Hash task failed: {}", e)))?;

    // Un hash ilegible (p. ej. texto plano legacy) cuenta como credencial inválida
    Ok(outcome.unwrap_or_else(|e| {
        log::warn!("⚠️  Stored password is not a valid bcrypt hash: {}", e);
        false
    }))
}

// User registration
pub async fn register(
    store: &dyn Store,
    config: &AppConfig,
    request: RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&request.email)?;
    let name = request.name.trim().to_string();

    if name.is_empty() {
        return Err(AppError::InvalidRequest("Name is required".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let hashed = hash_password(request.password, config.bcrypt_cost).await?;
    let now = now_ts();

    // El store decide el rol: la primera cuenta administra la tienda
    let user = store
        .register_user(User {
            id: new_id(),
            email,
            password: hashed,
            name,
            role: ROLE_CUSTOMER.to_string(),
            created_at: now,
            last_login: Some(now),
        })
        .await?;

    let token = generate_jwt(&user, &config.jwt)?;

    log::info!("✅ User registered: {} (role: {})", user.email, user.role);

    Ok(AuthResponse { token, user: UserInfo::from(&user) })
}

// User login
pub async fn login(
    store: &dyn Store,
    config: &AppConfig,
    request: LoginRequest,
) -> Result<AuthResponse, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let email = request.email.trim().to_lowercase();
    let user = store.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    if !verify_password(request.password, user.password.clone()).await? {
        return Err(invalid());
    }

    store.touch_last_login(&user.id, now_ts()).await?;
    let token = generate_jwt(&user, &config.jwt)?;

    if user.is_admin() {
        log::info!("👑 Admin session opened: {}", user.email);
    }

    Ok(AuthResponse { token, user: UserInfo::from(&user) })
}

pub async fn current_user(store: &dyn Store, user_id: &str) -> Result<UserInfo, AppError> {
    store
        .get_user(user_id)
        .await?
        .map(|u| UserInfo::from(&u))
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: "s3cret".into(),
            issuer: "jersey-club".into(),
            audience: "jersey-club-web".into(),
            ttl_hours: 1,
        }
    }

    fn user() -> User {
        User {
            id: "u1".into(),
            email: "ana@jersey.club".into(),
            password: String::new(),
            name: "Ana".into(),
            role: ROLE_ADMIN.into(),
            created_at: 0,
            last_login: None,
        }
    }

    #[test]
    fn jwt_round_trip_keeps_identity() {
        let token = generate_jwt(&user(), &settings()).unwrap();
        let claims = verify_token(&token, &settings()).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "ana@jersey.club");
        assert!(claims.is_admin());
    }

    #[test]
    fn jwt_rejects_wrong_secret_and_audience() {
        let token = generate_jwt(&user(), &settings()).unwrap();

        let other_secret = JwtSettings { secret: "other".into(), ..settings() };
        assert!(matches!(verify_token(&token, &other_secret), Err(AppError::Unauthorized(_))));

        let other_aud = JwtSettings { audience: "admin-panel".into(), ..settings() };
        assert!(verify_token(&token, &other_aud).is_err());
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Ana@Jersey.CLUB ").unwrap(), "ana@jersey.club");
        assert!(normalize_email("ana").is_err());
        assert!(normalize_email("@jersey.club").is_err());
        assert!(normalize_email("ana@localhost").is_err());
        assert!(normalize_email("ana@@jersey.club").is_err());
        assert!(normalize_email("a na@jersey.club").is_err());
    }

    #[tokio::test]
    async fn register_then_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        let config = AppConfig::for_tests(dir.path().to_path_buf());

        let first = register(
            &store,
            &config,
            RegisterRequest { name: "Ana".into(), email: "Ana@Jersey.club".into(), password: "camiseta10".into() },
        )
        .await
        .unwrap();
        assert_eq!(first.user.role, ROLE_ADMIN);
        assert_eq!(first.user.email, "ana@jersey.club");

        let second = register(
            &store,
            &config,
            RegisterRequest { name: "Luis".into(), email: "luis@jersey.club".into(), password: "123456".into() },
        )
        .await
        .unwrap();
        assert_eq!(second.user.role, ROLE_CUSTOMER);

        let dup = register(
            &store,
            &config,
            RegisterRequest { name: "Otra".into(), email: "ANA@jersey.club".into(), password: "123456".into() },
        )
        .await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let ok = login(&store, &config, LoginRequest { email: "ana@jersey.club".into(), password: "camiseta10".into() })
            .await
            .unwrap();
        assert_eq!(ok.user.id, first.user.id);
        assert!(verify_token(&ok.token, &config.jwt).is_ok());

        let bad = login(&store, &config, LoginRequest { email: "ana@jersey.club".into(), password: "nope".into() }).await;
        assert!(matches!(bad, Err(AppError::Unauthorized(_))));

        let unknown = login(&store, &config, LoginRequest { email: "x@y.co".into(), password: "camiseta10".into() }).await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn concurrent_first_registrations_yield_one_admin() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        let config = AppConfig::for_tests(dir.path().to_path_buf());

        let signup = |name: &str, email: &str| RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: "camiseta10".into(),
        };
        let (a, b, c) = tokio::join!(
            register(&store, &config, signup("Ana", "ana@jersey.club")),
            register(&store, &config, signup("Luis", "luis@jersey.club")),
            register(&store, &config, signup("Eva", "eva@jersey.club")),
        );

        let roles: Vec<String> = [a, b, c].into_iter().map(|r| r.unwrap().user.role).collect();
        assert_eq!(roles.iter().filter(|r| r.as_str() == ROLE_ADMIN).count(), 1);
        assert_eq!(roles.iter().filter(|r| r.as_str() == ROLE_CUSTOMER).count(), 2);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        let config = AppConfig::for_tests(dir.path().to_path_buf());

        let short = register(
            &store,
            &config,
            RegisterRequest { name: "Ana".into(), email: "ana@jersey.club".into(), password: "123".into() },
        )
        .await;
        assert!(matches!(short, Err(AppError::InvalidRequest(_))));

        let nameless = register(
            &store,
            &config,
            RegisterRequest { name: "  ".into(), email: "ana@jersey.club".into(), password: "123456".into() },
        )
        .await;
        assert!(matches!(nameless, Err(AppError::InvalidRequest(_))));
    }
}
