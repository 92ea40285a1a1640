use serde::{Deserialize, Serialize};

use super::legacy_id;

pub const ROLE_CUSTOMER: &str = "customer";
pub const ROLE_ADMIN: &str = "admin";

fn default_role() -> String {
    ROLE_CUSTOMER.to_string()
}

/// Usuario registrado (también lee `usuarios.json` legacy)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "legacy_id::deserialize")]
    pub id: String,
    #[serde(alias = "correo")]
    pub email: String,
    /// Hash bcrypt
    #[serde(alias = "contrasena", alias = "contraseña")]
    pub password: String,
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default = "default_role", alias = "rol")]
    pub role: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub last_login: Option<i64>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Vista pública del usuario (nunca incluye el hash)
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: i64,
}

impl From<&User> for UserInfo {
    fn from(u: &User) -> Self {
        UserInfo {
            id: u.id.clone(),
            email: u.email.clone(),
            name: u.name.clone(),
            role: u.role.clone(),
            created_at: u.created_at,
        }
    }
}
