pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use cart::*;
pub use category::*;
pub use order::*;
pub use product::*;
pub use user::*;

/// Ids legacy: los JSON antiguos guardan ids numéricos (`"id": 7`)
pub(crate) mod legacy_id {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    fn normalize(raw: RawId) -> Result<String, String> {
        match raw {
            RawId::Text(s) => Ok(s),
            RawId::Int(n) => Ok(n.to_string()),
            RawId::Float(f) if f.fract() == 0.0 => Ok((f as i64).to_string()),
            RawId::Float(f) => Err(format!("invalid id {}", f)),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        normalize(RawId::deserialize(deserializer)?).map_err(de::Error::custom)
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawId>::deserialize(deserializer)? {
            Some(raw) => normalize(raw).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
