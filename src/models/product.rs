use serde::{Deserialize, Serialize};

use super::legacy_id;

/// Tope de precio unitario; mantiene los totales dentro del rango de `Decimal`
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Camiseta del catálogo.
///
/// Acepta las claves en español de `productos.json` (`nombre`, `precio`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct Product {
    #[serde(deserialize_with = "legacy_id::deserialize")]
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(alias = "precio")]
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(
        default,
        alias = "categoria_id",
        alias = "categoria",
        deserialize_with = "legacy_id::deserialize_opt"
    )]
    pub category_id: Option<String>,
    #[serde(default, alias = "equipo")]
    pub team: Option<String>,
    #[serde(default, alias = "tallas")]
    pub sizes: Vec<String>,
    #[serde(default, alias = "imagen")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Product {
    /// Valida invariantes de campo (nombre, precio, stock)
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name is required".to_string());
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err("Price must be greater than 0".to_string());
        }
        if self.price > MAX_PRICE {
            return Err(format!("Price cannot exceed {}", MAX_PRICE));
        }
        if self.stock < 0 {
            return Err("Stock cannot be negative".to_string());
        }
        Ok(())
    }

    /// Si el producto maneja tallas, `size` debe ser una de ellas
    pub fn accepts_size(&self, size: Option<&str>) -> bool {
        if self.sizes.is_empty() {
            return true;
        }
        match size {
            Some(s) => self.sizes.iter().any(|t| t.eq_ignore_ascii_case(s)),
            None => false,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateProductRequest {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(alias = "precio")]
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, alias = "categoria_id")]
    pub category_id: Option<String>,
    #[serde(default, alias = "equipo")]
    pub team: Option<String>,
    #[serde(default, alias = "tallas")]
    pub sizes: Vec<String>,
    #[serde(default, alias = "imagen")]
    pub image_url: Option<String>,
}

/// PUT parcial: los campos ausentes se conservan
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateProductRequest {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    #[serde(alias = "descripcion")]
    pub description: Option<String>,
    #[serde(alias = "precio")]
    pub price: Option<f64>,
    pub stock: Option<i64>,
    #[serde(alias = "categoria_id")]
    pub category_id: Option<String>,
    #[serde(alias = "equipo")]
    pub team: Option<String>,
    #[serde(alias = "tallas")]
    pub sizes: Option<Vec<String>>,
    #[serde(alias = "imagen")]
    pub image_url: Option<String>,
}

impl UpdateProductRequest {
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = Some(category_id).filter(|c| !c.is_empty());
        }
        if let Some(team) = self.team {
            product.team = Some(team).filter(|t| !t.is_empty());
        }
        if let Some(sizes) = self.sizes {
            product.sizes = sizes;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = Some(image_url).filter(|u| !u.is_empty());
        }
    }
}

/// Filtros de `GET /api/productos`
#[derive(Debug, Default, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    pub team: Option<String>,
    /// Búsqueda libre en nombre, equipo y descripción
    pub q: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock: Option<bool>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category_id) = &self.category_id {
            if product.category_id.as_deref() != Some(category_id.as_str()) {
                return false;
            }
        }
        if let Some(team) = &self.team {
            match &product.team {
                Some(t) if t.eq_ignore_ascii_case(team) => {}
                _ => return false,
            }
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            let hit = product.name.to_lowercase().contains(&needle)
                || product.description.to_lowercase().contains(&needle)
                || product
                    .team
                    .as_deref()
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false);
            if !hit {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        if self.in_stock == Some(true) && product.stock <= 0 {
            return false;
        }
        true
    }
}
