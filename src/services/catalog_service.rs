// ==================== CATALOG ====================
// Productos y categorías

use crate::{
    models::{
        new_id, now_ts, slugify, Category, CreateCategoryRequest, CreateProductRequest, Product,
        ProductFilter, UpdateProductRequest,
    },
    store::Store,
    utils::AppError,
};

/// Tallas en mayúsculas, sin vacíos ni duplicados, en el orden recibido
fn normalize_sizes(sizes: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(sizes.len());
    for size in sizes {
        let size = size.trim().to_uppercase();
        if !size.is_empty() && !out.contains(&size) {
            out.push(size);
        }
    }
    out
}

async fn ensure_category(store: &dyn Store, category_id: Option<&str>) -> Result<(), AppError> {
    if let Some(id) = category_id {
        if store.get_category(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
    }
    Ok(())
}

pub async fn list_products(store: &dyn Store, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
    if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
        if min > max {
            return Err(AppError::InvalidRequest("min_price cannot exceed max_price".to_string()));
        }
    }
    store.list_products(filter).await
}

pub async fn get_product(store: &dyn Store, id: &str) -> Result<Product, AppError> {
    store
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
}

pub async fn create_product(store: &dyn Store, request: CreateProductRequest) -> Result<Product, AppError> {
    let now = now_ts();
    let product = Product {
        id: new_id(),
        name: request.name.trim().to_string(),
        description: request.description.trim().to_string(),
        price: request.price,
        stock: request.stock,
        category_id: request.category_id.filter(|c| !c.is_empty()),
        team: request.team.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        sizes: normalize_sizes(request.sizes),
        image_url: request.image_url.filter(|u| !u.is_empty()),
        created_at: now,
        updated_at: now,
    };

    product.validate().map_err(AppError::InvalidRequest)?;
    ensure_category(store, product.category_id.as_deref()).await?;

    store.insert_product(product).await
}

pub async fn update_product(
    store: &dyn Store,
    id: &str,
    request: UpdateProductRequest,
) -> Result<Product, AppError> {
    let mut product = get_product(store, id).await?;
    let previous_category = product.category_id.clone();

    request.apply_to(&mut product);
    product.name = product.name.trim().to_string();
    product.sizes = normalize_sizes(std::mem::take(&mut product.sizes));
    product.updated_at = now_ts();

    product.validate().map_err(AppError::InvalidRequest)?;
    if product.category_id != previous_category {
        ensure_category(store, product.category_id.as_deref()).await?;
    }

    store.update_product(product).await
}

pub async fn delete_product(store: &dyn Store, id: &str) -> Result<(), AppError> {
    if !store.delete_product(id).await? {
        return Err(AppError::NotFound(format!("Product {} not found", id)));
    }
    Ok(())
}

pub async fn list_categories(store: &dyn Store) -> Result<Vec<Category>, AppError> {
    store.list_categories().await
}

pub async fn create_category(store: &dyn Store, request: CreateCategoryRequest) -> Result<Category, AppError> {
    let name = request.name.trim().to_string();
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(AppError::InvalidRequest("Category name is required".to_string()));
    }

    if store.list_categories().await?.iter().any(|c| c.slug == slug) {
        return Err(AppError::Conflict(format!("Category '{}' already exists", name)));
    }

    store
        .insert_category(Category {
            id: new_id(),
            name,
            slug,
            description: request.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            created_at: now_ts(),
        })
        .await
}

pub async fn delete_category(store: &dyn Store, id: &str) -> Result<(), AppError> {
    let in_use = store
        .list_products(&ProductFilter { category_id: Some(id.to_string()), ..Default::default() })
        .await?
        .len();
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Category is used by {} product(s)",
            in_use
        )));
    }

    if !store.delete_category(id).await? {
        return Err(AppError::NotFound(format!("Category {} not found", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;

    fn request(name: &str, price: f64) -> CreateProductRequest {
        CreateProductRequest {
            name: name.into(),
            description: String::new(),
            price,
            stock: 10,
            category_id: None,
            team: Some(" Emelec ".into()),
            sizes: vec!["m".into(), " L ".into(), "M".into(), "".into()],
            image_url: None,
        }
    }

    #[test]
    fn sizes_are_normalized() {
        assert_eq!(
            normalize_sizes(vec!["s".into(), "S ".into(), " ".into(), "xl".into()]),
            vec!["S".to_string(), "XL".to_string()]
        );
    }

    #[tokio::test]
    async fn create_product_normalizes_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        let p = create_product(&store, request("  Camiseta Emelec  ", 35.0)).await.unwrap();
        assert_eq!(p.name, "Camiseta Emelec");
        assert_eq!(p.team.as_deref(), Some("Emelec"));
        assert_eq!(p.sizes, vec!["M".to_string(), "L".to_string()]);

        let err = create_product(&store, request("Gratis", 0.0)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));

        let mut orphan = request("Sin categoría", 10.0);
        orphan.category_id = Some("nope".into());
        assert!(matches!(create_product(&store, orphan).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn category_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        let cat = create_category(&store, CreateCategoryRequest { name: "Fútbol".into(), description: None })
            .await
            .unwrap();
        assert_eq!(cat.slug, "futbol");

        let dup = create_category(&store, CreateCategoryRequest { name: "FUTBOL".into(), description: None }).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let mut req = request("Camiseta Liga", 50.0);
        req.category_id = Some(cat.id.clone());
        let product = create_product(&store, req).await.unwrap();

        assert!(matches!(delete_category(&store, &cat.id).await, Err(AppError::Conflict(_))));

        delete_product(&store, &product.id).await.unwrap();
        delete_category(&store, &cat.id).await.unwrap();
        assert!(matches!(delete_category(&store, &cat.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_is_partial() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        let p = create_product(&store, request("Camiseta Aucas", 30.0)).await.unwrap();

        let updated = update_product(
            &store,
            &p.id,
            UpdateProductRequest { stock: Some(0), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(updated.stock, 0);
        assert_eq!(updated.price, 30.0);

        let bad = update_product(&store, &p.id, UpdateProductRequest { price: Some(-1.0), ..Default::default() }).await;
        assert!(matches!(bad, Err(AppError::InvalidRequest(_))));
        assert!(matches!(
            update_product(&store, "missing", UpdateProductRequest::default()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
