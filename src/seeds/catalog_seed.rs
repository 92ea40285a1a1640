use crate::{
    models::{new_id, now_ts, slugify, Category, Product, ProductFilter},
    store::Store,
};

const DEFAULT_CATEGORIES: [(&str, &str); 3] = [
    ("Fútbol", "Camisetas de clubes y selecciones"),
    ("Baloncesto", "Jerseys de basket"),
    ("Retro", "Ediciones clásicas"),
];

/// Categorías y camisetas de ejemplo para una tienda vacía.
/// Idempotente; un paso fallido se registra y no detiene el arranque.
pub async fn seed_defaults(store: &dyn Store) {
    let categories = match store.list_categories().await {
        Ok(existing) if !existing.is_empty() => {
            log::info!("🏷️  Categories: {} already in store, skipping seed", existing.len());
            existing
        }
        Ok(_) => seed_categories(store).await,
        Err(e) => {
            log::error!("❌ Failed to read categories for seeding: {}", e);
            return;
        }
    };

    match store.list_products(&ProductFilter::default()).await {
        Ok(existing) if !existing.is_empty() => {
            log::info!("👕 Products: {} already in store, skipping seed", existing.len());
        }
        Ok(_) => seed_products(store, &categories).await,
        Err(e) => log::error!("❌ Failed to read products for seeding: {}", e),
    }
}

async fn seed_categories(store: &dyn Store) -> Vec<Category> {
    log::info!("🏷️  Categories: seeding {} defaults...", DEFAULT_CATEGORIES.len());
    let now = now_ts();
    let mut inserted = Vec::with_capacity(DEFAULT_CATEGORIES.len());

    for (name, description) in DEFAULT_CATEGORIES {
        let category = Category {
            id: new_id(),
            name: name.to_string(),
            slug: slugify(name),
            description: Some(description.to_string()),
            created_at: now,
        };
        match store.insert_category(category).await {
            Ok(c) => inserted.push(c),
            Err(e) => log::error!("   ❌ Failed to seed category {}: {}", name, e),
        }
    }

    log::info!("   ✅ Inserted {} categories", inserted.len());
    inserted
}

async fn seed_products(store: &dyn Store, categories: &[Category]) {
    let category = |slug: &str| categories.iter().find(|c| c.slug == slug).map(|c| c.id.clone());
    let products = build_sample_products(now_ts(), category("futbol"), category("baloncesto"), category("retro"));

    log::info!("👕 Products: seeding {} sample jerseys...", products.len());
    let mut count = 0;
    for product in products {
        let name = product.name.clone();
        match store.insert_product(product).await {
            Ok(_) => count += 1,
            Err(e) => log::error!("   ❌ Failed to seed product {}: {}", name, e),
        }
    }
    log::info!("   ✅ Inserted {} products", count);
}

fn build_sample_products(
    now: i64,
    futbol: Option<String>,
    baloncesto: Option<String>,
    retro: Option<String>,
) -> Vec<Product> {
    let sizes = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let jersey = |name: &str, team: &str, price: f64, stock: i64, category_id: Option<String>, description: &str| Product {
        id: new_id(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        stock,
        category_id,
        team: Some(team.to_string()),
        sizes: sizes(&["S", "M", "L", "XL"]),
        image_url: None,
        created_at: now,
        updated_at: now,
    };

    vec![
        jersey("Camiseta Ecuador Local 2024", "Ecuador", 89.99, 25, futbol.clone(), "Camiseta oficial de la selección, temporada 2024"),
        jersey("Camiseta Barcelona SC 2024", "Barcelona SC", 69.99, 20, futbol.clone(), "Primera equipación del Ídolo del Astillero"),
        jersey("Camiseta LDU Quito 2024", "LDU Quito", 69.99, 15, futbol, "Primera equipación alba"),
        jersey("Jersey Lakers Icon", "Los Angeles Lakers", 79.99, 12, baloncesto.clone(), "Jersey icon edition"),
        jersey("Jersey Bulls Statement", "Chicago Bulls", 79.99, 10, baloncesto, "Jersey statement edition"),
        jersey("Camiseta Ecuador Mundial 2002", "Ecuador", 59.99, 8, retro, "Reedición del primer mundial"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        seed_defaults(&store).await;
        let categories = store.list_categories().await.unwrap();
        let products = store.list_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(categories.len(), 3);
        assert!(categories.iter().any(|c| c.slug == "futbol"));
        assert!(!products.is_empty());
        assert!(products.iter().all(|p| p.validate().is_ok() && p.category_id.is_some()));

        seed_defaults(&store).await;
        assert_eq!(store.list_categories().await.unwrap().len(), 3);
        assert_eq!(store.list_products(&ProductFilter::default()).await.unwrap().len(), products.len());
    }
}
