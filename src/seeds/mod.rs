pub mod catalog_seed;
pub mod legacy_import;

pub use catalog_seed::seed_defaults;
pub use legacy_import::import_legacy;

use crate::{
    config::AppConfig,
    store::{JsonStore, Store},
};

/// Datos de arranque: primero la importación legacy, luego el seed,
/// que solo rellena colecciones vacías. Nunca es fatal.
pub async fn bootstrap(store: &dyn Store, config: &AppConfig) {
    if let Some(dir) = &config.import_legacy_dir {
        match JsonStore::open(dir).await {
            Ok(source) => {
                if let Err(e) = import_legacy(&source, store, config.bcrypt_cost).await {
                    log::error!("❌ Legacy import failed: {}", e);
                }
            }
            Err(e) => log::error!("❌ Cannot open legacy dir {}: {}", dir.display(), e),
        }
    }

    if config.seed_on_start {
        seed_defaults(store).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductFilter;

    #[tokio::test]
    async fn legacy_catalog_wins_over_sample_seed() {
        let legacy_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(legacy_dir.path().join("categorias.json"), r#"[{"id": 1, "nombre": "Fútbol"}]"#)
            .await
            .unwrap();
        tokio::fs::write(
            legacy_dir.path().join("productos.json"),
            r#"[{"id": 7, "nombre": "Camiseta Emelec", "precio": 55.5, "stock": 4, "categoria_id": 1}]"#,
        )
        .await
        .unwrap();

        let data_dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(data_dir.path()).await.unwrap();
        let mut config = AppConfig::for_tests(data_dir.path().to_path_buf());
        config.import_legacy_dir = Some(legacy_dir.path().to_path_buf());
        config.seed_on_start = true;

        bootstrap(&store, &config).await;

        let product = store.get_product("7").await.unwrap().unwrap();
        assert_eq!(product.category_id.as_deref(), Some("1"));
        let categories = store.list_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].slug, "futbol");
        assert_eq!(store.list_products(&ProductFilter::default()).await.unwrap().len(), 1);
    }
}
