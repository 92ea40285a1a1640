// ==================== LEGACY IMPORT ====================
// Copia los JSON de la tienda antigua (productos, categorías, usuarios)
// hacia el store activo. No toca carritos ni pedidos.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::{
    models::{slugify, ProductFilter, ROLE_ADMIN, ROLE_CUSTOMER},
    services::auth_service::hash_password,
    store::{JsonStore, Store},
    utils::AppError,
};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub categories: usize,
    pub products: usize,
    pub users: usize,
    pub skipped: usize,
}

fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60 && ["$2a$", "$2b$", "$2y$"].iter().any(|p| value.starts_with(p))
}

fn normalize_role(role: &str) -> &'static str {
    match role.trim().to_lowercase().as_str() {
        "admin" | "administrador" => ROLE_ADMIN,
        _ => ROLE_CUSTOMER,
    }
}

/// Importa lo que el destino aún no tiene (por id, slug o email)
pub async fn import_legacy(source: &JsonStore, target: &dyn Store, bcrypt_cost: u32) -> Result<ImportReport, AppError> {
    log::info!("📦 Importing legacy data from {}", source.dir().display());
    let mut report = ImportReport::default();

    // ---- categorías ----
    // id legacy -> id en destino; un slug ya existente se reutiliza
    let existing = target.list_categories().await?;
    let mut ids: HashMap<String, String> = existing.iter().map(|c| (c.id.clone(), c.id.clone())).collect();
    let mut slugs: HashMap<String, String> = existing.iter().map(|c| (c.slug.clone(), c.id.clone())).collect();

    for mut category in source.list_categories().await? {
        if category.slug.is_empty() {
            category.slug = slugify(&category.name);
        }
        if ids.contains_key(&category.id) || category.slug.is_empty() {
            report.skipped += 1;
            continue;
        }
        if let Some(target_id) = slugs.get(&category.slug).cloned() {
            log::info!("   🔗 Legacy category {} merged into {} ({})", category.id, target_id, category.slug);
            ids.insert(category.id.clone(), target_id);
            report.skipped += 1;
            continue;
        }
        ids.insert(category.id.clone(), category.id.clone());
        slugs.insert(category.slug.clone(), category.id.clone());
        target.insert_category(category).await?;
        report.categories += 1;
    }

    // ---- productos ----
    let known: HashSet<String> = target
        .list_products(&ProductFilter::default())
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    for mut product in source.list_products(&ProductFilter::default()).await? {
        if known.contains(&product.id) {
            report.skipped += 1;
            continue;
        }
        if let Err(reason) = product.validate() {
            log::warn!("   ⚠️  Skipping legacy product {}: {}", product.id, reason);
            report.skipped += 1;
            continue;
        }
        if let Some(category_id) = product.category_id.take() {
            product.category_id = ids.get(&category_id).cloned();
            if product.category_id.is_none() {
                log::warn!("   ⚠️  Product {} references unknown category {}; cleared", product.id, category_id);
            }
        }
        target.insert_product(product).await?;
        report.products += 1;
    }

    // ---- usuarios ----
    for mut user in source.list_users().await? {
        user.email = user.email.trim().to_lowercase();
        if target.get_user(&user.id).await?.is_some() || target.find_user_by_email(&user.email).await?.is_some() {
            report.skipped += 1;
            continue;
        }
        if !is_bcrypt_hash(&user.password) {
            user.password = hash_password(user.password, bcrypt_cost).await?;
        }
        user.role = normalize_role(&user.role).to_string();
        target.insert_user(user).await?;
        report.users += 1;
    }

    log::info!(
        "   ✅ Imported {} categories, {} products, {} users ({} skipped)",
        report.categories,
        report.products,
        report.users,
        report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth_service::{login, LoginRequest};
    use crate::config::AppConfig;
    use crate::seeds::seed_defaults;

    const LEGACY_CATEGORIES: &str = r#"[{"id": 1, "nombre": "Fútbol"}, {"id": 2, "nombre": "Retro"}]"#;
    const LEGACY_PRODUCTS: &str = r#"[
        {"id": 7, "nombre": "Camiseta Emelec", "precio": 55.5, "stock": 4, "categoria_id": 1, "tallas": ["M"]},
        {"id": 8, "nombre": "Sin precio", "precio": 0, "stock": 1}
    ]"#;
    const LEGACY_USERS: &str = r#"[
        {"id": 1, "correo": "Admin@Jersey.club", "contrasena": "clave123", "nombre": "Admin", "rol": "administrador"}
    ]"#;

    #[tokio::test]
    async fn imports_once_and_hashes_plaintext_passwords() {
        let legacy_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(legacy_dir.path().join("categorias.json"), LEGACY_CATEGORIES).await.unwrap();
        tokio::fs::write(legacy_dir.path().join("productos.json"), LEGACY_PRODUCTS).await.unwrap();
        tokio::fs::write(legacy_dir.path().join("usuarios.json"), LEGACY_USERS).await.unwrap();
        let source = JsonStore::open(legacy_dir.path()).await.unwrap();

        let target_dir = tempfile::tempdir().unwrap();
        let target = JsonStore::open(target_dir.path()).await.unwrap();

        let report = import_legacy(&source, &target, 4).await.unwrap();
        assert_eq!(report, ImportReport { categories: 2, products: 1, users: 1, skipped: 1 });

        let product = target.get_product("7").await.unwrap().unwrap();
        assert_eq!(product.category_id.as_deref(), Some("1"));

        let user = target.find_user_by_email("admin@jersey.club").await.unwrap().unwrap();
        assert!(is_bcrypt_hash(&user.password));
        assert!(user.is_admin());

        let config = AppConfig::for_tests(target_dir.path().to_path_buf());
        let auth = login(&target, &config, LoginRequest { email: "admin@jersey.club".into(), password: "clave123".into() })
            .await
            .unwrap();
        assert_eq!(auth.user.id, "1");

        let again = import_legacy(&source, &target, 4).await.unwrap();
        assert_eq!(again, ImportReport { categories: 0, products: 0, users: 0, skipped: 5 });
    }

    #[tokio::test]
    async fn seeded_category_with_same_slug_keeps_product_link() {
        let legacy_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(legacy_dir.path().join("categorias.json"), LEGACY_CATEGORIES).await.unwrap();
        tokio::fs::write(legacy_dir.path().join("productos.json"), LEGACY_PRODUCTS).await.unwrap();
        let source = JsonStore::open(legacy_dir.path()).await.unwrap();

        let target_dir = tempfile::tempdir().unwrap();
        let target = JsonStore::open(target_dir.path()).await.unwrap();
        seed_defaults(&target).await;

        let futbol = target
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.slug == "futbol")
            .unwrap();

        let report = import_legacy(&source, &target, 4).await.unwrap();
        assert_eq!(report.categories, 0);
        assert_eq!(report.products, 1);

        let product = target.get_product("7").await.unwrap().unwrap();
        assert_eq!(product.category_id, Some(futbol.id));
        assert_eq!(target.list_categories().await.unwrap().len(), 3);
    }
}
