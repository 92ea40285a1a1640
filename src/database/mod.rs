mod store;

use mongodb::{Client, Collection, Database};

use crate::utils::AppError;

pub const PRODUCTS: &str = "products";
pub const CATEGORIES: &str = "categories";
pub const USERS: &str = "users";
pub const CART_ITEMS: &str = "cart_items";
pub const ORDERS: &str = "orders";
pub const META: &str = "meta";

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, AppError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Pool de conexiones
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Nombre de la base desde la URI, o default
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':') && !s.contains('@'))
            .unwrap_or("jersey_club");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Índices: `id` único en cada colección, email y slug únicos,
    /// `user_id` para carrito y pedidos.
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::{doc, Document};
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        let indexes: Vec<(&str, Document, bool)> = vec![
            (PRODUCTS, doc! { "id": 1 }, true),
            (PRODUCTS, doc! { "category_id": 1 }, false),
            (CATEGORIES, doc! { "id": 1 }, true),
            (CATEGORIES, doc! { "slug": 1 }, true),
            (USERS, doc! { "id": 1 }, true),
            (USERS, doc! { "email": 1 }, true),
            (CART_ITEMS, doc! { "id": 1 }, true),
            (CART_ITEMS, doc! { "user_id": 1 }, false),
            (ORDERS, doc! { "id": 1 }, true),
            (ORDERS, doc! { "user_id": 1, "created_at": -1 }, false),
        ];

        for (collection, keys, is_unique) in indexes {
            let label = format!("{}({:?})", collection, keys.keys().collect::<Vec<_>>());
            let mut model = IndexModel::builder().keys(keys).build();
            if is_unique {
                model.options = Some(unique());
            }

            let result = self.collection::<Document>(collection).create_index(model).await;
            settle_index(&label, is_unique, result.map(|_| ()))?;
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Un índice único que falta deja pasar duplicados de email/slug/id:
/// es fatal. Los demás solo afectan rendimiento.
fn settle_index<E: std::fmt::Display>(label: &str, is_unique: bool, result: Result<(), E>) -> Result<(), AppError> {
    match result {
        Ok(()) => {
            log::info!("   ✅ Index ready: {}", label);
            Ok(())
        }
        Err(e) if is_unique => {
            log::error!("   ❌ Unique index {} not created: {}", label, e);
            Err(AppError::DatabaseError(format!("Unique index {} not created: {}", label, e)))
        }
        Err(e) => {
            log::warn!("   ⚠️  Index {} not created: {}", label, e);
            Ok(())
        }
    }
}
