// ==================== MONGODB STORE ====================
// `place_order` y `transition_order` corren dentro de una transacción
// de sesión: requieren que MongoDB sea replica set.

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::ReturnDocument,
    ClientSession, Collection,
};
use std::collections::HashMap;

use super::{MongoDB, CART_ITEMS, CATEGORIES, META, ORDERS, PRODUCTS, USERS};
use crate::{
    models::{now_ts, CartItem, Category, Order, OrderStatus, Product, ProductFilter, User, ROLE_ADMIN, ROLE_CUSTOMER},
    services::pricing::{self, StockChange},
    store::{Store, StoreStats},
    utils::AppError,
};

const DUPLICATE_KEY: i32 = 11000;
const FIRST_ADMIN_MARKER: &str = "first_admin";

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY
    )
}

fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Traduce `ProductFilter` a un filtro de MongoDB
pub(crate) fn product_filter_doc(filter: &ProductFilter) -> Document {
    let mut query = Document::new();

    if let Some(category_id) = &filter.category_id {
        query.insert("category_id", category_id);
    }
    if let Some(team) = &filter.team {
        query.insert(
            "team",
            doc! { "$regex": format!("^{}$", escape_regex(team)), "$options": "i" },
        );
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = escape_regex(q);
        query.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "team": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }

    let mut price = Document::new();
    if let Some(min) = filter.min_price {
        price.insert("$gte", min);
    }
    if let Some(max) = filter.max_price {
        price.insert("$lte", max);
    }
    if !price.is_empty() {
        query.insert("price", price);
    }

    if filter.in_stock == Some(true) {
        query.insert("stock", doc! { "$gt": 0_i64 });
    }

    query
}

impl MongoDB {
    fn products(&self) -> Collection<Product> {
        self.collection(PRODUCTS)
    }

    fn categories(&self) -> Collection<Category> {
        self.collection(CATEGORIES)
    }

    fn users(&self) -> Collection<User> {
        self.collection(USERS)
    }

    fn cart_items(&self) -> Collection<CartItem> {
        self.collection(CART_ITEMS)
    }

    fn orders(&self) -> Collection<Order> {
        self.collection(ORDERS)
    }

    async fn apply_stock(
        &self,
        session: &mut ClientSession,
        changes: &[StockChange],
        sign: i64,
        now: i64,
    ) -> Result<(), AppError> {
        for change in changes {
            let mut filter = doc! { "id": &change.product_id };
            if sign < 0 {
                // $inc con guarda: nunca deja stock negativo
                filter.insert("stock", doc! { "$gte": change.quantity });
            }

            let result = self
                .products()
                .update_one(
                    filter,
                    doc! {
                        "$inc": { "stock": sign * change.quantity },
                        "$set": { "updated_at": now },
                    },
                )
                .session(&mut *session)
                .await?;

            if result.matched_count == 0 && sign < 0 {
                return Err(AppError::Conflict(format!(
                    "Insufficient stock for product {}",
                    change.product_id
                )));
            }
        }
        Ok(())
    }

    async fn place_order_in(
        &self,
        session: &mut ClientSession,
        user_id: &str,
        tax_rate: f64,
        shipping_address: Option<String>,
    ) -> Result<Order, AppError> {
        let lines: Vec<CartItem> = self
            .cart_items()
            .find(doc! { "user_id": user_id })
            .session(&mut *session)
            .await?
            .stream(&mut *session)
            .try_collect()
            .await?;

        let ids: Vec<&str> = lines.iter().map(|l| l.product_id.as_str()).collect();
        let catalog: HashMap<String, Product> = self
            .products()
            .find(doc! { "id": { "$in": ids } })
            .session(&mut *session)
            .await?
            .stream(&mut *session)
            .try_collect::<Vec<Product>>()
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let (order, changes) =
            pricing::build_order(user_id, &lines, &catalog, tax_rate, shipping_address)?;

        self.apply_stock(session, &changes, -1, order.created_at).await?;
        self.orders().insert_one(&order).session(&mut *session).await?;
        self.cart_items()
            .delete_many(doc! { "user_id": user_id })
            .session(&mut *session)
            .await?;

        Ok(order)
    }

    async fn transition_order_in(
        &self,
        session: &mut ClientSession,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        restock: bool,
    ) -> Result<Order, AppError> {
        let now = now_ts();
        let updated = self
            .orders()
            .find_one_and_update(
                doc! { "id": id, "status": from.as_str() },
                doc! { "$set": { "status": to.as_str(), "updated_at": now } },
            )
            .return_document(ReturnDocument::After)
            .session(&mut *session)
            .await?;

        let order = match updated {
            Some(order) => order,
            None => {
                let current = self
                    .orders()
                    .find_one(doc! { "id": id })
                    .session(&mut *session)
                    .await?;
                return Err(match current {
                    Some(o) => AppError::Conflict(format!(
                        "Order {} is {}, expected {}",
                        id, o.status, from
                    )),
                    None => AppError::NotFound(format!("Order {} not found", id)),
                });
            }
        };

        if restock {
            self.apply_stock(session, &pricing::restock_changes(&order), 1, now).await?;
        }

        Ok(order)
    }
}

/// Commit si `result` es Ok; abort en cualquier otro caso
async fn finish_transaction<T>(
    mut session: ClientSession,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            session.commit_transaction().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(abort_err) = session.abort_transaction().await {
                log::warn!("⚠️  Transaction abort failed: {}", abort_err);
            }
            Err(e)
        }
    }
}

#[async_trait]
impl Store for MongoDB {
    fn backend(&self) -> &'static str {
        "mongo"
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let cursor = self
            .products()
            .find(product_filter_doc(filter))
            .sort(doc! { "name": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, AppError> {
        Ok(self.products().find_one(doc! { "id": id }).await?)
    }

    async fn insert_product(&self, product: Product) -> Result<Product, AppError> {
        match self.products().insert_one(&product).await {
            Ok(_) => Ok(product),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::Conflict(format!("Product {} already exists", product.id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_product(&self, product: Product) -> Result<Product, AppError> {
        let result = self
            .products()
            .replace_one(doc! { "id": &product.id }, &product)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Product {} not found", product.id)));
        }
        Ok(product)
    }

    async fn delete_product(&self, id: &str) -> Result<bool, AppError> {
        let result = self.products().delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let cursor = self.categories().find(doc! {}).sort(doc! { "name": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>, AppError> {
        Ok(self.categories().find_one(doc! { "id": id }).await?)
    }

    async fn insert_category(&self, category: Category) -> Result<Category, AppError> {
        match self.categories().insert_one(&category).await {
            Ok(_) => Ok(category),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::Conflict(format!("Category '{}' already exists", category.name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_category(&self, id: &str) -> Result<bool, AppError> {
        let result = self.categories().delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        // los emails se guardan normalizados en minúsculas
        Ok(self
            .users()
            .find_one(doc! { "email": email.trim().to_lowercase() })
            .await?)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "id": id }).await?)
    }

    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        match self.users().insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::Conflict("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn touch_last_login(&self, id: &str, at: i64) -> Result<(), AppError> {
        self.users()
            .update_one(doc! { "id": id }, doc! { "$set": { "last_login": at } })
            .await?;
        Ok(())
    }

    async fn register_user(&self, mut user: User) -> Result<User, AppError> {
        user.role = ROLE_CUSTOMER.to_string();

        // Solo un insert del marcador puede ganar (_id único)
        let mut claimed = false;
        if self.users().count_documents(doc! {}).await? == 0 {
            match self
                .collection::<Document>(META)
                .insert_one(doc! { "_id": FIRST_ADMIN_MARKER, "user_id": &user.id })
                .await
            {
                Ok(_) => claimed = true,
                Err(e) if is_duplicate_key(&e) => {}
                Err(e) => return Err(e.into()),
            }
        }
        if claimed {
            user.role = ROLE_ADMIN.to_string();
        }

        let result = self.insert_user(user).await;
        if result.is_err() && claimed {
            self.collection::<Document>(META)
                .delete_one(doc! { "_id": FIRST_ADMIN_MARKER })
                .await?;
        }
        result
    }

    async fn list_cart(&self, user_id: &str) -> Result<Vec<CartItem>, AppError> {
        let cursor = self
            .cart_items()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "added_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn save_cart_item(&self, item: CartItem) -> Result<CartItem, AppError> {
        self.cart_items()
            .replace_one(doc! { "id": &item.id }, &item)
            .upsert(true)
            .await?;
        Ok(item)
    }

    async fn delete_cart_item(&self, user_id: &str, item_id: &str) -> Result<bool, AppError> {
        let result = self
            .cart_items()
            .delete_one(doc! { "id": item_id, "user_id": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn clear_cart(&self, user_id: &str) -> Result<(), AppError> {
        self.cart_items().delete_many(doc! { "user_id": user_id }).await?;
        Ok(())
    }

    async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>, AppError> {
        let filter = match user_id {
            Some(u) => doc! { "user_id": u },
            None => doc! {},
        };
        let cursor = self.orders().find(filter).sort(doc! { "created_at": -1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, AppError> {
        Ok(self.orders().find_one(doc! { "id": id }).await?)
    }

    async fn place_order(
        &self,
        user_id: &str,
        tax_rate: f64,
        shipping_address: Option<String>,
    ) -> Result<Order, AppError> {
        let mut session = self.client().start_session().await?;
        session.start_transaction().await?;
        let result = self
            .place_order_in(&mut session, user_id, tax_rate, shipping_address)
            .await;
        finish_transaction(session, result).await
    }

    async fn transition_order(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        restock: bool,
    ) -> Result<Order, AppError> {
        let mut session = self.client().start_session().await?;
        session.start_transaction().await?;
        let result = self
            .transition_order_in(&mut session, id, from, to, restock)
            .await;
        finish_transaction(session, result).await
    }

    async fn stats(&self) -> Result<StoreStats, AppError> {
        Ok(StoreStats {
            products: self.products().count_documents(doc! {}).await?,
            categories: self.categories().count_documents(doc! {}).await?,
            users: self.users().count_documents(doc! {}).await?,
            orders: self.orders().count_documents(doc! {}).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_metacharacters_are_escaped() {
        assert_eq!(escape_regex("Paris S.G. (2024)"), "Paris S\\.G\\. \\(2024\\)");
    }

    #[test]
    fn filter_doc_combines_conditions() {
        let filter = ProductFilter {
            category_id: Some("c1".into()),
            q: Some("retro".into()),
            min_price: Some(10.0),
            in_stock: Some(true),
            ..Default::default()
        };
        let query = product_filter_doc(&filter);

        assert_eq!(query.get_str("category_id").unwrap(), "c1");
        assert_eq!(query.get_array("$or").unwrap().len(), 3);
        assert_eq!(query.get_document("price").unwrap().get_f64("$gte").unwrap(), 10.0);
        assert!(query.get_document("price").unwrap().get("$lte").is_none());
        assert_eq!(query.get_document("stock").unwrap().get_i64("$gt").unwrap(), 0);
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(product_filter_doc(&ProductFilter::default()).is_empty());
    }
}
