// ==================== PRICING ====================
// Totales, IVA y descuento de stock. Funciones puras: los stores
// las llaman dentro de su transacción / lock.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap};

use crate::{
    models::{new_id, now_ts, CartItem, CartLine, CartSummary, Order, OrderItem, OrderStatus, Product},
    utils::AppError,
};

/// Descuento de stock que el store debe aplicar junto con el pedido
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: String,
    pub quantity: i64,
}

/// Importe a `Decimal` desde su representación decimal más corta
/// (`1.5`, no `1.4999999999999999`).
fn to_decimal(value: f64) -> Decimal {
    value.to_string().parse().unwrap_or_default()
}

fn to_money(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Redondeo a centavos, mitad lejos de cero
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_money(round_cents(to_decimal(unit_price).saturating_mul(Decimal::from(quantity))))
}

/// (subtotal, tax, total)
pub fn totals(line_totals: impl IntoIterator<Item = f64>, tax_rate: f64) -> (f64, f64, f64) {
    let subtotal = round_cents(
        line_totals
            .into_iter()
            .map(to_decimal)
            .fold(Decimal::ZERO, Decimal::saturating_add),
    );
    let tax = round_cents(subtotal.saturating_mul(to_decimal(tax_rate)));
    let total = round_cents(subtotal.saturating_add(tax));
    (to_money(subtotal), to_money(tax), to_money(total))
}

/// Valoriza el carrito con los precios actuales. No valida stock;
/// las líneas cuyo producto ya no existe se omiten.
pub fn quote(items: &[CartItem], products: &HashMap<String, Product>, tax_rate: f64) -> CartSummary {
    let lines: Vec<CartLine> = items
        .iter()
        .filter_map(|item| {
            let product = products.get(&item.product_id)?;
            Some(CartLine {
                id: item.id.clone(),
                product_id: item.product_id.clone(),
                name: product.name.clone(),
                size: item.size.clone(),
                unit_price: product.price,
                quantity: item.quantity,
                line_total: line_total(product.price, item.quantity),
            })
        })
        .collect();

    let (subtotal, tax, total) = totals(lines.iter().map(|l| l.line_total), tax_rate);
    let item_count = lines.iter().fold(0i64, |acc, l| acc.saturating_add(l.quantity));

    CartSummary { items: lines, subtotal, tax, total, item_count }
}

/// Convierte el carrito en un pedido `pending`.
///
/// La cantidad pedida de un producto se suma entre tallas antes de
/// compararla con su stock.
pub fn build_order(
    user_id: &str,
    items: &[CartItem],
    products: &HashMap<String, Product>,
    tax_rate: f64,
    shipping_address: Option<String>,
) -> Result<(Order, Vec<StockChange>), AppError> {
    if items.is_empty() {
        return Err(AppError::InvalidRequest("Cart is empty".to_string()));
    }

    let mut requested: BTreeMap<&str, i64> = BTreeMap::new();
    let mut order_items = Vec::with_capacity(items.len());

    for item in items {
        let product = products.get(&item.product_id).ok_or_else(|| {
            AppError::NotFound(format!("Product {} no longer exists", item.product_id))
        })?;
        if item.quantity <= 0 {
            return Err(AppError::InvalidRequest(format!(
                "Invalid quantity {} for {}",
                item.quantity, product.name
            )));
        }

        let wanted = requested.entry(product.id.as_str()).or_insert(0);
        *wanted = wanted.checked_add(item.quantity).ok_or_else(|| {
            AppError::Conflict(format!("Insufficient stock for {}", product.name))
        })?;

        order_items.push(OrderItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            size: item.size.clone(),
            unit_price: product.price,
            quantity: item.quantity,
            line_total: line_total(product.price, item.quantity),
        });
    }

    let mut changes = Vec::with_capacity(requested.len());
    for (product_id, quantity) in requested {
        // el id viene de `products`, existe
        let product = &products[product_id];
        if quantity > product.stock {
            return Err(AppError::Conflict(format!(
                "Insufficient stock for {}: requested {}, available {}",
                product.name, quantity, product.stock
            )));
        }
        changes.push(StockChange { product_id: product_id.to_string(), quantity });
    }

    let (subtotal, tax, total) = totals(order_items.iter().map(|i| i.line_total), tax_rate);
    let now = now_ts();

    let order = Order {
        id: new_id(),
        user_id: user_id.to_string(),
        items: order_items,
        subtotal,
        tax,
        total,
        tax_rate,
        status: OrderStatus::Pending,
        shipping_address: shipping_address.filter(|a| !a.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };

    Ok((order, changes))
}

/// Stock a devolver al cancelar un pedido
pub fn restock_changes(order: &Order) -> Vec<StockChange> {
    let mut per_product: BTreeMap<&str, i64> = BTreeMap::new();
    for item in &order.items {
        let quantity = per_product.entry(item.product_id.as_str()).or_insert(0);
        *quantity = quantity.saturating_add(item.quantity);
    }
    per_product
        .into_iter()
        .map(|(product_id, quantity)| StockChange { product_id: product_id.to_string(), quantity })
        .collect()
}
