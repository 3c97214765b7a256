use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use shopbot_core::{
    BusinessFunction, Cart, CartItem, FunctionError, Order, OrderItem, OrderStatus,
    ParameterSchema, Product,
};

use super::product::find_product;
use super::round_cents;
use crate::{ShopContext, parameters_for, parse_input, to_payload};

fn insufficient_stock(product: &Product, requested: u32) -> FunctionError {
    FunctionError::business(format!(
        "insufficient stock for {} ({}): requested {}, available {}",
        product.name, product.id, requested, product.stock
    ))
}

fn not_in_cart(product_id: &str) -> FunctionError {
    FunctionError::business(format!("Product {} is not in the cart", product_id))
}

/// Display name of a product, or its id when the catalog no longer has it.
async fn product_name(ctx: &ShopContext, product_id: &str) -> Result<String, FunctionError> {
    Ok(ctx
        .storage
        .load_products()
        .await?
        .into_iter()
        .find(|p| p.id == product_id)
        .map(|p| p.name)
        .unwrap_or_else(|| product_id.to_string()))
}

async fn remove_item(ctx: &ShopContext, user_id: &str, product_id: &str) -> Result<Value, FunctionError> {
    let mut cart = ctx.storage.load_cart(user_id).await?;
    cart.remove(product_id).ok_or_else(|| not_in_cart(product_id))?;
    let name = product_name(ctx, product_id).await?;
    ctx.storage.save_cart(&cart).await?;

    Ok(json!({
        "success": true,
        "message": format!("Removed {} from cart", name),
        "product_id": product_id,
        "cart_total": round_cents(cart.total()),
    }))
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddToCartInput {
    /// Product ID to add to cart
    product_id: String,
    /// Quantity to add (default: 1)
    quantity: Option<i64>,
    /// User ID (defaults to current user if not provided)
    user_id: Option<String>,
}

pub struct AddToCart {
    ctx: ShopContext,
}

impl AddToCart {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for AddToCart {
    fn name(&self) -> &str {
        "add_to_cart"
    }

    fn description(&self) -> &str {
        "Add a product to the shopping cart"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<AddToCartInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: AddToCartInput = parse_input(args)?;
        let quantity = input.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(FunctionError::invalid("quantity", "must be at least 1"));
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| FunctionError::invalid("quantity", "too large"))?;

        // Stock is checked before the cart is loaded so a refusal leaves it untouched.
        let product = find_product(&self.ctx, &input.product_id).await?;
        if !product.has_stock_for(quantity) {
            return Err(insufficient_stock(&product, quantity));
        }

        let user_id = self.ctx.user(input.user_id);
        let mut cart = self.ctx.storage.load_cart(&user_id).await?;
        let in_cart = match cart.item_mut(&product.id) {
            Some(item) => {
                let total = item.quantity.saturating_add(quantity);
                if !product.has_stock_for(total) {
                    return Err(insufficient_stock(&product, total));
                }
                item.quantity = total;
                total
            }
            None => {
                cart.items.push(CartItem {
                    product_id: product.id.clone(),
                    quantity,
                    price: product.price,
                });
                quantity
            }
        };
        self.ctx.storage.save_cart(&cart).await?;

        Ok(json!({
            "success": true,
            "message": format!("Added {} x {} to cart", quantity, product.name),
            "product_id": product.id,
            "quantity_in_cart": in_cart,
            "cart_total": round_cents(cart.total()),
        }))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RemoveFromCartInput {
    /// Product ID to remove from cart
    product_id: String,
    /// User ID (defaults to current user if not provided)
    user_id: Option<String>,
}

pub struct RemoveFromCart {
    ctx: ShopContext,
}

impl RemoveFromCart {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for RemoveFromCart {
    fn name(&self) -> &str {
        "remove_from_cart"
    }

    fn description(&self) -> &str {
        "Remove a product from the shopping cart"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<RemoveFromCartInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: RemoveFromCartInput = parse_input(args)?;
        let user_id = self.ctx.user(input.user_id);
        remove_item(&self.ctx, &user_id, &input.product_id).await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UpdateQuantityInput {
    /// Product ID to update
    product_id: String,
    /// New quantity; zero or less removes the item
    quantity: i64,
    /// User ID (defaults to current user if not provided)
    user_id: Option<String>,
}

pub struct UpdateCartQuantity {
    ctx: ShopContext,
}

impl UpdateCartQuantity {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for UpdateCartQuantity {
    fn name(&self) -> &str {
        "update_cart_quantity"
    }

    fn description(&self) -> &str {
        "Update the quantity of a product in the cart"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<UpdateQuantityInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: UpdateQuantityInput = parse_input(args)?;
        let user_id = self.ctx.user(input.user_id);
        if input.quantity <= 0 {
            return remove_item(&self.ctx, &user_id, &input.product_id).await;
        }
        let quantity = u32::try_from(input.quantity)
            .map_err(|_| FunctionError::invalid("quantity", "too large"))?;

        let product = find_product(&self.ctx, &input.product_id).await?;
        if !product.has_stock_for(quantity) {
            return Err(insufficient_stock(&product, quantity));
        }

        let mut cart = self.ctx.storage.load_cart(&user_id).await?;
        let item = cart
            .item_mut(&product.id)
            .ok_or_else(|| not_in_cart(&product.id))?;
        item.quantity = quantity;
        self.ctx.storage.save_cart(&cart).await?;

        Ok(json!({
            "success": true,
            "message": format!("Updated {} quantity to {}", product.name, quantity),
            "product_id": product.id,
            "quantity_in_cart": quantity,
            "cart_total": round_cents(cart.total()),
        }))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CartOwnerInput {
    /// User ID (defaults to current user if not provided)
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CartLine {
    product_id: String,
    name: String,
    price: f64,
    quantity: u32,
    item_total: f64,
}

#[derive(Debug, Serialize)]
struct CartView {
    items: Vec<CartLine>,
    total: f64,
    item_count: usize,
}

pub struct ViewCart {
    ctx: ShopContext,
}

impl ViewCart {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for ViewCart {
    fn name(&self) -> &str {
        "view_cart"
    }

    fn description(&self) -> &str {
        "View current shopping cart contents"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<CartOwnerInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: CartOwnerInput = parse_input(args)?;
        let user_id = self.ctx.user(input.user_id);
        let cart = self.ctx.storage.load_cart(&user_id).await?;
        if cart.is_empty() {
            return to_payload(CartView {
                items: Vec::new(),
                total: 0.0,
                item_count: 0,
            });
        }

        let products = self.ctx.storage.load_products().await?;
        // Lines whose product left the catalog are not shown.
        let items: Vec<CartLine> = cart
            .items
            .iter()
            .filter_map(|item| {
                let product = products.iter().find(|p| p.id == item.product_id)?;
                Some(CartLine {
                    product_id: item.product_id.clone(),
                    name: product.name.clone(),
                    price: item.price,
                    quantity: item.quantity,
                    item_total: round_cents(item.line_total()),
                })
            })
            .collect();
        let total = round_cents(items.iter().map(|line| line.item_total).sum());

        to_payload(CartView {
            item_count: items.len(),
            items,
            total,
        })
    }
}

pub struct ClearCart {
    ctx: ShopContext,
}

impl ClearCart {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for ClearCart {
    fn name(&self) -> &str {
        "clear_cart"
    }

    fn description(&self) -> &str {
        "Clear all items from the shopping cart"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<CartOwnerInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: CartOwnerInput = parse_input(args)?;
        let user_id = self.ctx.user(input.user_id);
        self.ctx.storage.save_cart(&Cart::empty(user_id)).await?;
        Ok(json!({"success": true, "message": "Cart cleared"}))
    }
}

fn new_order_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("ORD{}", hex.chars().take(6).collect::<String>().to_uppercase())
}

pub struct Checkout {
    ctx: ShopContext,
}

impl Checkout {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for Checkout {
    fn name(&self) -> &str {
        "checkout"
    }

    fn description(&self) -> &str {
        "Checkout the current cart and create an order"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<CartOwnerInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: CartOwnerInput = parse_input(args)?;
        let user_id = self.ctx.user(input.user_id);
        let cart = self.ctx.storage.load_cart(&user_id).await?;
        if cart.is_empty() {
            return Err(FunctionError::business("Cart is empty"));
        }

        let mut products = self.ctx.storage.load_products().await?;
        for item in &cart.items {
            let in_stock = products
                .iter()
                .find(|p| p.id == item.product_id)
                .is_some_and(|p| p.has_stock_for(item.quantity));
            if !in_stock {
                return Err(FunctionError::business(format!(
                    "Product {} is no longer available in the requested quantity",
                    item.product_id
                )));
            }
        }

        let order = Order {
            id: new_order_id(),
            user_id: user_id.clone(),
            items: cart
                .items
                .iter()
                .map(|item| OrderItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            total: round_cents(cart.total()),
            status: OrderStatus::Pending,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        let mut orders = self.ctx.storage.load_orders().await?;
        orders.push(order.clone());
        self.ctx.storage.save_orders(&orders).await?;

        for item in &cart.items {
            if let Some(product) = products.iter_mut().find(|p| p.id == item.product_id) {
                product.stock = product.stock.saturating_sub(item.quantity);
            }
        }
        self.ctx.storage.save_products(&products).await?;
        self.ctx.storage.save_cart(&Cart::empty(user_id)).await?;

        info!(order_id = %order.id, total = order.total, "Order placed");
        Ok(json!({
            "success": true,
            "message": "Order placed successfully",
            "order_id": order.id,
            "total": order.total,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shop::TrackOrder;
    use crate::shop::fixtures::{cart_with, catalog, context, product};
    use shopbot_core::{ErrorKind, ShopStorage};
    use shopbot_storage::{InMemoryStorage, JsonFileStorage};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_add_beyond_stock_leaves_cart_untouched() {
        let storage = InMemoryStorage::new()
            .with_products(vec![product("P1", "Batting Helmet", "Safety", 59.0, 1)]);
        let add = AddToCart::new(context(&storage));

        let err = add
            .call(json!({"product_id": "P1", "quantity": 2}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessLogic);
        assert!(err.to_string().contains("insufficient stock"));
        assert_eq!(storage.write_count(), 0);
        assert!(storage.stored_cart().is_none());
    }

    #[tokio::test]
    async fn test_add_new_and_existing_item() {
        let storage = InMemoryStorage::new().with_products(catalog());
        let add = AddToCart::new(context(&storage));

        let payload = add.call(json!({"product_id": "BB001"})).await.unwrap();
        assert_eq!(payload["message"], "Added 1 x Baseball Glove to cart");
        assert_eq!(payload["quantity_in_cart"], 1);

        let payload = add
            .call(json!({"product_id": "BB001", "quantity": 2}))
            .await
            .unwrap();
        assert_eq!(payload["quantity_in_cart"], 3);
        assert_eq!(payload["cart_total"], 106.5);

        let cart = storage.stored_cart().unwrap();
        assert_eq!(cart.user_id, "user123");
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_add_checks_combined_quantity() {
        let storage = InMemoryStorage::new()
            .with_products(catalog())
            .with_cart(cart_with("user123", &[("BB001", 2, 35.5)]));
        let add = AddToCart::new(context(&storage));

        let err = add
            .call(json!({"product_id": "BB001", "quantity": 2}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("insufficient stock"));
        assert_eq!(storage.stored_cart().unwrap().items[0].quantity, 2);
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        let storage = InMemoryStorage::new().with_products(catalog());
        let add = AddToCart::new(context(&storage));

        let err = add
            .call(json!({"product_id": "BB001", "quantity": 0}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        assert_eq!(storage.access_count(), 0);
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let storage = InMemoryStorage::new().with_products(catalog());
        let add = AddToCart::new(context(&storage));

        let err = add.call(json!({"product_id": "NOPE"})).await.unwrap_err();
        assert_eq!(err.to_string(), "Product NOPE not found");
    }

    #[tokio::test]
    async fn test_remove_from_cart() {
        let storage = InMemoryStorage::new()
            .with_products(catalog())
            .with_cart(cart_with("user123", &[("BB001", 1, 35.5), ("AP001", 2, 25.0)]));
        let remove = RemoveFromCart::new(context(&storage));

        let payload = remove.call(json!({"product_id": "BB001"})).await.unwrap();
        assert_eq!(payload["message"], "Removed Baseball Glove from cart");
        assert_eq!(payload["cart_total"], 50.0);

        let err = remove.call(json!({"product_id": "BB001"})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessLogic);
    }

    /// Store whose catalog cannot be read; carts still work.
    struct CatalogOffline(InMemoryStorage);

    #[async_trait]
    impl ShopStorage for CatalogOffline {
        async fn load_products(&self) -> shopbot_core::StorageResult<Vec<Product>> {
            Err(shopbot_core::StorageError::io("products.json", "catalog offline"))
        }

        async fn save_products(&self, products: &[Product]) -> shopbot_core::StorageResult<()> {
            self.0.save_products(products).await
        }

        async fn load_orders(&self) -> shopbot_core::StorageResult<Vec<Order>> {
            self.0.load_orders().await
        }

        async fn save_orders(&self, orders: &[Order]) -> shopbot_core::StorageResult<()> {
            self.0.save_orders(orders).await
        }

        async fn load_cart(&self, user_id: &str) -> shopbot_core::StorageResult<Cart> {
            self.0.load_cart(user_id).await
        }

        async fn save_cart(&self, cart: &Cart) -> shopbot_core::StorageResult<()> {
            self.0.save_cart(cart).await
        }
    }

    #[tokio::test]
    async fn test_failed_remove_leaves_cart_untouched() {
        let storage = InMemoryStorage::new()
            .with_cart(cart_with("user123", &[("BB001", 1, 35.5)]));
        let cart_before = storage.stored_cart();
        let ctx = ShopContext::new(Arc::new(CatalogOffline(storage.clone())));

        let err = RemoveFromCart::new(ctx)
            .call(json!({"product_id": "BB001"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert_eq!(storage.stored_cart(), cart_before);
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_quantity() {
        let storage = InMemoryStorage::new()
            .with_products(catalog())
            .with_cart(cart_with("user123", &[("AP001", 1, 25.0)]));
        let update = UpdateCartQuantity::new(context(&storage));

        let payload = update
            .call(json!({"product_id": "AP001", "quantity": 4}))
            .await
            .unwrap();
        assert_eq!(payload["message"], "Updated Training Jersey quantity to 4");
        assert_eq!(storage.stored_cart().unwrap().items[0].quantity, 4);

        let err = update
            .call(json!({"product_id": "AP001", "quantity": 41}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("insufficient stock"));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes() {
        let storage = InMemoryStorage::new()
            .with_products(catalog())
            .with_cart(cart_with("user123", &[("AP001", 1, 25.0)]));
        let update = UpdateCartQuantity::new(context(&storage));

        update
            .call(json!({"product_id": "AP001", "quantity": 0}))
            .await
            .unwrap();
        assert!(storage.stored_cart().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_item_not_in_cart() {
        let storage = InMemoryStorage::new().with_products(catalog());
        let update = UpdateCartQuantity::new(context(&storage));

        let err = update
            .call(json!({"product_id": "AP001", "quantity": 2}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Product AP001 is not in the cart");
    }

    #[tokio::test]
    async fn test_view_cart() {
        let storage = InMemoryStorage::new()
            .with_products(catalog())
            .with_cart(cart_with(
                "user123",
                &[("FB001", 3, 49.99), ("AP001", 1, 25.0), ("GONE01", 1, 5.0)],
            ));
        let view = ViewCart::new(context(&storage));

        let payload = view.call(json!({})).await.unwrap();
        assert_eq!(payload["item_count"], 2);
        assert_eq!(payload["items"][0]["name"], "Football Cleats");
        assert_eq!(payload["items"][0]["item_total"], 149.97);
        assert_eq!(payload["total"], 174.97);
    }

    #[tokio::test]
    async fn test_view_other_users_cart_is_empty() {
        let storage = InMemoryStorage::new()
            .with_products(catalog())
            .with_cart(cart_with("alice", &[("FB001", 1, 49.99)]));
        let view = ViewCart::new(context(&storage));

        let payload = view.call(json!({"user_id": "bob"})).await.unwrap();
        assert_eq!(payload, json!({"items": [], "total": 0.0, "item_count": 0}));
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let storage = InMemoryStorage::new().with_cart(cart_with("user123", &[("FB001", 1, 49.99)]));
        let clear = ClearCart::new(context(&storage));

        clear.call(json!({})).await.unwrap();
        assert!(storage.stored_cart().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_places_order() {
        let storage = InMemoryStorage::new()
            .with_products(catalog())
            .with_cart(cart_with("user123", &[("FB001", 2, 49.99), ("BB001", 3, 35.5)]));
        let checkout = Checkout::new(context(&storage));

        let payload = checkout.call(json!({})).await.unwrap();
        let order_id = payload["order_id"].as_str().unwrap();
        assert!(order_id.starts_with("ORD"));
        assert_eq!(order_id.len(), 9);
        assert!(order_id[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(payload["total"], 206.48);

        let orders = storage.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order_id);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(orders[0].items.len(), 2);

        let products = storage.products();
        assert_eq!(products[0].stock, 8);
        assert_eq!(products[1].stock, 0);
        assert!(storage.stored_cart().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let storage = InMemoryStorage::new().with_products(catalog());
        let checkout = Checkout::new(context(&storage));

        let err = checkout.call(json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Cart is empty");
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_checkout_rechecks_stock() {
        let storage = InMemoryStorage::new()
            .with_products(catalog())
            .with_cart(cart_with("user123", &[("TN001", 1, 120.0)]));
        let checkout = Checkout::new(context(&storage));

        let err = checkout.call(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("TN001"));
        assert!(storage.orders().is_empty());
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_checkout_keeps_unrecognised_order_status_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let files = JsonFileStorage::new(temp_dir.path());
        files.save_products(&catalog()).await.unwrap();
        files
            .save_cart(&cart_with("user123", &[("FB001", 1, 49.99)]))
            .await
            .unwrap();
        std::fs::write(
            temp_dir.path().join("orders.json"),
            r#"[{"id": "ORD009", "user_id": "bob", "items": [], "total": 12.0,
                "status": "returned", "created_at": "2024-03-01T08:00:00"}]"#,
        )
        .unwrap();
        let ctx = ShopContext::new(Arc::new(JsonFileStorage::new(temp_dir.path())));

        let tracked = TrackOrder::new(ctx.clone())
            .call(json!({"order_id": "ORD009"}))
            .await
            .unwrap();
        assert_eq!(tracked["status"], "returned");
        assert_eq!(tracked["estimated_delivery"], "Status unknown");

        Checkout::new(ctx).call(json!({})).await.unwrap();

        let orders = files.load_orders().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].status, OrderStatus::Other("returned".into()));
        let raw = std::fs::read_to_string(temp_dir.path().join("orders.json")).unwrap();
        assert!(raw.contains("\"status\": \"returned\""));
        assert!(!raw.contains("unknown"));
    }
}
