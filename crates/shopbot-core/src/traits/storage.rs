//! Record store trait

use async_trait::async_trait;

use crate::error::StorageError;
use crate::records::{Cart, Order, Product};

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Wholesale load/save of each record set.
///
/// Every call reads or rewrites the full set; there is no partial update and
/// no locking between calls. Built-in backends: `JsonFileStorage` and
/// `InMemoryStorage`.
#[async_trait]
pub trait ShopStorage: Send + Sync {
    async fn load_products(&self) -> StorageResult<Vec<Product>>;
    async fn save_products(&self, products: &[Product]) -> StorageResult<()>;

    async fn load_orders(&self) -> StorageResult<Vec<Order>>;
    async fn save_orders(&self, orders: &[Order]) -> StorageResult<()>;

    /// Load the cart of `user_id`. A missing cart, or one stored for another
    /// user, comes back empty.
    async fn load_cart(&self, user_id: &str) -> StorageResult<Cart>;
    async fn save_cart(&self, cart: &Cart) -> StorageResult<()>;
}
