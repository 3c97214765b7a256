use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use shopbot_core::{Cart, Order, Product, ShopStorage, StorageError, StorageResult};

const PRODUCTS_FILE: &str = "products.json";
const ORDERS_FILE: &str = "orders.json";
const CART_FILE: &str = "cart.json";

/// Data directory holding `products.json`, `orders.json` and `cart.json`.
///
/// A missing file reads as an empty record set.
pub struct JsonFileStorage {
    base_path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn read_json<T: DeserializeOwned>(&self, file: &str) -> StorageResult<Option<T>> {
        let path = self.base_path.join(file);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Record file missing, treating as empty");
                return Ok(None);
            }
            Err(e) => return Err(StorageError::io(path.display().to_string(), e)),
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::malformed(path.display().to_string(), e))
    }

    async fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> StorageResult<()> {
        let path = self.base_path.join(file);
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StorageError::io(self.base_path.display().to_string(), e))?;
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| StorageError::malformed(path.display().to_string(), e))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| StorageError::io(path.display().to_string(), e))?;
        debug!(path = %path.display(), "Record file written");
        Ok(())
    }
}

#[async_trait]
impl ShopStorage for JsonFileStorage {
    async fn load_products(&self) -> StorageResult<Vec<Product>> {
        Ok(self.read_json(PRODUCTS_FILE).await?.unwrap_or_default())
    }

    async fn save_products(&self, products: &[Product]) -> StorageResult<()> {
        self.write_json(PRODUCTS_FILE, products).await
    }

    async fn load_orders(&self) -> StorageResult<Vec<Order>> {
        Ok(self.read_json(ORDERS_FILE).await?.unwrap_or_default())
    }

    async fn save_orders(&self, orders: &[Order]) -> StorageResult<()> {
        self.write_json(ORDERS_FILE, orders).await
    }

    async fn load_cart(&self, user_id: &str) -> StorageResult<Cart> {
        let stored: Option<Cart> = self.read_json(CART_FILE).await?;
        Ok(stored
            .filter(|cart| cart.user_id == user_id)
            .unwrap_or_else(|| Cart::empty(user_id)))
    }

    async fn save_cart(&self, cart: &Cart) -> StorageResult<()> {
        self.write_json(CART_FILE, cart).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopbot_core::{CartItem, OrderItem, OrderStatus};
    use tempfile::TempDir;

    fn product(id: &str, stock: u32) -> Product {
        Product {
            id: id.into(),
            name: format!("Product {}", id),
            category: "Football".into(),
            price: 10.0,
            description: String::new(),
            stock,
            brand: "WR".into(),
        }
    }

    #[tokio::test]
    async fn test_missing_files_read_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path());

        assert!(storage.load_products().await.unwrap().is_empty());
        assert!(storage.load_orders().await.unwrap().is_empty());

        let cart = storage.load_cart("user123").await.unwrap();
        assert_eq!(cart.user_id, "user123");
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_products_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path());

        storage
            .save_products(&[product("P1", 3), product("P2", 0)])
            .await
            .unwrap();
        let loaded = storage.load_products().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "P1");
        assert_eq!(loaded[1].stock, 0);
    }

    #[tokio::test]
    async fn test_orders_written_pretty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path());

        let order = Order {
            id: "ORD001".into(),
            user_id: "user123".into(),
            items: vec![OrderItem {
                product_id: "P1".into(),
                quantity: 1,
                price: 10.0,
            }],
            total: 10.0,
            status: OrderStatus::Shipped,
            created_at: "2024-01-15T10:30:00".into(),
        };
        storage.save_orders(&[order]).await.unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join("orders.json")).unwrap();
        assert!(raw.contains("\n  {"));
        assert!(raw.contains("\"shipped\""));
    }

    #[tokio::test]
    async fn test_cart_of_other_user_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path());

        let mut cart = Cart::empty("alice");
        cart.items.push(CartItem {
            product_id: "P1".into(),
            quantity: 2,
            price: 10.0,
        });
        storage.save_cart(&cart).await.unwrap();

        assert_eq!(storage.load_cart("alice").await.unwrap().items.len(), 1);
        assert!(storage.load_cart("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("products.json"), "{ not json").unwrap();
        let storage = JsonFileStorage::new(temp_dir.path());

        let err = storage.load_products().await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let storage = JsonFileStorage::new(&nested);

        storage.save_cart(&Cart::empty("user123")).await.unwrap();
        assert!(nested.join("cart.json").exists());
    }
}
