use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use shopbot_core::{Cart, Order, Product, ShopStorage, StorageError, StorageResult};

#[derive(Default)]
struct Records {
    products: Vec<Product>,
    orders: Vec<Order>,
    cart: Option<Cart>,
}

/// Process-local store that counts every load and save.
///
/// Clones share state, so a test can keep a handle while the registry owns
/// another one.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    records: Arc<RwLock<Records>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.records.write().products = products;
        self
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.records.write().orders = orders;
        self
    }

    pub fn with_cart(self, cart: Cart) -> Self {
        self.records.write().cart = Some(cart);
        self
    }

    /// Make every subsequent call fail with an I/O error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn products(&self) -> Vec<Product> {
        self.records.read().products.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.records.read().orders.clone()
    }

    pub fn stored_cart(&self) -> Option<Cart> {
        self.records.read().cart.clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn access_count(&self) -> usize {
        self.read_count() + self.write_count()
    }

    fn begin_read(&self) -> StorageResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()
    }

    fn begin_write(&self) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::io("memory", "store marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ShopStorage for InMemoryStorage {
    async fn load_products(&self) -> StorageResult<Vec<Product>> {
        self.begin_read()?;
        Ok(self.records.read().products.clone())
    }

    async fn save_products(&self, products: &[Product]) -> StorageResult<()> {
        self.begin_write()?;
        self.records.write().products = products.to_vec();
        Ok(())
    }

    async fn load_orders(&self) -> StorageResult<Vec<Order>> {
        self.begin_read()?;
        Ok(self.records.read().orders.clone())
    }

    async fn save_orders(&self, orders: &[Order]) -> StorageResult<()> {
        self.begin_write()?;
        self.records.write().orders = orders.to_vec();
        Ok(())
    }

    async fn load_cart(&self, user_id: &str) -> StorageResult<Cart> {
        self.begin_read()?;
        Ok(self
            .records
            .read()
            .cart
            .clone()
            .filter(|cart| cart.user_id == user_id)
            .unwrap_or_else(|| Cart::empty(user_id)))
    }

    async fn save_cart(&self, cart: &Cart) -> StorageResult<()> {
        self.begin_write()?;
        self.records.write().cart = Some(cart.clone());
        Ok(())
    }
}
