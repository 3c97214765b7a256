//! The store's business functions, grouped by domain

mod cart;
mod order;
mod product;
mod support;

pub use cart::{AddToCart, Checkout, ClearCart, RemoveFromCart, UpdateCartQuantity, ViewCart};
pub use order::{GetOrderHistory, GetUserOrders, TrackOrder};
pub use product::{CheckProductAvailability, GetProductById, SearchProducts, SearchCriteria};
pub use support::{GetHelp, GetSizeGuide, GetStoreInfo, ReportIssue};

use std::sync::Arc;

use shopbot_core::BusinessFunction;

use crate::ShopContext;

/// Every store function, in the order advertised to the model.
pub fn all_shop_functions(ctx: &ShopContext) -> Vec<Arc<dyn BusinessFunction>> {
    vec![
        Arc::new(SearchProducts::new(ctx.clone())),
        Arc::new(GetProductById::new(ctx.clone())),
        Arc::new(CheckProductAvailability::new(ctx.clone())),
        Arc::new(TrackOrder::new(ctx.clone())),
        Arc::new(GetUserOrders::new(ctx.clone())),
        Arc::new(GetOrderHistory::new(ctx.clone())),
        Arc::new(AddToCart::new(ctx.clone())),
        Arc::new(RemoveFromCart::new(ctx.clone())),
        Arc::new(UpdateCartQuantity::new(ctx.clone())),
        Arc::new(ViewCart::new(ctx.clone())),
        Arc::new(ClearCart::new(ctx.clone())),
        Arc::new(Checkout::new(ctx.clone())),
        Arc::new(GetHelp::new()),
        Arc::new(GetStoreInfo::new(ctx.store.clone())),
        Arc::new(ReportIssue::new()),
        Arc::new(GetSizeGuide::new()),
    ]
}

/// Round a money amount to cents.
pub(crate) fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use shopbot_core::{Cart, CartItem, Order, OrderItem, OrderStatus, Product};
    use shopbot_storage::InMemoryStorage;

    use crate::ShopContext;

    pub fn product(id: &str, name: &str, category: &str, price: f64, stock: u32) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price,
            description: format!("{} for serious athletes", name),
            stock,
            brand: "WRTeam".into(),
        }
    }

    pub fn catalog() -> Vec<Product> {
        vec![
            product("FB001", "Football Cleats", "Footwear", 49.99, 10),
            product("BB001", "Baseball Glove", "Baseball", 35.5, 3),
            product("TN001", "Tennis Racket", "Tennis", 120.0, 0),
            product("AP001", "Training Jersey", "Apparel", 25.0, 40),
        ]
    }

    pub fn order(id: &str, user: &str, status: OrderStatus, created_at: &str) -> Order {
        Order {
            id: id.into(),
            user_id: user.into(),
            items: vec![OrderItem {
                product_id: "FB001".into(),
                quantity: 1,
                price: 49.99,
            }],
            total: 49.99,
            status,
            created_at: created_at.into(),
        }
    }

    pub fn cart_with(user: &str, items: &[(&str, u32, f64)]) -> Cart {
        Cart {
            user_id: user.into(),
            items: items
                .iter()
                .map(|&(product_id, quantity, price)| CartItem {
                    product_id: product_id.into(),
                    quantity,
                    price,
                })
                .collect(),
        }
    }

    pub fn context(storage: &InMemoryStorage) -> ShopContext {
        ShopContext::new(Arc::new(storage.clone()))
    }
}
