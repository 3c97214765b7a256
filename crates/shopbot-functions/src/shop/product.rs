use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shopbot_core::{BusinessFunction, FunctionError, ParameterSchema, Product};

use crate::{ShopContext, parameters_for, parse_input, to_payload};

/// Filters applied by `search_products`. Empty strings match everything.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SearchCriteria {
    /// Search term for product name or description
    pub query: Option<String>,
    /// Product category (e.g., Football, Baseball, Tennis, Apparel, Safety, Footwear)
    pub category: Option<String>,
    /// Maximum price filter
    pub max_price: Option<f64>,
    /// Minimum price filter
    pub min_price: Option<f64>,
}

impl SearchCriteria {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(query) = non_blank(&self.query) {
            let query = query.to_lowercase();
            if !product.name.to_lowercase().contains(&query)
                && !product.description.to_lowercase().contains(&query)
            {
                return false;
            }
        }

        if let Some(category) = non_blank(&self.category) {
            if !category.eq_ignore_ascii_case(&product.category) {
                return false;
            }
        }

        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Load the catalog and find one product.
pub(crate) async fn find_product(ctx: &ShopContext, product_id: &str) -> Result<Product, FunctionError> {
    ctx.storage
        .load_products()
        .await?
        .into_iter()
        .find(|p| p.id == product_id)
        .ok_or_else(|| FunctionError::business(format!("Product {} not found", product_id)))
}

pub struct SearchProducts {
    ctx: ShopContext,
}

impl SearchProducts {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for SearchProducts {
    fn name(&self) -> &str {
        "search_products"
    }

    fn description(&self) -> &str {
        "Search for sports products based on various criteria like name, category, and price range"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<SearchCriteria>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let criteria: SearchCriteria = parse_input(args)?;
        let matches: Vec<Product> = self
            .ctx
            .storage
            .load_products()
            .await?
            .into_iter()
            .filter(|p| criteria.matches(p))
            .collect();
        to_payload(matches)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ProductIdInput {
    /// The unique product ID
    product_id: String,
}

pub struct GetProductById {
    ctx: ShopContext,
}

impl GetProductById {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for GetProductById {
    fn name(&self) -> &str {
        "get_product_by_id"
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific product using its ID"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<ProductIdInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: ProductIdInput = parse_input(args)?;
        let product = find_product(&self.ctx, &input.product_id).await?;
        to_payload(product)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AvailabilityInput {
    /// The unique product ID to check
    product_id: String,
    /// Quantity needed (default: 1)
    quantity: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Availability {
    product_id: String,
    available: bool,
    stock: u32,
    requested: u32,
    message: &'static str,
}

pub struct CheckProductAvailability {
    ctx: ShopContext,
}

impl CheckProductAvailability {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for CheckProductAvailability {
    fn name(&self) -> &str {
        "check_product_availability"
    }

    fn description(&self) -> &str {
        "Check if a product is available in stock for the requested quantity"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<AvailabilityInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: AvailabilityInput = parse_input(args)?;
        let requested = input.quantity.unwrap_or(1);
        let product = find_product(&self.ctx, &input.product_id).await?;

        let available = product.has_stock_for(requested);
        let availability = Availability {
            product_id: product.id,
            available,
            stock: product.stock,
            requested,
            message: if available { "Available" } else { "Not enough stock" },
        };
        to_payload(availability)
    }
}
