use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shopbot_core::{BusinessFunction, FunctionError, Order, OrderItem, OrderStatus, ParameterSchema};

use crate::{ShopContext, parameters_for, parse_input, to_payload};

const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Deserialize, JsonSchema)]
struct TrackOrderInput {
    /// The unique order ID to track (e.g., ORD001, ORD002)
    order_id: String,
}

#[derive(Debug, Serialize)]
struct OrderTracking {
    order_id: String,
    status: OrderStatus,
    created_at: String,
    total: f64,
    items: Vec<OrderItem>,
    estimated_delivery: &'static str,
}

impl From<Order> for OrderTracking {
    fn from(order: Order) -> Self {
        Self {
            estimated_delivery: order.status.estimated_delivery(),
            order_id: order.id,
            status: order.status,
            created_at: order.created_at,
            total: order.total,
            items: order.items,
        }
    }
}

async fn orders_of(ctx: &ShopContext, user_id: &str) -> Result<Vec<Order>, FunctionError> {
    Ok(ctx
        .storage
        .load_orders()
        .await?
        .into_iter()
        .filter(|order| order.user_id == user_id)
        .collect())
}

pub struct TrackOrder {
    ctx: ShopContext,
}

impl TrackOrder {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for TrackOrder {
    fn name(&self) -> &str {
        "track_order"
    }

    fn description(&self) -> &str {
        "Track the status of a specific order using order ID"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<TrackOrderInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: TrackOrderInput = parse_input(args)?;
        let order = self
            .ctx
            .storage
            .load_orders()
            .await?
            .into_iter()
            .find(|order| order.id == input.order_id)
            .ok_or_else(|| FunctionError::business(format!("Order {} not found", input.order_id)))?;
        to_payload(OrderTracking::from(order))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UserOrdersInput {
    /// User ID (defaults to current user if not provided)
    user_id: Option<String>,
}

pub struct GetUserOrders {
    ctx: ShopContext,
}

impl GetUserOrders {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for GetUserOrders {
    fn name(&self) -> &str {
        "get_user_orders"
    }

    fn description(&self) -> &str {
        "Get all orders for a specific user"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<UserOrdersInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: UserOrdersInput = parse_input(args)?;
        let user_id = self.ctx.user(input.user_id);
        to_payload(orders_of(&self.ctx, &user_id).await?)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct OrderHistoryInput {
    /// User ID (defaults to current user if not provided)
    user_id: Option<String>,
    /// Maximum number of orders to return (default: 10)
    limit: Option<u32>,
}

pub struct GetOrderHistory {
    ctx: ShopContext,
}

impl GetOrderHistory {
    pub fn new(ctx: ShopContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BusinessFunction for GetOrderHistory {
    fn name(&self) -> &str {
        "get_order_history"
    }

    fn description(&self) -> &str {
        "Get recent order history for a user"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<OrderHistoryInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: OrderHistoryInput = parse_input(args)?;
        let user_id = self.ctx.user(input.user_id);
        let limit = input
            .limit
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        let mut orders = orders_of(&self.ctx, &user_id).await?;
        // Stable sort keeps store order among equal timestamps.
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit);
        to_payload(orders)
    }
}
