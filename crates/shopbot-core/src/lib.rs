//! Core types and traits for the shopbot assistant

pub mod error;
pub mod function;
pub mod message;
pub mod records;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, FunctionError, Result, ShopError, StorageError};
pub use function::{
    CallOutcome, FunctionCallRequest, FunctionCallResult, FunctionSpec, ParamType,
    ParameterSchema, ParameterSpec,
};
pub use message::{ChatMessage, Role};
pub use records::{Cart, CartItem, Order, OrderItem, OrderStatus, Product};
pub use traits::function::BusinessFunction;
pub use traits::llm::{LLMError, LLMProvider};
pub use traits::storage::{ShopStorage, StorageResult};
pub use types::{FinishReason, LLMConfig, LLMResponse, TokenUsage};
