//! Business function trait

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FunctionError;
use crate::function::{FunctionSpec, ParameterSchema};

/// A callable advertised to the model.
///
/// `call` receives arguments that already passed schema validation: every
/// required parameter is present and coerced to its declared type.
#[async_trait]
pub trait BusinessFunction: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> ParameterSchema;

    async fn call(&self, args: Value) -> Result<Value, FunctionError>;

    fn spec(&self) -> FunctionSpec {
        FunctionSpec::new(self.name(), self.description(), self.parameters())
    }
}
