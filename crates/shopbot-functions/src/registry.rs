use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use shopbot_core::{BusinessFunction, FunctionCallRequest, FunctionCallResult, FunctionError, FunctionSpec};

use crate::RegistryError;
use crate::validate::validate_arguments;

/// Named business functions with their advertised specs.
///
/// Specs are computed once on registration and kept in registration order.
pub struct FunctionRegistry {
    functions: Vec<Arc<dyn BusinessFunction>>,
    specs: Vec<FunctionSpec>,
    index: HashMap<String, usize>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
            specs: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn register(&mut self, function: Arc<dyn BusinessFunction>) -> Result<(), RegistryError> {
        let name = function.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        self.index.insert(name, self.functions.len());
        self.specs.push(function.spec());
        self.functions.push(function);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn BusinessFunction>, FunctionError> {
        self.index
            .get(name)
            .map(|&idx| Arc::clone(&self.functions[idx]))
            .ok_or_else(|| FunctionError::UnknownFunction(name.to_string()))
    }

    pub fn spec(&self, name: &str) -> Option<&FunctionSpec> {
        self.index.get(name).map(|&idx| &self.specs[idx])
    }

    pub fn schemas(&self) -> &[FunctionSpec] {
        &self.specs
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|spec| spec.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Resolve, validate and invoke. Every failure is folded into the result.
    #[instrument(skip(self, request), fields(function = %request.name))]
    pub async fn dispatch(&self, request: &FunctionCallRequest) -> FunctionCallResult {
        let arguments = match &request.arguments {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };

        let Some(&idx) = self.index.get(&request.name) else {
            let e = FunctionError::UnknownFunction(request.name.clone());
            warn!(error = %e, "Model requested an unregistered function");
            return FunctionCallResult::failure(&request.name, arguments, &e);
        };
        let function = &self.functions[idx];

        let validated = match validate_arguments(&self.specs[idx].parameters, &arguments) {
            Ok(validated) => validated,
            Err(e) => {
                warn!(error = %e, "Rejected function arguments");
                return FunctionCallResult::failure(&request.name, arguments, &e);
            }
        };

        info!(args = %validated, "Executing function");
        match function.call(validated).await {
            Ok(payload) => {
                info!("Function completed");
                FunctionCallResult::success(&request.name, arguments, payload)
            }
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "Function failed");
                FunctionCallResult::failure(&request.name, arguments, &e)
            }
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use shopbot_core::{ErrorKind, ParamType, ParameterSchema};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoFunction {
        name: String,
        calls: AtomicUsize,
    }

    impl EchoFunction {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BusinessFunction for EchoFunction {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "Echoes its arguments"
        }

        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::new()
                .required("order_id", ParamType::String, "Order ID")
                .optional("limit", ParamType::Integer, "Limit")
        }

        async fn call(&self, args: Value) -> Result<Value, FunctionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if args["order_id"] == "missing" {
                return Err(FunctionError::business("Order missing not found"));
            }
            Ok(args)
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = FunctionRegistry::new();
        registry.register(Arc::new(EchoFunction::new("track_order"))).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("track_order"));

        let first = registry.resolve("track_order").unwrap();
        let second = registry.resolve("track_order").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = FunctionRegistry::new();
        registry.register(Arc::new(EchoFunction::new("view_cart"))).unwrap();
        let err = registry
            .register(Arc::new(EchoFunction::new("view_cart")))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(name) if name == "view_cart"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_schemas_in_registration_order() {
        let mut registry = FunctionRegistry::new();
        for name in ["b_second", "a_first", "c_third"] {
            registry.register(Arc::new(EchoFunction::new(name))).unwrap();
        }
        assert_eq!(registry.names(), vec!["b_second", "a_first", "c_third"]);
        assert_eq!(registry.schemas()[1].name, "a_first");
        assert!(registry.schemas()[0].parameters.get("order_id").unwrap().required);
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = FunctionRegistry::new();
        let err = registry.resolve("delete_everything").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnknownFunction);
    }

    #[tokio::test]
    async fn test_dispatch_success_coerces_arguments() {
        let mut registry = FunctionRegistry::new();
        registry.register(Arc::new(EchoFunction::new("track_order"))).unwrap();

        let request = FunctionCallRequest::new("track_order", json!({"order_id": "ORD001", "limit": "3"}));
        let result = registry.dispatch(&request).await;
        assert!(result.ok());
        assert_eq!(result.function(), "track_order");
        assert_eq!(result.payload().unwrap()["limit"], 3);
        assert_eq!(result.arguments()["limit"], "3");
    }

    #[tokio::test]
    async fn test_dispatch_missing_parameter_never_invokes() {
        let function = Arc::new(EchoFunction::new("track_order"));
        let mut registry = FunctionRegistry::new();
        registry.register(function.clone()).unwrap();

        let result = registry
            .dispatch(&FunctionCallRequest::new("track_order", json!({})))
            .await;
        assert!(!result.ok());
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidArguments));
        assert!(result.error_message().unwrap().contains("order_id"));
        assert_eq!(function.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_function() {
        let registry = FunctionRegistry::new();
        let result = registry
            .dispatch(&FunctionCallRequest::new("delete_everything", Value::Null))
            .await;
        assert!(!result.ok());
        assert_eq!(result.error_kind(), Some(ErrorKind::UnknownFunction));
        assert_eq!(result.arguments(), &json!({}));
    }

    #[tokio::test]
    async fn test_dispatch_business_failure() {
        let mut registry = FunctionRegistry::new();
        registry.register(Arc::new(EchoFunction::new("track_order"))).unwrap();

        let result = registry
            .dispatch(&FunctionCallRequest::new("track_order", json!({"order_id": "missing"})))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::BusinessLogic));
        assert_eq!(result.error_message(), Some("Order missing not found"));
    }
}
