//! Tool registry - name lookup, argument binding and invocation
//!
//! The registry is built once at start-up and only read afterwards, so a
//! single instance can be shared across concurrently handled turns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;

use super::args::{BoundArgs, bind};
use super::definition::ToolDescriptor;
use super::error::{AdapterError, ToolError};

/// Default per-invocation timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A completed tool call: the arguments it ran with and its output
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub args: BoundArgs,
    pub result: Value,
}

/// Executes one tool against already-bound arguments
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: &BoundArgs) -> Result<Value, AdapterError>;
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Catalog of tools keyed by unique name
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
    default_timeout: Duration,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the timeout used by tools without their own
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Add a tool; a tool with the same name is replaced
    pub fn add_tool(&mut self, descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) {
        let name = descriptor.name.clone();
        if self.tools.contains_key(&name) {
            warn!("Replacing tool '{}' in registry", name);
        } else {
            self.order.push(name.clone());
        }
        self.tools.insert(name, RegisteredTool { descriptor, handler });
    }

    /// Builder form of `add_tool`
    pub fn with_tool(mut self, descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) -> Self {
        self.add_tool(descriptor, handler);
        self
    }

    /// Get a tool's descriptor by name
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|t| &t.descriptor)
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.descriptor(name))
            .collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up, bind and run one tool.
    ///
    /// Unknown names and unbindable arguments never reach a handler.
    pub async fn invoke(&self, name: &str, args: &Value) -> Result<Invocation, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let bound = bind(&tool.descriptor, args)
            .map_err(|e| ToolError::invalid_arguments(name, args, e.to_string()))?;

        let timeout = tool.descriptor.timeout.unwrap_or(self.default_timeout);
        debug!("Invoking {} with {} (timeout {:?})", name, bound.to_value(), timeout);

        let outcome = tokio::time::timeout(timeout, tool.handler.call(&bound)).await;
        let result = match outcome {
            Ok(Ok(result)) => Ok(Invocation { args: bound, result }),
            Ok(Err(AdapterError::InvalidInput(detail))) => Err(ToolError::invalid_arguments(name, args, detail)),
            Ok(Err(e)) => Err(ToolError::execution_failed(name, e.to_string())),
            Err(_) => Err(ToolError::execution_failed(
                name,
                format!("timed out after {}ms", timeout.as_millis()),
            )),
        };

        match &result {
            Ok(_) => info!("Tool {} succeeded", name),
            Err(e) => warn!("Tool {} failed: {}", name, e),
        }
        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::definition::{ParamKind, ParamSpec};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes bound arguments back and counts calls
    struct EchoHandler {
        calls: AtomicUsize,
    }

    impl EchoHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, args: &BoundArgs) -> Result<Value, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(args.to_value())
        }
    }

    struct FailingHandler(fn() -> AdapterError);

    #[async_trait]
    impl ToolHandler for FailingHandler {
        async fn call(&self, _args: &BoundArgs) -> Result<Value, AdapterError> {
            Err((self.0)())
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl ToolHandler for SlowHandler {
        async fn call(&self, _args: &BoundArgs) -> Result<Value, AdapterError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(json!({}))
        }
    }

    fn geocode() -> ToolDescriptor {
        ToolDescriptor::new("osm_geocode", "Forward geocode")
            .param(ParamSpec::required("query", ParamKind::String, "place"))
            .param(ParamSpec::optional("limit", ParamKind::Integer, 5, "max results").with_clamp(1.0, 10.0))
    }

    #[tokio::test]
    async fn test_invoke_success_returns_payload_unmodified() {
        let handler = EchoHandler::new();
        let registry = ToolRegistry::new().with_tool(geocode(), handler.clone());

        let invocation = registry
            .invoke("osm_geocode", &json!({"query": "Eiffel Tower", "limit": 3}))
            .await
            .unwrap();

        assert_eq!(invocation.result, json!({"query": "Eiffel Tower", "limit": 3}));
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn test_invoke_returns_bound_arguments() {
        let registry = ToolRegistry::new().with_tool(geocode(), EchoHandler::new());

        let invocation = registry
            .invoke("osm_geocode", &json!({"query": "Berlin", "limit": "40"}))
            .await
            .unwrap();

        assert_eq!(invocation.args.to_value(), json!({"query": "Berlin", "limit": 10}));
        assert_eq!(invocation.result, invocation.args.to_value());
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let handler = EchoHandler::new();
        let registry = ToolRegistry::new().with_tool(geocode(), handler.clone());

        let err = registry.invoke("osm_teleport", &json!({})).await.unwrap_err();

        assert_eq!(err, ToolError::UnknownTool("osm_teleport".to_string()));
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn test_invoke_missing_required_never_calls_handler() {
        let handler = EchoHandler::new();
        let registry = ToolRegistry::new().with_tool(geocode(), handler.clone());

        let err = registry.invoke("osm_geocode", &json!({"limit": 2})).await.unwrap_err();

        match err {
            ToolError::InvalidArguments { tool, args, detail } => {
                assert_eq!(tool, "osm_geocode");
                assert_eq!(args, json!({"limit": 2}));
                assert_eq!(detail, "missing required argument 'query'");
            }
            other => panic!("Expected InvalidArguments, got {:?}", other),
        }
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn test_adapter_invalid_input_maps_to_invalid_arguments() {
        let registry = ToolRegistry::new().with_tool(
            geocode(),
            Arc::new(FailingHandler(|| AdapterError::InvalidInput("query is blank".to_string()))),
        );

        let err = registry.invoke("osm_geocode", &json!({"query": " "})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref detail, .. } if detail == "query is blank"));
    }

    #[tokio::test]
    async fn test_adapter_failure_maps_to_execution_failed() {
        let registry = ToolRegistry::new().with_tool(
            geocode(),
            Arc::new(FailingHandler(|| AdapterError::EmptyResult("no matches".to_string()))),
        );

        let err = registry.invoke("osm_geocode", &json!({"query": "Atlantis"})).await.unwrap_err();
        assert_eq!(
            err,
            ToolError::ExecutionFailed {
                tool: "osm_geocode".to_string(),
                detail: "no usable result: no matches".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_invoke_timeout_is_execution_failure() {
        let registry = ToolRegistry::new().with_tool(
            geocode().with_timeout(Duration::from_millis(20)),
            Arc::new(SlowHandler),
        );

        let err = registry.invoke("osm_geocode", &json!({"query": "Berlin"})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { ref detail, .. } if detail.contains("timed out")));
    }

    #[test]
    fn test_registration_order_and_replacement() {
        let mut registry = ToolRegistry::new();
        registry.add_tool(geocode(), EchoHandler::new());
        registry.add_tool(ToolDescriptor::new("osrm_nearest_road", "Snap"), EchoHandler::new());
        registry.add_tool(geocode(), EchoHandler::new());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["osm_geocode", "osrm_nearest_road"]);
        assert!(registry.contains("osrm_nearest_road"));
        assert_eq!(registry.descriptors()[1].name, "osrm_nearest_road");
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.descriptor("osm_geocode").is_none());
    }
}
