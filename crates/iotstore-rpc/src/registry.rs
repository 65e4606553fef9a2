//! Method registry and async dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, warn};

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::types::{RpcRequest, RpcResponse};

/// Trait implemented by every RPC method handler.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Execute the handler with the given params and context.
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError>;
}

/// Registry mapping method names to handlers.
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
    timeout: Duration,
}

impl MethodRegistry {
    /// Maximum time a single RPC handler is allowed to run.
    pub const HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

    /// Requests slower than this are logged.
    pub const SLOW_REQUEST: Duration = Duration::from_secs(5);

    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            timeout: Self::HANDLER_TIMEOUT,
        }
    }

    /// Override the per-handler timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a handler for a method name.
    pub fn register(&mut self, method: &str, handler: impl MethodHandler + 'static) {
        let _ = self.handlers.insert(method.to_owned(), Arc::new(handler));
    }

    /// Run `method`, recording its duration and outcome.
    pub async fn call(&self, method: &str, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let start = Instant::now();

        let result = match self.handlers.get(method) {
            None => Err(RpcError::MethodNotFound {
                method: method.to_owned(),
            }),
            Some(handler) => match tokio::time::timeout(self.timeout, handler.handle(params, ctx)).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    error!(method, timeout = ?self.timeout, "RPC handler timed out");
                    Err(RpcError::Timeout {
                        method: method.to_owned(),
                    })
                }
            },
        };

        let duration = start.elapsed();
        ctx.metrics
            .observe_rpc(method, result.as_ref().err().map(RpcError::code), duration);

        if duration >= Self::SLOW_REQUEST {
            warn!(
                method,
                duration_secs = duration.as_secs_f64(),
                "slow RPC request"
            );
        }

        result
    }

    /// Dispatch an envelope request, folding errors into the response.
    pub async fn dispatch(&self, request: RpcRequest, ctx: &RpcContext) -> RpcResponse {
        match self.call(&request.method, request.params, ctx).await {
            Ok(result) => RpcResponse::success(request.id, result),
            Err(err) => RpcResponse::failure(request.id, err.to_error_body()),
        }
    }

    /// List all registered method names (sorted).
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check whether a method is registered.
    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}
