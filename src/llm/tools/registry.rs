//! Function registry for tool execution

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::executor::ToolExecutor;
use crate::llm::core::types::ToolDeclaration;

/// Type alias for boxed async functions
type AsyncToolFn = Box<
    dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<String, String>> + Send + Sync,
>;

/// Registry for managing tool functions
///
/// Each tool is registered together with the declaration shown to the model,
/// so the registry is the single source for both what the model may call and
/// how the call is executed. Arguments are deserialized from JSON and results
/// serialized back to JSON.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, AsyncToolFn>,
    declarations: Vec<ToolDeclaration>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async function under `declaration.name`
    pub fn register_async<F, Args, R, Fut>(&mut self, declaration: ToolDeclaration, func: F)
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let args = match serde_json::from_value::<Args>(args_json) {
                Ok(args) => args,
                Err(e) => {
                    let err_msg = format!("Failed to deserialize arguments: {}", e);
                    return Box::pin(async move { Err(err_msg) }) as BoxFuture<'static, _>;
                }
            };

            let future = func(args);

            Box::pin(async move {
                let result = future.await?;
                serde_json::to_string(&result)
                    .map_err(|e| format!("Failed to serialize result: {}", e))
            }) as BoxFuture<'static, _>
        };

        self.insert(declaration, Box::new(wrapper));
    }

    /// Register a synchronous function under `declaration.name`
    pub fn register_sync<F, Args, R>(&mut self, declaration: ToolDeclaration, func: F)
    where
        F: Fn(Args) -> Result<R, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let result = serde_json::from_value::<Args>(args_json)
                .map_err(|e| format!("Failed to deserialize arguments: {}", e))
                .and_then(&func)
                .and_then(|result| {
                    serde_json::to_string(&result)
                        .map_err(|e| format!("Failed to serialize result: {}", e))
                });
            Box::pin(async move { result }) as BoxFuture<'static, _>
        };

        self.insert(declaration, Box::new(wrapper));
    }

    fn insert(&mut self, declaration: ToolDeclaration, func: AsyncToolFn) {
        self.declarations.retain(|d| d.name != declaration.name);
        self.functions.insert(declaration.name.clone(), func);
        self.declarations.push(declaration);
    }

    /// Declarations to send with each model request
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.declarations.clone()
    }

    /// Check if a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Get the number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    async fn execute_function(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        match self.functions.get(name) {
            Some(func) => func(arguments).await,
            None => Err(format!("Unknown tool: {}", name)),
        }
    }
}

#[async_trait]
impl ToolExecutor for FunctionRegistry {
    async fn execute(
        &self,
        _tool_use_id: String,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        self.execute_function(&name, arguments).await
    }
}
