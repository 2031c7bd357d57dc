use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Query handler trait
#[async_trait]
pub trait QueryHandler<Q>: Send + Sync {
    type Result: Send + Sync;
    type Error: std::error::Error + Send + Sync;

    async fn handle(&self, query: Q) -> Result<Self::Result, Self::Error>;
}

/// Query bus dispatching queries to their registered handler by type.
pub struct QueryBus {
    handlers: Arc<RwLock<HashMap<std::any::TypeId, Box<dyn QueryHandlerBox + Send + Sync>>>>,
}

/// Boxed query handler for type erasure
#[async_trait]
trait QueryHandlerBox: Send + Sync {
    async fn handle(
        &self,
        query: Box<dyn std::any::Any + Send + Sync>,
    ) -> Result<Box<dyn std::any::Any + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>;
}

impl Default for QueryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a query handler
    pub async fn register_handler<Q, H>(&self, handler: H)
    where
        Q: 'static + Send + Sync,
        H: QueryHandler<Q> + 'static + Send + Sync,
    {
        let boxed_handler = Box::new(QueryHandlerWrapper::new(handler));
        let type_id = std::any::TypeId::of::<Q>();

        let mut handlers = self.handlers.write().await;
        handlers.insert(type_id, boxed_handler);
    }

    /// Execute a query
    pub async fn execute<Q>(
        &self,
        query: Q,
    ) -> Result<Box<dyn std::any::Any + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>
    where
        Q: 'static + Send + Sync,
    {
        let type_id = std::any::TypeId::of::<Q>();
        let handlers = self.handlers.read().await;

        if let Some(handler) = handlers.get(&type_id) {
            let boxed_query = Box::new(query);
            handler.handle(boxed_query).await
        } else {
            Err(format!("No handler registered for query type: {type_id:?}").into())
        }
    }
}

/// Wrapper for query handlers to enable type erasure
struct QueryHandlerWrapper<Q, H> {
    handler: H,
    _phantom: std::marker::PhantomData<Q>,
}

impl<Q, H> QueryHandlerWrapper<Q, H> {
    fn new(handler: H) -> Self {
        Self {
            handler,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<Q, H> QueryHandlerBox for QueryHandlerWrapper<Q, H>
where
    Q: 'static + Send + Sync,
    H: QueryHandler<Q> + Send + Sync,
    <H as QueryHandler<Q>>::Result: 'static,
    <H as QueryHandler<Q>>::Error: 'static,
{
    async fn handle(
        &self,
        query: Box<dyn std::any::Any + Send + Sync>,
    ) -> Result<Box<dyn std::any::Any + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>
    {
        let query = query.downcast::<Q>().map_err(|_| "Failed to downcast query")?;

        let result = self
            .handler
            .handle(*query)
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

        Ok(Box::new(result))
    }
}
