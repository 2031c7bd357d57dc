use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Command handler trait
#[async_trait]
pub trait CommandHandler<C>: Send + Sync {
    type Result: Send + Sync;
    type Error: std::error::Error + Send + Sync;

    async fn handle(&self, command: C) -> Result<Self::Result, Self::Error>;
}

/// Command bus dispatching commands to their registered handler by type.
pub struct CommandBus {
    handlers: Arc<RwLock<HashMap<std::any::TypeId, Box<dyn CommandHandlerBox + Send + Sync>>>>,
}

/// Boxed command handler for type erasure
#[async_trait]
trait CommandHandlerBox: Send + Sync {
    async fn handle(
        &self,
        command: Box<dyn std::any::Any + Send + Sync>,
    ) -> Result<Box<dyn std::any::Any + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>;
}

impl CommandBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a command handler
    pub async fn register_handler<C, H>(&self, handler: H)
    where
        C: 'static + Send + Sync,
        H: CommandHandler<C> + 'static + Send + Sync,
    {
        let boxed_handler = Box::new(HandlerWrapper::new(handler));
        let type_id = std::any::TypeId::of::<C>();

        let mut handlers = self.handlers.write().await;
        handlers.insert(type_id, boxed_handler);
    }

    /// Execute a command
    pub async fn execute<C>(
        &self,
        command: C,
    ) -> Result<Box<dyn std::any::Any + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>
    where
        C: 'static + Send + Sync,
    {
        let type_id = std::any::TypeId::of::<C>();
        let handlers = self.handlers.read().await;

        if let Some(handler) = handlers.get(&type_id) {
            let boxed_command = Box::new(command);
            handler.handle(boxed_command).await
        } else {
            Err(format!("No handler registered for command type: {type_id:?}").into())
        }
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapper for command handlers to enable type erasure
struct HandlerWrapper<C, H> {
    handler: H,
    _phantom: std::marker::PhantomData<C>,
}

impl<C, H> HandlerWrapper<C, H> {
    fn new(handler: H) -> Self {
        Self {
            handler,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<C, H> CommandHandlerBox for HandlerWrapper<C, H>
where
    C: 'static + Send + Sync,
    H: CommandHandler<C> + Send + Sync,
    <H as CommandHandler<C>>::Result: 'static,
    <H as CommandHandler<C>>::Error: 'static,
{
    async fn handle(
        &self,
        command: Box<dyn std::any::Any + Send + Sync>,
    ) -> Result<Box<dyn std::any::Any + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>
    {
        let command = command
            .downcast::<C>()
            .map_err(|_| "Failed to downcast command")?;

        let result = self
            .handler
            .handle(*command)
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

        Ok(Box::new(result))
    }
}
