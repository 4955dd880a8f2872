//! Route loader registry
//!
//! Maps route keys to the asynchronous loaders that fetch their modules.
//! The registry is assembled once at startup and is read-only afterwards.

use crate::{Result, RouteKey, RouteRule, RouteTable};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Asynchronous factory fetching a route's module
#[async_trait::async_trait]
pub trait RouteLoader: Send + Sync {
    /// Fetch the route module. Errors are treated as preload failures.
    async fn load(&self) -> Result<()>;
}

/// Loader backed by a closure returning a future
pub struct FnLoader<F> {
    f: F,
}

#[async_trait::async_trait]
impl<F, Fut> RouteLoader for FnLoader<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn load(&self) -> Result<()> {
        (self.f)().await
    }
}

/// Wrap a closure as a [`RouteLoader`]
pub fn loader_fn<F, Fut>(f: F) -> Arc<dyn RouteLoader>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnLoader { f })
}

/// Registry of route rules and their loaders
pub struct RouteLoaderRegistry {
    table: RouteTable,
    loaders: HashMap<RouteKey, Arc<dyn RouteLoader>>,
}

impl RouteLoaderRegistry {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Resolve a raw path to its route key
    pub fn normalize_route(&self, path: &str) -> Option<RouteKey> {
        self.table.normalize_route(path)
    }

    /// Loader for a key
    pub fn loader(&self, key: &RouteKey) -> Option<Arc<dyn RouteLoader>> {
        self.loaders.get(key).cloned()
    }

    /// Check if a key is registered
    pub fn contains(&self, key: &RouteKey) -> bool {
        self.loaders.contains_key(key)
    }

    /// Keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.table.keys()
    }

    /// Underlying prefix table
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if no route is registered
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl std::fmt::Debug for RouteLoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteLoaderRegistry")
            .field("routes", &self.table.rules())
            .finish()
    }
}

/// Builder for [`RouteLoaderRegistry`]
#[derive(Default)]
pub struct RegistryBuilder {
    table: RouteTable,
    loaders: HashMap<RouteKey, Arc<dyn RouteLoader>>,
}

impl RegistryBuilder {
    /// Register a route: key, path prefix and loader
    pub fn route(
        mut self,
        key: impl Into<RouteKey>,
        prefix: &str,
        loader: Arc<dyn RouteLoader>,
    ) -> Result<Self> {
        let rule = RouteRule::new(key, prefix)?;
        let key = rule.key.clone();
        self.table.insert(rule)?;
        self.loaders.insert(key, loader);
        Ok(self)
    }

    /// Finish the registry
    pub fn build(self) -> RouteLoaderRegistry {
        RouteLoaderRegistry {
            table: self.table,
            loaders: self.loaders,
        }
    }
}
