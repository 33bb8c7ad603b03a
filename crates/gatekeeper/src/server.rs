//! `Gatekeeper` builder and runtime handle.
//!
//! This is where the layers are wired together: the configured resolver
//! candidates go through the registry, the winner goes into one shared
//! `SessionCache`, and the cache is handed to the invalidation listener
//! and the request handlers.

use std::sync::Arc;

use gatekeeper_listener::{
    ChangeFeed, FatalFault, InvalidationListener, NoopStorageInvalidation,
    StorageInvalidation,
};
use gatekeeper_protocol::JsonCodec;
use gatekeeper_session::{
    Clock, IdentityResolver, ResolverRegistry, SessionCache, SystemClock,
};
use tokio::task::JoinHandle;

use crate::{GatekeeperConfig, GatekeeperError};

type ResolverFactory =
    Box<dyn FnOnce(&GatekeeperConfig) -> Arc<dyn IdentityResolver> + Send>;

/// Builder for configuring and starting Gatekeeper.
///
/// # Example
///
/// ```rust,ignore
/// let gatekeeper = Gatekeeper::builder()
///     .config(GatekeeperConfig::from_init_info(&init_info)?)
///     .resolver_from_config(10, "ldap", |cfg| Arc::new(Ldap::new(&cfg.guest_user_id)))
///     .storage_hook(Arc::new(my_storage))
///     .build()?;
/// ```
pub struct GatekeeperBuilder {
    config: GatekeeperConfig,
    resolvers: Vec<(i32, String, ResolverFactory)>,
    storage: Arc<dyn StorageInvalidation>,
    clock: Arc<dyn Clock>,
}

impl GatekeeperBuilder {
    /// Creates a builder with default config, no resolvers, a no-op
    /// storage hook, and the system clock.
    pub fn new() -> Self {
        Self {
            config: GatekeeperConfig::default(),
            resolvers: Vec::new(),
            storage: Arc::new(NoopStorageInvalidation),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn config(mut self, config: GatekeeperConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a ready-made resolver candidate.
    pub fn resolver(
        self,
        priority: i32,
        name: &str,
        resolver: Arc<dyn IdentityResolver>,
    ) -> Self {
        self.resolver_from_config(priority, name, move |_| resolver)
    }

    /// Registers a resolver candidate built from the final config.
    ///
    /// Factories run during [`build`](Self::build), after the config is
    /// fixed, so a resolver can pick up e.g. the guest user id.
    pub fn resolver_from_config<F>(
        mut self,
        priority: i32,
        name: &str,
        factory: F,
    ) -> Self
    where
        F: FnOnce(&GatekeeperConfig) -> Arc<dyn IdentityResolver> + Send + 'static,
    {
        self.resolvers
            .push((priority, name.to_string(), Box::new(factory)));
        self
    }

    /// Sets the hook told about user changes before the session cache.
    pub fn storage_hook(mut self, storage: Arc<dyn StorageInvalidation>) -> Self {
        self.storage = storage;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Chooses the resolver and creates the session cache.
    ///
    /// # Errors
    /// [`GatekeeperError::Registry`] if no resolver was registered or the
    /// highest priority is shared.
    pub fn build(self) -> Result<Gatekeeper, GatekeeperError> {
        tracing::info!("Gatekeeper starting...");

        let mut registry = ResolverRegistry::new();
        for (priority, name, factory) in self.resolvers {
            registry.register(priority, name, factory(&self.config));
        }
        let resolver = registry.select()?;

        let cache = Arc::new(SessionCache::with_clock(
            self.config.session.clone(),
            resolver,
            self.clock,
        ));

        tracing::info!("Gatekeeper started");
        Ok(Gatekeeper {
            cache,
            storage: self.storage,
            codec: JsonCodec,
            config: self.config,
        })
    }
}

impl Default for GatekeeperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A started Gatekeeper.
///
/// Holds the one session cache of the process. Clone the `Arc` from
/// [`cache`](Self::cache) to share it; there is no global instance.
pub struct Gatekeeper {
    pub(crate) cache: Arc<SessionCache>,
    pub(crate) storage: Arc<dyn StorageInvalidation>,
    pub(crate) codec: JsonCodec,
    config: GatekeeperConfig,
}

impl Gatekeeper {
    pub fn builder() -> GatekeeperBuilder {
        GatekeeperBuilder::new()
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }

    /// Creates a listener bound to this Gatekeeper's cache and storage hook.
    pub fn listener<F: ChangeFeed>(&self, feed: F) -> InvalidationListener<F> {
        InvalidationListener::new(
            feed,
            Arc::clone(&self.cache),
            Arc::clone(&self.storage),
        )
    }

    /// Runs a listener on the Tokio runtime.
    ///
    /// The task finishes only with a [`FatalFault`]; the host should treat
    /// its completion as the signal to shut down.
    pub fn spawn_listener<F: ChangeFeed>(
        &self,
        feed: F,
    ) -> JoinHandle<FatalFault> {
        let listener = self.listener(feed);
        tokio::spawn(listener.run())
    }
}
