//! Discovery and caching of the available services.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use tracing::debug;

use crate::service::blog::{LiveJournalService, WordPressService};
use crate::service::bookmark::StumbleUponService;
use crate::service::game::XboxService;
use crate::service::mail::GmailService;
use crate::service::news::FlipboardService;
use crate::service::profile::ScrimService;
use crate::service::tech::{Cloud9Service, GitHubService, PastebinService};
use crate::service::{Descriptor, Service};

/// Builds a service registered under the given category.
pub type ServiceFactory = fn(&str) -> Arc<dyn Service>;

/// A registration table: every category with the factories of its services.
pub type Catalog = &'static [(&'static str, &'static [ServiceFactory])];

/// Every service shipped with this crate, grouped by category.
pub static CATALOG: Catalog = &[
    (
        "blog",
        &[
            |c| Arc::new(LiveJournalService::new(c)),
            |c| Arc::new(WordPressService::new(c)),
        ],
    ),
    ("bookmark", &[|c| Arc::new(StumbleUponService::new(c))]),
    ("game", &[|c| Arc::new(XboxService::new(c))]),
    ("mail", &[|c| Arc::new(GmailService::new(c))]),
    ("news", &[|c| Arc::new(FlipboardService::new(c))]),
    ("profile", &[|c| Arc::new(ScrimService::new(c))]),
    (
        "tech",
        &[
            |c| Arc::new(Cloud9Service::new(c)),
            |c| Arc::new(GitHubService::new(c)),
            |c| Arc::new(PastebinService::new(c)),
        ],
    ),
];

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::builtin);

/// The process-wide registry of built-in services.
#[must_use]
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Discovery failed; no partial registry is ever returned.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// A service does not describe itself consistently with its registration.
    #[error("malformed service under `{category}` category: {reason}")]
    Malformed {
        /// Category the service was registered under.
        category: String,
        /// What is wrong with it.
        reason: String,
    },
}

type Discover = dyn Fn() -> Result<Vec<Arc<dyn Service>>, RegistryError> + Send + Sync;

/// Loads services once, sorts them by category then title, and hands out
/// copies of the cached list.
pub struct Registry {
    discover: Box<Discover>,
    cache: RwLock<Option<Arc<[Arc<dyn Service>]>>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaded = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|services| services.len());
        f.debug_struct("Registry").field("loaded", &loaded).finish()
    }
}

impl Registry {
    /// A registry over an arbitrary discovery capability.
    pub fn new<F>(discover: F) -> Self
    where
        F: Fn() -> Result<Vec<Arc<dyn Service>>, RegistryError> + Send + Sync + 'static,
    {
        Self {
            discover: Box::new(discover),
            cache: RwLock::new(None),
        }
    }

    /// A registry over a registration table.
    #[must_use]
    pub fn from_catalog(catalog: Catalog) -> Self {
        Self::new(move || discover_catalog(catalog))
    }

    /// A registry over [`CATALOG`].
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_catalog(CATALOG)
    }

    /// All services, sorted case-insensitively by category and then title.
    ///
    /// The first call runs discovery; later calls reuse the cached list
    /// until [`unload`](Self::unload).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if discovery fails.
    pub fn load(&self) -> Result<Vec<Arc<dyn Service>>, RegistryError> {
        if let Some(services) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            debug!(count = services.len(), "services previously loaded");
            return Ok(services.to_vec());
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(services) = cache.as_ref() {
            return Ok(services.to_vec());
        }

        let mut services = (self.discover)()?;
        for service in &services {
            let descriptor = service.descriptor();
            if descriptor.category.trim().is_empty() || descriptor.title.trim().is_empty() {
                return Err(RegistryError::Malformed {
                    category: descriptor.category.clone(),
                    reason: "category and title must not be empty".into(),
                });
            }
            debug!(
                service = %descriptor.title,
                category = %descriptor.category,
                "loaded service"
            );
        }
        services.sort_by_cached_key(|service| sort_key(service.descriptor()));

        debug!(
            count = services.len(),
            categories = distinct_categories(&services).len(),
            "loaded services"
        );

        let services: Arc<[Arc<dyn Service>]> = services.into();
        *cache = Some(Arc::clone(&services));
        Ok(services.to_vec())
    }

    /// Services whose descriptor satisfies `filter`, in load order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if discovery fails.
    pub fn get(
        &self,
        filter: Option<&dyn Fn(&Descriptor) -> bool>,
    ) -> Result<Vec<Arc<dyn Service>>, RegistryError> {
        let mut services = self.load()?;
        if let Some(filter) = filter {
            services.retain(|service| filter(service.descriptor()));
        }
        Ok(services)
    }

    /// Distinct categories of the services `filter` selects, in load order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if discovery fails.
    pub fn categories(
        &self,
        filter: Option<&dyn Fn(&Descriptor) -> bool>,
    ) -> Result<Vec<String>, RegistryError> {
        Ok(distinct_categories(&self.get(filter)?))
    }

    /// Drop the cached services so the next [`load`](Self::load) rediscovers.
    ///
    /// Must not race with checks that are still running.
    pub fn unload(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
        debug!("unloaded all services");
    }
}

fn discover_catalog(catalog: Catalog) -> Result<Vec<Arc<dyn Service>>, RegistryError> {
    let mut services = Vec::new();
    for &(category, factories) in catalog {
        for factory in factories {
            let service = factory(category);
            if service.descriptor().category != category {
                return Err(RegistryError::Malformed {
                    category: category.to_owned(),
                    reason: format!(
                        "{} service reports category `{}`",
                        service.descriptor().title,
                        service.descriptor().category
                    ),
                });
            }
            services.push(service);
        }
    }
    Ok(services)
}

fn sort_key(descriptor: &Descriptor) -> (String, String) {
    (
        descriptor.category.to_uppercase(),
        descriptor.title.to_uppercase(),
    )
}

/// Categories in first-seen order. Case variants are distinct categories.
fn distinct_categories(services: &[Arc<dyn Service>]) -> Vec<String> {
    let mut seen = HashSet::new();
    services
        .iter()
        .map(|s| s.descriptor().category.as_str())
        .filter(|category| seen.insert(*category))
        .map(str::to_owned)
        .collect()
}
