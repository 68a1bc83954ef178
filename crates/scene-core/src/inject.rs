//! Service locator for the scene `inject` hook
//!
//! Services are registered by type and looked up by type. A scene that needs
//! collaborators (a clock, a URL builder, a translator) pulls them from the
//! [`Services`] it is handed at the start of every transform call.
//!
//! ```
//! use scene_core::Services;
//!
//! struct BaseUrl(&'static str);
//!
//! let services = Services::new().with(BaseUrl("https://example.com"));
//! assert_eq!(services.require::<BaseUrl>().unwrap().0, "https://example.com");
//! assert!(services.get::<String>().is_none());
//! ```
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use crate::{Error, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-keyed registry of shared services
#[derive(Clone, Default)]
pub struct Services {
    services: HashMap<TypeId, (&'static str, Arc<dyn Any + Send + Sync>)>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service`, replacing any earlier service of the same type
    pub fn with<T: Any + Send + Sync>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, service: T) {
        self.insert_shared(Arc::new(service));
    }

    /// Register an already shared service
    pub fn insert_shared<T: Any + Send + Sync>(&mut self, service: Arc<T>) {
        let service: Arc<dyn Any + Send + Sync> = service;
        self.services
            .insert(TypeId::of::<T>(), (std::any::type_name::<T>(), service));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|(_, service)| service.clone().downcast::<T>().ok())
    }

    /// Like [`Services::get`], failing with [`Error::MissingService`]
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.get::<T>().ok_or_else(|| Error::MissingService {
            service: std::any::type_name::<T>().to_string(),
        })
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.services.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("Services").field("services", &names).finish()
    }
}
