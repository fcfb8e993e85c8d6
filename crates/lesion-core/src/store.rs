/*!
Hands out loaded classifiers according to a [`CachePolicy`].

With [`CachePolicy::Cold`] every call pays the full load cost, reading
the artifact from disk again. With [`CachePolicy::Cached`] each kind is
loaded on first use and then shared between all callers.
*/

use crate::{
    classifier::Classifier,
    error::LesionError,
    registry::{ModelDescriptor, ModelKind, Registry},
};
use parking_lot::RwLock;
use std::{collections::HashMap, str::FromStr, sync::Arc, time::Instant};

/// How loaded models are kept between calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Load the artifact on every call.
    Cold,

    /// Load once per kind and share the result.
    #[default]
    Cached,
}

impl FromStr for CachePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cold" => Ok(CachePolicy::Cold),
            "cached" => Ok(CachePolicy::Cached),
            _ => Err(format!("unknown cache policy: {}", s)),
        }
    }
}

impl std::fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CachePolicy::Cold => f.pad("cold"),
            CachePolicy::Cached => f.pad("cached"),
        }
    }
}

/// Source of [`Classifier`]s for the request pipeline.
pub struct ModelStore {
    policy: CachePolicy,
    loaded: RwLock<HashMap<ModelKind, Arc<Classifier>>>,
}

impl ModelStore {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Number of classifiers currently held.
    pub fn cached(&self) -> usize {
        self.loaded.read().len()
    }

    /// Get a classifier for `descriptor`, loading it if the policy requires.
    pub fn get(&self, descriptor: &ModelDescriptor) -> Result<Arc<Classifier>, LesionError> {
        if self.policy == CachePolicy::Cold {
            return load(descriptor).map(Arc::new);
        }

        if let Some(classifier) = self.loaded.read().get(&descriptor.kind) {
            return Ok(classifier.clone());
        }

        // Loading happens without the lock held; a concurrent load of the same kind keeps the first.
        let classifier = Arc::new(load(descriptor)?);
        let mut loaded = self.loaded.write();
        Ok(loaded.entry(descriptor.kind).or_insert(classifier).clone())
    }

    /// Load every model in `registry` up front.
    ///
    /// With [`CachePolicy::Cold`] this only checks that each model loads.
    pub fn preload(&self, registry: &Registry) -> Result<(), LesionError> {
        for descriptor in registry.iter() {
            self.get(descriptor)?;
        }

        Ok(())
    }
}

fn load(descriptor: &ModelDescriptor) -> Result<Classifier, LesionError> {
    let start = Instant::now();
    let classifier = Classifier::load(descriptor)?;

    log::info!(
        "loaded {} model from {:?} in {:.2} ms",
        descriptor.kind,
        classifier.path(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(classifier)
}
