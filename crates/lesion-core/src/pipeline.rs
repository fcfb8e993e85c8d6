/*!
The preprocess, infer and rank stages run back to back for one image.
*/

use crate::{
    error::LesionError,
    preprocess::preprocess,
    rank::{rank, Prediction},
    registry::{ModelKind, Registry},
    store::ModelStore,
};
use std::sync::Arc;

/// Everything needed to classify an image: the immutable registry and
/// the store models are loaded through.
pub struct Pipeline {
    registry: Arc<Registry>,
    store: ModelStore,
}

impl Pipeline {
    pub fn new(registry: Arc<Registry>, store: ModelStore) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Classify the encoded image in `bytes` with the `kind` model.
    ///
    /// Any stage failing aborts the whole classification.
    pub fn classify(&self, kind: ModelKind, bytes: &[u8]) -> Result<Vec<Prediction>, LesionError> {
        let descriptor = self.registry.get(kind);

        let tensor = preprocess(bytes, descriptor)?;
        let classifier = self.store.get(descriptor)?;
        let probabilities = classifier.run(tensor)?;

        Ok(rank(&probabilities, &descriptor.labels, descriptor.cutoff))
    }
}
