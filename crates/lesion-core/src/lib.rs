/*!

# Lesion Core

The building blocks of the lesion classification service: a static
registry of the supported models, image preprocessing into the tensor a
model expects, tract-backed inference, and ranking of the resulting
class probabilities.

```no_run
use lesion_core::{CachePolicy, ModelKind, ModelStore, Pipeline, Registry};
use std::sync::Arc;
# fn load_bytes(s: &str) -> Vec<u8> { vec![] }

let registry = Arc::new(Registry::new("models"));
let pipeline = Pipeline::new(registry, ModelStore::new(CachePolicy::Cached));

let predictions = pipeline.classify(ModelKind::Skin, &load_bytes("lesion.jpg"))?;
for prediction in predictions {
    println!("{}: {:.3}", prediction.class_name, prediction.probability);
}
# Ok::<(), Box<dyn std::error::Error>>(())
```

 */

#![warn(rust_2018_idioms)]

pub use tract_core;

pub mod artifact;
pub mod classifier;
mod error;
mod model_api;
pub mod pipeline;
pub mod preprocess;
pub mod rank;
pub mod registry;
pub mod store;

#[doc(inline)]
pub use crate::error::LesionError;
pub use classifier::Classifier;
pub use model_api::ModelApi;
pub use pipeline::Pipeline;
pub use preprocess::{preprocess, ImageTensor};
pub use rank::{rank, Prediction};
pub use registry::{ModelDescriptor, ModelKind, Registry};
pub use store::{CachePolicy, ModelStore};
