/*!
The registry maps each supported model kind to the static descriptor
used to preprocess, run and rank for that model.
*/

use crate::error::LesionError;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    str::FromStr,
};

const SKIN_LABELS: [&str; 7] = [
    "Actinic Keratoses (Solar Keratoses) or intraepithelial Carcinoma (Bowen’s disease)",
    "Basal Cell Carcinoma",
    "Benign Keratosis",
    "Dermatofibroma",
    "Melanoma",
    "Melanocytic Nevi",
    "Vascular skin lesion",
];

const INVASIVE_LABELS: [&str; 2] = ["In situ", "Invasive"];

const META_LABELS: [&str; 2] = ["No metastasis", "Metastasis"];

/// The closed set of classifiers the service knows about.
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum ModelKind {
    /// Seven-way skin lesion classification.
    #[default]
    Skin,
    /// In situ versus invasive melanoma.
    Invasive,
    /// Metastasis detection.
    Meta,
}

impl ModelKind {
    /// Every supported kind, in registry order.
    pub const ALL: [ModelKind; 3] = [ModelKind::Skin, ModelKind::Invasive, ModelKind::Meta];

    /// The identifier used on the wire and as the artifact directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Skin => "skin",
            ModelKind::Invasive => "invasive",
            ModelKind::Meta => "meta",
        }
    }
}

impl FromStr for ModelKind {
    type Err = LesionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skin" => Ok(ModelKind::Skin),
            "invasive" => Ok(ModelKind::Invasive),
            "meta" => Ok(ModelKind::Meta),
            other => Err(LesionError::UnknownModel(other.to_owned())),
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Static configuration for one classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub kind: ModelKind,

    /// Directory holding the model artifact.
    pub path: PathBuf,

    /// Expected input width in pixels.
    pub width: usize,

    /// Expected input height in pixels.
    pub height: usize,

    /// Scalar used in `(pixel - offset) / offset`.
    pub offset: f32,

    /// Class labels, indexed like the model output.
    pub labels: Vec<String>,

    /// Maximum number of predictions returned.
    pub cutoff: usize,
}

impl ModelDescriptor {
    /// The full input shape the model is fed, `(1, height, width, 3)`.
    pub fn input_shape(&self) -> [usize; 4] {
        [1, self.height, self.width, 3]
    }

    fn builtin(kind: ModelKind, models_dir: &Path) -> Self {
        let (offset, labels, cutoff): (f32, &[&str], usize) = match kind {
            ModelKind::Skin => (127.5, &SKIN_LABELS, 5),
            ModelKind::Invasive => (255.0, &INVASIVE_LABELS, 2),
            ModelKind::Meta => (255.0, &META_LABELS, 2),
        };

        Self {
            kind,
            path: models_dir.join(kind.as_str()),
            width: 224,
            height: 224,
            offset,
            labels: labels.iter().map(|l| (*l).to_owned()).collect(),
            cutoff,
        }
    }
}

/// Immutable lookup table from [`ModelKind`] to [`ModelDescriptor`].
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: HashMap<ModelKind, ModelDescriptor>,
}

impl Registry {
    /// Build the built-in table with artifacts located under `models_dir`.
    pub fn new(models_dir: impl AsRef<Path>) -> Self {
        let models_dir = models_dir.as_ref();
        let descriptors = ModelKind::ALL
            .iter()
            .map(|kind| (*kind, ModelDescriptor::builtin(*kind, models_dir)))
            .collect();

        Self { descriptors }
    }

    /// Replace the descriptor for `descriptor.kind`.
    pub fn with_descriptor(mut self, descriptor: ModelDescriptor) -> Self {
        self.descriptors.insert(descriptor.kind, descriptor);
        self
    }

    /// Look up the descriptor for a parsed kind.
    pub fn get(&self, kind: ModelKind) -> &ModelDescriptor {
        // Every kind is inserted by `new` and never removed.
        &self.descriptors[&kind]
    }

    /// Parse `identifier` and look up its descriptor.
    pub fn lookup(&self, identifier: &str) -> Result<&ModelDescriptor, LesionError> {
        let kind = identifier.parse::<ModelKind>()?;
        Ok(self.get(kind))
    }

    /// Iterate over all descriptors in [`ModelKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> + '_ {
        ModelKind::ALL.iter().map(move |kind| self.get(*kind))
    }
}
