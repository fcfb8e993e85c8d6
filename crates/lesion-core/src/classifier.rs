/*!
A single-image classifier on top of a runnable tract plan.
 */
use crate::{
    artifact::{self, Artifact},
    error::LesionError,
    model_api::ModelApi,
    preprocess::ImageTensor,
    registry::ModelDescriptor,
};
use std::path::{Path, PathBuf};
use tract_core::prelude::{
    tvec, Datum, SymbolValues, TDim, TVec, ToDim, TractResult, TypedModel, TypedSimplePlan,
};
use tract_hir::{
    infer::Factoid,
    prelude::{InferenceFact, InferenceModel, InferenceModelExt},
};

/// Runs a classification model on one image at a time.
///
/// The model input is pinned to the descriptor's `(1, height, width, 3)`
/// shape when loading, and the single output is expected to hold one
/// probability per label.
pub struct Classifier {
    plan: TypedSimplePlan<TypedModel>,
    model_api: ModelApi,
    input_shape: Vec<usize>,
    classes: usize,
    path: PathBuf,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("path", &self.path)
            .field("input_shape", &self.input_shape)
            .field("classes", &self.classes)
            .finish()
    }
}

/// Compare declared dimensions against the expected shape, ignoring
/// dimensions that aren't known yet.
fn check_declared(declared: &[Option<usize>], expected: &[usize]) -> Result<(), LesionError> {
    if declared.is_empty() {
        return Ok(());
    }

    let compatible = declared.len() == expected.len()
        && declared
            .iter()
            .zip(expected)
            .all(|(found, expected)| found.map_or(true, |found| found == *expected));

    if compatible {
        Ok(())
    } else {
        Err(LesionError::ShapeMismatch {
            expected: expected.to_vec(),
            found: declared.iter().map(|dim| dim.unwrap_or(0)).collect(),
        })
    }
}

fn build_model(mut model: InferenceModel, shape: &[usize]) -> TractResult<TypedSimplePlan<TypedModel>> {
    let outlets = model.output_outlets()?.len();
    for output in 0..outlets {
        model.set_output_fact(output, Default::default())?;
    }

    let full_shape: TVec<TDim> = shape.iter().map(|v| (*v as i32).to_dim()).collect();
    model.set_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), full_shape))?;

    model
        .into_typed()?
        .into_decluttered()?
        .into_optimized()?
        .into_runnable()
}

fn build_typed(model: TypedModel) -> TractResult<TypedSimplePlan<TypedModel>> {
    let symbol = model.symbols.sym("N");
    let model = model.concretize_dims(&SymbolValues::default().with(&symbol, 1))?;

    model.into_decluttered()?.into_optimized()?.into_runnable()
}

impl Classifier {
    /// Locate and load the artifact for `descriptor`.
    ///
    /// # Errors
    ///
    /// [`LesionError::ModelLoadError`] if the artifact is missing or tract
    /// can't parse it, [`LesionError::ShapeMismatch`] if the model declares
    /// an input shape other than the descriptor's.
    pub fn load(descriptor: &ModelDescriptor) -> Result<Self, LesionError> {
        let artifact = artifact::locate(&descriptor.path)
            .map_err(|e| LesionError::model_load(&descriptor.path, e))?;

        match &artifact {
            Artifact::Onnx(path) => {
                let model = artifact::read_onnx(path).map_err(|e| LesionError::model_load(path, e))?;
                Self::from_model(model, descriptor, path)
            }
            Artifact::Nnef(path) => {
                let model = artifact::read_nnef(path).map_err(|e| LesionError::model_load(path, e))?;
                Self::from_typed(model, descriptor, path)
            }
        }
    }

    /// Create a classifier from an inference model, e.g. loaded from ONNX.
    pub fn from_model(
        model: InferenceModel,
        descriptor: &ModelDescriptor,
        path: &Path,
    ) -> Result<Self, LesionError> {
        let expected = descriptor.input_shape().to_vec();

        let input = model
            .input_fact(0)
            .map(|fact| fact.shape.clone())
            .map_err(|e| LesionError::model_load(path, e))?;

        let declared: Vec<Option<usize>> = input
            .dims()
            .map(|dim| {
                dim.concretize()
                    .and_then(|v| v.to_i64().ok())
                    .map(|v| v as usize)
            })
            .collect();
        check_declared(&declared, &expected)?;

        let plan = build_model(model, &expected).map_err(|e| LesionError::model_load(path, e))?;
        let model_api =
            ModelApi::for_typed_model(plan.model()).map_err(|e| LesionError::model_load(path, e))?;

        Self::new(plan, model_api, descriptor, path)
    }

    /// Create a classifier from a typed model, e.g. loaded from NNEF.
    pub fn from_typed(
        model: TypedModel,
        descriptor: &ModelDescriptor,
        path: &Path,
    ) -> Result<Self, LesionError> {
        let expected = descriptor.input_shape().to_vec();

        let input = model
            .input_fact(0)
            .map(|fact| fact.shape.clone())
            .map_err(|e| LesionError::model_load(path, e))?;

        let declared: Vec<Option<usize>> = input
            .iter()
            .map(|dim| dim.to_i64().ok().map(|v| v as usize))
            .collect();
        check_declared(&declared, &expected)?;

        let plan = build_typed(model).map_err(|e| LesionError::model_load(path, e))?;
        let model_api =
            ModelApi::for_typed_model(plan.model()).map_err(|e| LesionError::model_load(path, e))?;

        Self::new(plan, model_api, descriptor, path)
    }

    fn new(
        plan: TypedSimplePlan<TypedModel>,
        model_api: ModelApi,
        descriptor: &ModelDescriptor,
        path: &Path,
    ) -> Result<Self, LesionError> {
        if model_api.inputs.len() != 1 || model_api.outputs.is_empty() {
            return Err(LesionError::model_load(
                path,
                anyhow::anyhow!(
                    "expected a single input and an output, found {} inputs and {} outputs",
                    model_api.inputs.len(),
                    model_api.outputs.len()
                ),
            ));
        }

        Ok(Self {
            plan,
            model_api,
            input_shape: descriptor.input_shape().to_vec(),
            classes: descriptor.labels.len(),
            path: path.to_owned(),
        })
    }

    /// Execute a forward pass, returning one probability per class.
    ///
    /// # Errors
    ///
    /// [`LesionError::ShapeMismatch`] if `tensor` or the produced output
    /// doesn't match the descriptor the classifier was loaded for.
    pub fn run(&self, tensor: ImageTensor) -> Result<Vec<f32>, LesionError> {
        if tensor.shape() != self.input_shape.as_slice() {
            return Err(LesionError::ShapeMismatch {
                expected: self.input_shape.clone(),
                found: tensor.shape().to_vec(),
            });
        }

        let result = self
            .plan
            .run(tvec!(tensor.into_tensor().into()))
            .map_err(LesionError::InferenceError)?;

        let output = result.first().ok_or_else(|| {
            LesionError::InferenceError(anyhow::anyhow!("model produced no outputs"))
        })?;
        let probabilities = output
            .as_slice::<f32>()
            .map_err(LesionError::InferenceError)?;

        if probabilities.len() != self.classes {
            return Err(LesionError::ShapeMismatch {
                expected: vec![self.classes],
                found: vec![probabilities.len()],
            });
        }

        Ok(probabilities.to_vec())
    }

    /// Retrieve the name and shapes of the model inputs.
    pub fn input_shapes(&self) -> &[(String, Vec<usize>)] {
        &self.model_api.inputs
    }

    /// Retrieve the name and shapes of the model outputs.
    pub fn output_shapes(&self) -> &[(String, Vec<usize>)] {
        &self.model_api.outputs
    }

    /// The artifact this classifier was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
