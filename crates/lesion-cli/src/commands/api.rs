use super::ModelArgs;
use anyhow::Result;
use clap::Parser;
use lesion_core::{Classifier, ModelKind};

/// Print API for a model
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct ApiArgs {
    /// The model kind - skin, invasive or meta.
    kind: ModelKind,

    #[clap(flatten)]
    models: ModelArgs,
}

pub(super) fn describe_api(config: ApiArgs) -> Result<()> {
    let registry = config.models.registry();
    let descriptor = registry.get(config.kind);
    let model = Classifier::load(descriptor)?;

    println!("Model: {} ({:?})", descriptor.kind, model.path());
    println!(
        "Labels: {}, returning the top {}",
        descriptor.labels.len(),
        descriptor.cutoff
    );

    println!("\nInputs:");
    for (name, shape) in model.input_shapes() {
        println!("\t{:40}: {:?}", name, shape);
    }

    println!("\nOutputs:");
    for (name, shape) in model.output_shapes() {
        println!("\t{:40}: {:?}", name, shape);
    }
    Ok(())
}
