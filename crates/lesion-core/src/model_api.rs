use tract_core::{model::TypedModel, tract_data::TractResult};

/// The `ModelApi` describes the inputs and outputs for a model.
#[derive(Debug, Clone, Default)]
pub struct ModelApi {
    /// The named model inputs.
    pub inputs: Vec<(String, Vec<usize>)>,

    /// The named model outputs.
    pub outputs: Vec<(String, Vec<usize>)>,
}

fn clean_name(raw: &str) -> String {
    let name = raw.split(':').next().unwrap_or_default();
    name.strip_suffix("_0").unwrap_or(name).to_owned()
}

impl ModelApi {
    /// Extract the model API from the provided typed model.
    ///
    /// Dimensions that aren't concrete are left out of the shapes.
    pub fn for_typed_model(model: &TypedModel) -> TractResult<Self> {
        let mut inputs: Vec<(String, Vec<usize>)> = Default::default();

        for (idx, input_outlet) in model.input_outlets()?.iter().enumerate() {
            let node = model.node(input_outlet.node);
            let input_shape = &model.input_fact(idx)?.shape;

            inputs.push((
                clean_name(&node.name),
                input_shape
                    .iter()
                    .filter_map(|dim| dim.to_i64().map(|v| v as usize).ok())
                    .collect(),
            ));
        }

        let mut outputs: Vec<(String, Vec<usize>)> = Default::default();

        for (idx, output_outlet) in model.outputs.iter().enumerate() {
            let name = match model.outlet_labels.get(output_outlet) {
                Some(label) => clean_name(label),
                None => clean_name(&model.node(output_outlet.node).name),
            };

            let output_shape = &model.output_fact(idx)?.shape;
            let clean_shape = output_shape
                .iter()
                .filter_map(|dim| dim.to_i64().map(|v| v as usize).ok())
                .collect();

            outputs.push((name, clean_shape));
        }

        Ok(Self { outputs, inputs })
    }
}

#[cfg(test)]
mod tests {
    use super::clean_name;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("input_1:0"), "input_1");
        assert_eq!(clean_name("dense_0"), "dense");
        assert_eq!(clean_name("probabilities"), "probabilities");
    }
}
