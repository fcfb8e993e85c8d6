use lesion_core::{preprocess, Classifier};
use prost::Message;
use std::path::Path;
use tract_onnx::pb::{
    self,
    attribute_proto::AttributeType,
    tensor_proto::DataType,
    tensor_shape_proto::{dimension::Value as Dim, Dimension},
    type_proto::{Tensor, Value},
};

#[path = "./helpers.rs"]
mod helpers;

fn dim(value: Dim) -> Dimension {
    Dimension {
        value: Some(value),
        ..Default::default()
    }
}

fn ints(name: &str, ints: Vec<i64>) -> pb::AttributeProto {
    pb::AttributeProto {
        name: name.to_owned(),
        r#type: AttributeType::Ints as i32,
        ints,
        ..Default::default()
    }
}

fn int(name: &str, i: i64) -> pb::AttributeProto {
    pb::AttributeProto {
        name: name.to_owned(),
        r#type: AttributeType::Int as i32,
        i,
        ..Default::default()
    }
}

/// Channel classifier as ONNX: ReduceSum over height and width, then Softmax.
fn channel_model(batch: Dim) -> pb::ModelProto {
    let input = pb::ValueInfoProto {
        name: "input_1".to_owned(),
        r#type: Some(pb::TypeProto {
            value: Some(Value::TensorType(Tensor {
                elem_type: DataType::Float as i32,
                shape: Some(pb::TensorShapeProto {
                    dim: vec![
                        dim(batch),
                        dim(Dim::DimValue(4)),
                        dim(Dim::DimValue(4)),
                        dim(Dim::DimValue(3)),
                    ],
                }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    };

    let reduce = pb::NodeProto {
        name: "reduce".to_owned(),
        op_type: "ReduceSum".to_owned(),
        input: vec!["input_1".to_owned()],
        output: vec!["summed".to_owned()],
        attribute: vec![ints("axes", vec![1, 2]), int("keepdims", 0)],
        ..Default::default()
    };

    let softmax = pb::NodeProto {
        name: "softmax".to_owned(),
        op_type: "Softmax".to_owned(),
        input: vec!["summed".to_owned()],
        output: vec!["probs".to_owned()],
        attribute: vec![int("axis", 1)],
        ..Default::default()
    };

    pb::ModelProto {
        ir_version: 6,
        opset_import: vec![pb::OperatorSetIdProto {
            domain: String::new(),
            version: 11,
        }],
        graph: Some(pb::GraphProto {
            name: "channels".to_owned(),
            node: vec![reduce, softmax],
            input: vec![input],
            output: vec![pb::ValueInfoProto {
                name: "probs".to_owned(),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn write_model(dir: &Path, model: &pb::ModelProto) {
    std::fs::write(dir.join("model.onnx"), model.encode_to_vec()).unwrap();
}

#[test]
fn test_onnx_fixed_and_symbolic_batch() {
    for batch in [Dim::DimValue(1), Dim::DimParam("N".to_owned())] {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), &channel_model(batch.clone()));
        let descriptor = helpers::channel_descriptor(dir.path());

        let classifier = Classifier::load(&descriptor).unwrap();
        assert_eq!(classifier.path(), dir.path().join("model.onnx"));
        assert_eq!(classifier.input_shapes()[0].0, "input_1");
        assert_eq!(classifier.input_shapes()[0].1, vec![1, 4, 4, 3]);
        assert_eq!(classifier.output_shapes()[0].0, "probs");
        assert_eq!(classifier.output_shapes()[0].1, vec![1, 3]);

        let tensor = preprocess(&helpers::png(6, 5, [0, 255, 0]), &descriptor).unwrap();
        let probabilities = classifier.run(tensor).unwrap();

        assert_eq!(probabilities.len(), 3, "batch {:?}", batch);
        assert!(probabilities[1] > 0.99);
        assert!(probabilities[0] < 1e-6 && probabilities[2] < 1e-6);
    }
}

#[test]
fn test_onnx_declared_shape_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), &channel_model(Dim::DimValue(2)));

    match Classifier::load(&helpers::channel_descriptor(dir.path())) {
        Err(lesion_core::LesionError::ShapeMismatch { expected, found }) => {
            assert_eq!(expected, vec![1, 4, 4, 3]);
            assert_eq!(found, vec![2, 4, 4, 3]);
        }
        other => panic!("expected shape mismatch, got {:?}", other),
    }
}
