//! ONNX runtime for the exported seq2seq network.
//!
//! The trained Keras model is exported to ONNX (e.g. with `tf2onnx`) and run
//! through `tract`. Loading pins the input to `(1, seq_len, num_tags)`,
//! optimizes the graph once and checks that it produces
//! `pred_len * num_tags` values. Any mismatch is a
//! [`ForecastError::ModelLoad`].

use std::fmt;
use std::path::Path;

use tract_onnx::prelude::*;

use sensorcast_core::{Cancellation, ForecastError, ForecastResult, HorizonConfig};

use super::SequenceModel;
use crate::series::{NUM_TAGS, Row};

type Plan = TypedRunnableModel<TypedModel>;

/// An optimized, runnable ONNX graph with a fixed window and horizon.
pub struct OnnxModel {
    plan: Plan,
    seq_len: usize,
    output_len: usize,
}

impl fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxModel")
            .field("seq_len", &self.seq_len)
            .field("output_len", &self.output_len)
            .finish_non_exhaustive()
    }
}

impl OnnxModel {
    /// Pin, optimize and validate a parsed ONNX graph for `horizon`.
    pub fn from_graph(model: InferenceModel, horizon: &HorizonConfig) -> ForecastResult<Self> {
        let seq_len = horizon.seq_len();
        let output_len = horizon.pred_len() * NUM_TAGS;

        if model.inputs.len() != 1 || model.outputs.len() != 1 {
            return Err(ForecastError::model_load(format!(
                "expected one input and one output, graph has {} and {}",
                model.inputs.len(),
                model.outputs.len()
            )));
        }

        let typed = model
            .with_input_fact(0, f32::fact([1, seq_len, NUM_TAGS]).into())
            .and_then(|m| m.into_optimized())
            .map_err(|e| {
                ForecastError::model_load(format!("graph rejects input (1, {seq_len}, {NUM_TAGS}): {e:#}"))
            })?;

        let fact = typed
            .output_fact(0)
            .map_err(|e| ForecastError::model_load(format!("{e:#}")))?;
        if fact.datum_type != DatumType::F32 {
            return Err(ForecastError::model_load(format!(
                "output is {:?}, expected f32",
                fact.datum_type
            )));
        }
        let produced: usize = fact
            .shape
            .as_concrete()
            .map(|dims| dims.iter().product())
            .ok_or_else(|| ForecastError::model_load(format!("output shape {:?} is not concrete", fact.shape)))?;
        if produced != output_len {
            return Err(ForecastError::model_load(format!(
                "graph produces {produced} values, horizon needs {output_len} ({} rows x {NUM_TAGS})",
                horizon.pred_len()
            )));
        }

        let plan = typed
            .into_runnable()
            .map_err(|e| ForecastError::model_load(format!("{e:#}")))?;
        Ok(Self {
            plan,
            seq_len,
            output_len,
        })
    }
}

/// Parse the ONNX file at `path` and prepare it for `horizon`.
///
/// Every failure (missing file, corrupt protobuf, incompatible shapes) is a
/// [`ForecastError::ModelLoad`] naming the path.
pub fn load_model(path: impl AsRef<Path>, horizon: &HorizonConfig) -> ForecastResult<OnnxModel> {
    let path = path.as_ref();
    let graph = tract_onnx::onnx()
        .model_for_path(path)
        .map_err(|e| ForecastError::model_load(format!("{}: {e:#}", path.display())))?;
    OnnxModel::from_graph(graph, horizon).map_err(|e| match e {
        ForecastError::ModelLoad(msg) => ForecastError::model_load(format!("{}: {msg}", path.display())),
        other => other,
    })
}

impl SequenceModel for OnnxModel {
    fn input_shape(&self) -> (usize, usize) {
        (self.seq_len, NUM_TAGS)
    }

    fn output_len(&self) -> usize {
        self.output_len
    }

    fn predict(&self, window: &[Row], cancel: &Cancellation) -> ForecastResult<Vec<f64>> {
        if window.len() != self.seq_len {
            return Err(ForecastError::inference(format!(
                "window has {} rows, model expects {}",
                window.len(),
                self.seq_len
            )));
        }
        if cancel.is_cancelled() {
            return Err(ForecastError::DeadlineExceeded);
        }

        let flat: Vec<f32> = window.iter().flat_map(|row| row.iter().map(|&v| v as f32)).collect();
        let input = Tensor::from_shape(&[1, self.seq_len, NUM_TAGS], &flat)
            .map_err(|e| ForecastError::inference(format!("{e:#}")))?;

        // tract runs the graph to completion; the flag is re-checked once it returns.
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| ForecastError::inference(format!("{e:#}")))?;
        if cancel.is_cancelled() {
            return Err(ForecastError::DeadlineExceeded);
        }

        let output = outputs
            .first()
            .ok_or_else(|| ForecastError::inference("graph returned no output"))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| ForecastError::inference(format!("{e:#}")))?;
        Ok(view.iter().map(|&v| f64::from(v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tract_onnx::pb;

    fn value_info(name: &str, dims: Option<&[i64]>) -> pb::ValueInfoProto {
        use pb::tensor_shape_proto::{Dimension, dimension};
        let shape = dims.map(|dims| pb::TensorShapeProto {
            dim: dims
                .iter()
                .map(|&d| Dimension {
                    value: Some(dimension::Value::DimValue(d)),
                    ..Default::default()
                })
                .collect(),
        });
        pb::ValueInfoProto {
            name: name.to_string(),
            r#type: Some(pb::TypeProto {
                value: Some(pb::type_proto::Value::TensorType(pb::type_proto::Tensor {
                    elem_type: 1,
                    shape,
                })),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn initializer(name: &str, dims: &[i64], values: Vec<f32>) -> pb::TensorProto {
        pb::TensorProto {
            name: name.to_string(),
            dims: dims.to_vec(),
            data_type: 1,
            float_data: values,
            ..Default::default()
        }
    }

    fn node(op: &str, inputs: &[&str], output: &str) -> pb::NodeProto {
        pb::NodeProto {
            op_type: op.to_string(),
            name: output.to_string(),
            input: inputs.iter().map(|s| s.to_string()).collect(),
            output: vec![output.to_string()],
            ..Default::default()
        }
    }

    /// `input (1, seq, 3) -> Flatten -> MatMul(kernel) -> Add(bias) -> output`.
    fn dense_graph(seq_len: usize, out_len: usize, kernel: Vec<f32>, bias: Vec<f32>) -> InferenceModel {
        let rows = (seq_len * NUM_TAGS) as i64;
        let cols = out_len as i64;
        let proto = pb::ModelProto {
            ir_version: 7,
            opset_import: vec![pb::OperatorSetIdProto {
                domain: String::new(),
                version: 13,
            }],
            graph: Some(pb::GraphProto {
                name: "dense".to_string(),
                node: vec![
                    node("Flatten", &["input"], "flat"),
                    node("MatMul", &["flat", "kernel"], "projected"),
                    node("Add", &["projected", "bias"], "output"),
                ],
                initializer: vec![
                    initializer("kernel", &[rows, cols], kernel),
                    initializer("bias", &[cols], bias),
                ],
                input: vec![value_info("input", Some(&[1, seq_len as i64, NUM_TAGS as i64]))],
                output: vec![value_info("output", None)],
                ..Default::default()
            }),
            ..Default::default()
        };
        tract_onnx::onnx().model_for_proto_model(&proto).unwrap()
    }

    /// 6h grid, 1 day back and 1 day ahead: seq_len 4, pred_len 4.
    fn horizon() -> HorizonConfig {
        HorizonConfig::new(360, 1, 1).unwrap()
    }

    /// Repeats the last input row over the horizon.
    fn persistence_graph(seq_len: usize, pred_len: usize) -> InferenceModel {
        let (rows, cols) = (seq_len * NUM_TAGS, pred_len * NUM_TAGS);
        let mut kernel = vec![0.0f32; rows * cols];
        for step in 0..pred_len {
            for tag in 0..NUM_TAGS {
                kernel[((seq_len - 1) * NUM_TAGS + tag) * cols + step * NUM_TAGS + tag] = 1.0;
            }
        }
        dense_graph(seq_len, cols, kernel, vec![0.0; cols])
    }

    fn window() -> Vec<Row> {
        vec![[0.1, 0.2, 0.3], [0.2, 0.3, 0.4], [0.3, 0.4, 0.5], [0.4, 0.5, 0.6]]
    }

    #[test]
    fn runs_a_persistence_graph() {
        let model = OnnxModel::from_graph(persistence_graph(4, 4), &horizon()).unwrap();
        assert_eq!(model.input_shape(), (4, 3));
        assert_eq!(model.output_len(), 12);

        let out = model.predict(&window(), &Cancellation::new()).unwrap();
        assert_eq!(out.len(), 12);
        for row in out.chunks_exact(3) {
            for (got, want) in row.iter().zip([0.4, 0.5, 0.6]) {
                assert!((got - want).abs() < 1e-6, "{got} vs {want}");
            }
        }
    }

    #[test]
    fn bias_is_applied() {
        let bias: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let model = OnnxModel::from_graph(dense_graph(4, 12, vec![0.0; 144], bias), &horizon()).unwrap();
        let out = model.predict(&window(), &Cancellation::new()).unwrap();
        assert_eq!(out, (0..12).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn output_size_must_match_the_horizon() {
        let err = OnnxModel::from_graph(dense_graph(4, 6, vec![0.0; 72], vec![0.0; 6]), &horizon()).unwrap_err();
        match err {
            ForecastError::ModelLoad(msg) => assert!(msg.contains("produces 6 values"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lookback_must_match_the_horizon() {
        // Graph built for 2 input rows, horizon feeds 4.
        let err = OnnxModel::from_graph(persistence_graph(2, 4), &horizon()).unwrap_err();
        assert!(matches!(err, ForecastError::ModelLoad(_)), "{err:?}");
    }

    #[test]
    fn short_window_is_an_inference_error() {
        let model = OnnxModel::from_graph(persistence_graph(4, 4), &horizon()).unwrap();
        let err = model.predict(&window()[1..], &Cancellation::new()).unwrap_err();
        assert!(matches!(err, ForecastError::Inference(_)));
    }

    #[test]
    fn cancelled_inference_does_not_run() {
        let model = OnnxModel::from_graph(persistence_graph(4, 4), &horizon()).unwrap();
        let cancel = Cancellation::new();
        cancel.cancel();
        let err = model.predict(&window(), &cancel).unwrap_err();
        assert!(matches!(err, ForecastError::DeadlineExceeded));
    }

    #[test]
    fn missing_and_corrupt_files_are_model_load_errors() {
        let err = load_model("/no/such/model.onnx", &horizon()).unwrap_err();
        assert!(matches!(err, ForecastError::ModelLoad(ref msg) if msg.contains("/no/such/model.onnx")));

        let path = std::env::temp_dir().join(format!("sensorcast-corrupt-{}.onnx", std::process::id()));
        std::fs::write(&path, b"not a protobuf").unwrap();
        let err = load_model(&path, &horizon());
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err.unwrap_err(), ForecastError::ModelLoad(_)));
    }
}
