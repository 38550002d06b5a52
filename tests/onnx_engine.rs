#![cfg(feature = "onnx")]

use glosscast::defaults::WINDOW_FRAMES;
use glosscast::{
    Config, InferenceEngine, OnnxConfig, OnnxEngine, PredictionRanker,
    ProcessedFrame, TensorAssembler,
};
use std::path::PathBuf;
use std::sync::Arc;

fn find_model() -> Option<PathBuf> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(glosscast::defaults::MODEL_PATH);
    if path.exists() {
        Some(path)
    } else {
        eprintln!(
            "no sign recognition model at {}, skipping ONNX tests",
            path.display()
        );
        None
    }
}

#[test]
fn gray_clip_runs_through_real_model() {
    let Some(model_path) = find_model() else {
        return;
    };
    let engine = OnnxEngine::load(OnnxConfig {
        model_path,
        ..OnnxConfig::default()
    })
    .unwrap();

    let frames: Vec<Arc<ProcessedFrame>> = (0..WINDOW_FRAMES)
        .map(|_| Arc::new(ProcessedFrame::filled(0.0)))
        .collect();
    let input = TensorAssembler::new().build(&frames).unwrap();
    let output = engine.run(&input).unwrap();
    assert!(output.ndim() >= 2);
    assert_eq!(output.shape()[0], 1);

    let classes = output.shape()[1];
    let table = Config::default().gloss_table(Some(classes));
    let predictions = PredictionRanker::default().rank(&output, &table).unwrap();
    assert_eq!(predictions.len(), 5.min(classes));
    let scores: Vec<f32> = predictions.iter().map(|p| p.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn missing_model_fails_to_load() {
    let result = OnnxEngine::load(OnnxConfig {
        model_path: PathBuf::from("/nonexistent/glosscast/model.onnx"),
        ..OnnxConfig::default()
    });
    assert!(matches!(result, Err(glosscast::GlossError::ModelLoad { .. })));
}
