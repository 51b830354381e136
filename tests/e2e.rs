mod common;

use common::models::{BrokenGate, CountingGate};
use moe_fusion::image::ImageF32;
use moe_fusion::models::{ExpertPool, FixedExpert, FixedGate, GateWeights};
use moe_fusion::stages::SuppressionMode;
use moe_fusion::{BBox, Detection, FusionError, FusionParams, MoeDetector, Pixel};

fn det(x1: f32, y1: f32, x2: f32, y2: f32, conf: f32, label: u32) -> Detection<Pixel> {
    Detection::new(BBox::new(x1, y1, x2, y2), conf, label)
}

fn frame() -> ImageF32 {
    ImageF32::new(128, 96, 3)
}

fn detector(weights: &[f32], experts: Vec<FixedExpert>, params: FusionParams) -> MoeDetector {
    let pool = ExpertPool::new(
        experts
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn moe_fusion::models::ExpertDetector>)
            .collect(),
    )
    .expect("non-empty pool");
    let gate = FixedGate::new(GateWeights::new(weights.to_vec()).expect("valid weights"));
    MoeDetector::new(Box::new(gate), pool, params).expect("valid detector")
}

#[test]
fn two_expert_scenario_keeps_the_trusted_box() {
    let _ = env_logger::builder().is_test(true).try_init();
    let detector = detector(
        &[0.8, 0.2],
        vec![
            FixedExpert::new("a", vec![det(10.0, 10.0, 50.0, 50.0, 0.9, 0)]),
            FixedExpert::new("b", vec![det(12.0, 12.0, 48.0, 48.0, 0.95, 0)]),
        ],
        FusionParams::default(),
    );

    let fused = detector
        .moe_infer(&frame(), 0.3, 0.1)
        .expect("inference succeeds");

    assert_eq!(fused.len(), 1, "expected a single detection, got {fused:?}");
    assert_eq!(fused[0].bbox.to_array(), [10.0, 10.0, 50.0, 50.0]);
    assert!(
        (fused[0].confidence - 0.72).abs() < 1e-5,
        "confidence={}",
        fused[0].confidence
    );
    assert_eq!(fused[0].label, 0);
}

#[test]
fn overlapping_experts_are_suppressed_to_the_strongest() {
    let detector = detector(
        &[0.5, 0.5],
        vec![
            FixedExpert::new("a", vec![det(10.0, 10.0, 50.0, 50.0, 0.9, 0)]),
            FixedExpert::new("b", vec![det(12.0, 12.0, 48.0, 48.0, 0.95, 0)]),
        ],
        FusionParams::default(),
    );
    let fused = detector.moe_infer(&frame(), 0.3, 0.5).unwrap();
    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].bbox.to_array(), [12.0, 12.0, 48.0, 48.0]);
    assert!((fused[0].confidence - 0.475).abs() < 1e-5);
}

#[test]
fn per_class_suppression_keeps_other_labels() {
    let experts = vec![
        FixedExpert::new("a", vec![det(10.0, 10.0, 50.0, 50.0, 0.9, 0)]),
        FixedExpert::new("b", vec![det(12.0, 12.0, 48.0, 48.0, 0.95, 1)]),
    ];
    let agnostic = detector(&[0.5, 0.5], experts.clone(), FusionParams::default());
    let per_class = detector(
        &[0.5, 0.5],
        experts,
        FusionParams {
            suppression: SuppressionMode::PerClass,
            ..Default::default()
        },
    );
    assert_eq!(agnostic.moe_infer(&frame(), 0.3, 0.5).unwrap().len(), 1);
    assert_eq!(per_class.moe_infer(&frame(), 0.3, 0.5).unwrap().len(), 2);
}

#[test]
fn experts_without_detections_give_an_empty_result() {
    let detector = detector(
        &[0.5, 0.5],
        vec![FixedExpert::empty("a"), FixedExpert::empty("b")],
        FusionParams::default(),
    );
    assert!(detector.moe_infer(&frame(), 0.3, 0.5).unwrap().is_empty());
}

#[test]
fn empty_expert_pool_is_rejected() {
    assert!(matches!(
        ExpertPool::new(Vec::new()),
        Err(FusionError::Configuration(_))
    ));
}

#[test]
fn malformed_expert_output_fails_the_call() {
    let detector = detector(
        &[1.0],
        vec![FixedExpert::new("bad", vec![det(10.0, 10.0, 50.0, 50.0, 1.5, 0)])],
        FusionParams::default(),
    );
    assert!(matches!(
        detector.moe_infer(&frame(), 0.3, 0.5),
        Err(FusionError::MalformedDetection { .. })
    ));
}

#[test]
fn gate_failure_propagates() {
    let pool = ExpertPool::new(vec![Box::new(FixedExpert::empty("a"))]).unwrap();
    let detector = MoeDetector::new(Box::new(BrokenGate), pool, FusionParams::default()).unwrap();
    assert!(matches!(
        detector.moe_infer(&frame(), 0.3, 0.5),
        Err(FusionError::Inference { .. })
    ));
}

#[test]
fn thresholds_are_validated_per_call() {
    let detector = detector(&[1.0], vec![FixedExpert::empty("a")], FusionParams::default());
    assert!(matches!(
        detector.moe_infer(&frame(), 1.3, 0.5),
        Err(FusionError::Configuration(_))
    ));
    assert!(matches!(
        detector.moe_infer_tta(&frame(), 0.3, -0.5),
        Err(FusionError::Configuration(_))
    ));
}

#[test]
fn single_view_report_describes_the_merge() {
    let (gate, calls) = CountingGate::new(vec![0.8, 0.2]);
    let pool = ExpertPool::new(vec![
        Box::new(FixedExpert::new("a", vec![det(10.0, 10.0, 50.0, 50.0, 0.9, 0)])),
        Box::new(FixedExpert::new("b", vec![det(12.0, 12.0, 48.0, 48.0, 0.95, 0)])),
    ])
    .unwrap();
    let detector = MoeDetector::new(Box::new(gate), pool, FusionParams::default()).unwrap();

    let report = detector
        .moe_infer_with_diagnostics(&frame(), 0.3, 0.1)
        .unwrap();

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(report.detections.len(), 1);
    assert!(report.trace.wbf.is_none());
    assert_eq!(report.trace.views.len(), 1);
    let merge = &report.trace.views[0].merge;
    assert_eq!(merge.gate_weights, vec![0.8, 0.2]);
    assert_eq!(merge.experts[1].name, "b");
    assert_eq!(merge.experts[1].raw, 1);
    assert_eq!(merge.experts[1].passed, 0);
    assert_eq!(report.trace.input.experts, 2);

    let json = serde_json::to_value(&report).expect("report serializes");
    assert_eq!(json["trace"]["views"][0]["merge"]["pooled"], 1);
    assert_eq!(json["detections"][0]["box"]["x1"], 10.0);
}

#[test]
fn detect_uses_configured_thresholds() {
    let params = FusionParams {
        conf_threshold: 0.5,
        iou_threshold: 0.1,
        ..Default::default()
    };
    let detector = detector(
        &[1.0],
        vec![FixedExpert::new(
            "a",
            vec![det(10.0, 10.0, 50.0, 50.0, 0.9, 0), det(60.0, 40.0, 90.0, 80.0, 0.45, 1)],
        )],
        params,
    );
    let found = detector.detect(&frame()).unwrap();
    assert_eq!(found, detector.moe_infer(&frame(), 0.5, 0.1).unwrap());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].label, 0);
}

#[test]
fn channelless_image_is_rejected() {
    let detector = detector(&[1.0], vec![FixedExpert::empty("a")], FusionParams::default());
    assert!(matches!(
        detector.moe_infer(&ImageF32::new(128, 96, 0), 0.3, 0.5),
        Err(FusionError::Configuration(_))
    ));
}
