use moe_fusion::image::ImageF32;
use moe_fusion::models::{ExpertPool, FixedExpert, FixedGate, GateWeights};
use moe_fusion::{BBox, Detection, FusionParams, MoeDetector};

fn main() {
    // Demo stub: two constant experts on a blank RGB frame
    let image = ImageF32::new(640, 480, 3);
    let day = FixedExpert::new(
        "day",
        vec![Detection::new(BBox::new(10.0, 10.0, 50.0, 50.0), 0.9, 0)],
    );
    let night = FixedExpert::new(
        "night",
        vec![Detection::new(BBox::new(12.0, 12.0, 48.0, 48.0), 0.95, 0)],
    );

    let run = || -> moe_fusion::Result<()> {
        let pool = ExpertPool::new(vec![Box::new(day), Box::new(night)])?;
        let gate = FixedGate::new(GateWeights::new(vec![0.8, 0.2])?);
        let detector = MoeDetector::new(Box::new(gate), pool, FusionParams::default())?;
        let single = detector.moe_infer(&image, 0.3, 0.1)?;
        let fused = detector.moe_infer_tta(&image, 0.3, 0.1)?;
        println!("single_view={} tta={}", single.len(), fused.len());
        Ok(())
    };
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
