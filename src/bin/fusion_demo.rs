use moe_fusion::config::{self, OutputFormat, RuntimeConfig};
use moe_fusion::image::io::{load_rgb_image, write_json_file};
use moe_fusion::{ConfigError, FusionReport, MoeDetector};
use serde::Serialize;
use std::env;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoReport {
    single_view: FusionReport,
    tta: FusionReport,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), ConfigError> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "fusion_demo".to_string());
    let config = config::parse_cli(&program, args)?;

    let image = load_rgb_image(&config.input_path)?;
    let (gate, pool) = config.models.build()?;
    let detector = MoeDetector::new(Box::new(gate), pool, config.params.clone())?;

    let conf = config.params.conf_threshold;
    let iou = config.params.iou_threshold;
    let report = DemoReport {
        single_view: detector.moe_infer_with_diagnostics(&image, conf, iou)?,
        tta: detector.moe_infer_tta_with_diagnostics(&image, conf, iou)?,
    };

    if config.output.format.includes_text() {
        print_text_summary(&config, &report);
    }
    if config.output.format.includes_json() {
        write_json(&config, &report)?;
    }
    Ok(())
}

fn write_json(config: &RuntimeConfig, report: &DemoReport) -> Result<(), ConfigError> {
    match &config.output.json_out {
        Some(path) => {
            write_json_file(path, report)?;
            if config.output.format.includes_text() {
                println!("\nJSON report written to {}", path.display());
            } else {
                println!("JSON report written to {}", path.display());
            }
        }
        None => {
            let json = serde_json::to_string_pretty(report)?;
            if config.output.format == OutputFormat::Both {
                println!("\nJSON report:\n{json}");
            } else {
                println!("{json}");
            }
        }
    }
    Ok(())
}

fn print_text_summary(config: &RuntimeConfig, report: &DemoReport) {
    let input = &report.tta.trace.input;
    println!("Fusion summary");
    println!(
        "  input: {} ({}x{}x{})",
        config.input_path.display(),
        input.width,
        input.height,
        input.channels
    );
    println!(
        "  experts: {} views: {} conf_threshold: {:.3} iou_threshold: {:.3}",
        input.experts, input.views, config.params.conf_threshold, config.params.iou_threshold
    );

    print_section("Single view", &report.single_view);
    print_section("Test-time augmentation", &report.tta);
}

fn print_section(title: &str, report: &FusionReport) {
    let trace = &report.trace;
    println!("\n{title} ({:.3} ms)", trace.timings.total_ms);
    for view in &trace.views {
        let merge = &view.merge;
        println!(
            "  view {:<16} pooled={} kept={} suppressed={} elapsed_ms={:.3}",
            view.name,
            merge.pooled,
            merge.kept,
            merge.suppressed(),
            merge.elapsed_ms
        );
        for expert in &merge.experts {
            println!(
                "    expert[{}] {:<12} weight={:.3} raw={} passed={}",
                expert.index, expert.name, expert.weight, expert.raw, expert.passed
            );
        }
    }
    if let Some(wbf) = &trace.wbf {
        println!(
            "  wbf: inputs={} views={} clusters={} kept={} dropped={}",
            wbf.input_detections, wbf.contributing_views, wbf.clusters, wbf.kept, wbf.dropped
        );
    }
    if report.detections.is_empty() {
        println!("  detections: none");
    }
    for det in &report.detections {
        let b = &det.bbox;
        println!(
            "  label={} conf={:.3} box=[{:.1}, {:.1}, {:.1}, {:.1}]",
            det.label, det.confidence, b.x1, b.y1, b.x2, b.y2
        );
    }
}
