use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use fracture_scan::model_manager::{check_model_file, ModelRequest};
use fracture_scan::{
    Classifier, ModelManager, Prediction, Report, ReportFormat, ResizeFilter,
    RuntimeConfig, Verdict,
};
use log::info;

#[derive(Parser)]
#[command(author, version, about = "Screen an X-ray image for bone fractures", long_about = None)]
struct Args {
    /// X-ray image to classify (PNG, JPEG, ...)
    image: PathBuf,

    /// Path to the ONNX model; defaults to the cached model named by --model-name
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Name of the model in the local cache
    #[arg(long, default_value = "bone-fracture")]
    model_name: String,

    /// Download the model from this URL if it is not cached
    #[arg(long, requires = "model_sha256")]
    model_url: Option<String>,

    /// Expected SHA-256 of the model file
    #[arg(long)]
    model_sha256: Option<String>,

    /// Force a fresh download of the model file
    #[arg(short, long, requires = "model_url")]
    fresh: bool,

    /// Decision threshold on the raw score, strictly between 0 and 1
    #[arg(short, long, env = "FRACTURE_SCAN_THRESHOLD", default_value_t = 0.5)]
    threshold: f32,

    /// Interpolation used to resize to 224x224 (nearest, bilinear, bicubic)
    #[arg(long, default_value = "bicubic")]
    resize_filter: ResizeFilter,

    /// Intra-op threads for ONNX Runtime (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Write a report to this path
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Report format (text or json)
    #[arg(long, default_value = "text")]
    report_format: ReportFormat,
}

async fn resolve_model(args: &Args) -> anyhow::Result<PathBuf> {
    if let Some(path) = &args.model {
        check_model_file(path, args.model_sha256.as_deref())
            .with_context(|| format!("Model {} failed its integrity check", path.display()))?;
        return Ok(path.clone());
    }

    let manager = ModelManager::new_default().context("Failed to create model cache directory")?;
    let request = ModelRequest {
        name: args.model_name.clone(),
        url: args.model_url.clone(),
        sha256: args.model_sha256.clone(),
        fresh: args.fresh,
    };

    manager.resolve(&request).await.with_context(|| match &request.url {
        Some(url) => format!("Failed to fetch model from {}", url),
        None => format!(
            "No usable model; pass --model or --model-url with --model-sha256 (cache: {})",
            manager.models_dir().display()
        ),
    })
}

fn print_prediction(prediction: &Prediction) {
    let status = match prediction.verdict {
        Verdict::Fractured => "Fracture detected",
        Verdict::Normal => "No fracture detected",
    };
    println!("\nPrediction Result:");
    println!("  Status:     {}", prediction.verdict);
    println!("  Confidence: {:.2}%", prediction.confidence);
    println!("  {}", status);
    println!("\nThis is a screening aid, NOT a medical diagnosis.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fracture_scan::init_logger();
    let args = Args::parse();

    info!("=== Bone Fracture Screening ===");

    let model_path = resolve_model(&args).await?;

    let start_time = Instant::now();
    info!("Loading model from {}...", model_path.display());

    let runtime_config = RuntimeConfig {
        intra_threads: args.threads,
        ..RuntimeConfig::default()
    };

    // Load once; the classifier owns the model for the rest of the process
    let classifier = Classifier::builder()
        .with_runtime_config(runtime_config)
        .with_resize_filter(args.resize_filter)
        .with_threshold(args.threshold)?
        .with_model_file(&model_path)?
        .build()?;
    info!("Model loaded (took {:.2?})", start_time.elapsed());

    let classify_start = Instant::now();
    let prediction = classifier
        .classify_file(&args.image)
        .with_context(|| format!("Failed to classify {}", args.image.display()))?;
    info!("Classification took {:.2?}", classify_start.elapsed());

    print_prediction(&prediction);

    if let Some(path) = &args.report {
        Report::new(&prediction)
            .with_threshold(classifier.threshold)
            .write_to(path, args.report_format)?;
        println!("\nReport saved to {}", path.display());
    }

    Ok(())
}
