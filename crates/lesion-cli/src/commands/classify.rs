use super::ModelArgs;
use crate::fetch::{Fetch, HttpFetcher};
use anyhow::{Context, Result};
use clap::Parser;
use lesion_core::{preprocess, rank, ModelKind};
use std::time::{Duration, Instant};

/// Classify a single image.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct Args {
    /// The model kind - skin, invasive or meta.
    kind: ModelKind,

    /// An http(s) URL or a local image file.
    source: String,

    #[clap(flatten)]
    models: ModelArgs,

    /// Largest image accepted, in bytes.
    #[clap(long, default_value = "20971520")]
    max_image_bytes: u64,
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

pub(super) fn classify(config: Args) -> Result<()> {
    let start = Instant::now();
    let bytes = if is_url(&config.source) {
        HttpFetcher::new(None, config.max_image_bytes).fetch(&config.source)?
    } else {
        std::fs::read(&config.source).with_context(|| format!("reading {:?}", config.source))?
    };
    let fetched = start.elapsed();

    let pipeline = config.models.pipeline();
    let descriptor = pipeline.registry().get(config.kind);

    let start = Instant::now();
    let tensor = preprocess(&bytes, descriptor)?;
    let preprocessed = start.elapsed();

    let start = Instant::now();
    let classifier = pipeline.store().get(descriptor)?;
    let loaded = start.elapsed();

    let start = Instant::now();
    let probabilities = classifier.run(tensor)?;
    let inferred = start.elapsed();

    let predictions = rank(&probabilities, &descriptor.labels, descriptor.cutoff);
    println!("{}", serde_json::to_string_pretty(&predictions)?);

    println!(
        "Fetched {} bytes in {:.2} ms, preprocessed in {:.2} ms, loaded in {:.2} ms, inferred in {:.2} ms",
        bytes.len(),
        millis(fetched),
        millis(preprocessed),
        millis(loaded),
        millis(inferred),
    );

    Ok(())
}
