//! veilmatch-keygen: client keyset generation CLI
//!
//! Generates a secret key with its public context bundle (public key,
//! relinearization keys, rotation keys covering the compare pipeline)
//! and writes both to disk, ready to upload and to decrypt results with.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use veilmatch::ckks::generate_keys;
use veilmatch::params::{ProtocolParams, SchemeParams};
use veilmatch::protocol::compare_plan;
use veilmatch::CkksContext;

#[derive(Parser)]
#[command(name = "veilmatch-keygen")]
#[command(about = "Generate a client keyset for encrypted matching")]
#[command(version)]
struct Args {
    /// Output directory for the keyset
    #[arg(long, default_value = "veilmatch_keys")]
    output_dir: PathBuf,

    /// Random seed for deterministic key generation (optional)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("veilmatch keygen");
    info!("Output directory: {}", args.output_dir.display());

    let params = SchemeParams::matching_default();
    let protocol = ProtocolParams::default_128();
    let ctx = CkksContext::new(params.clone())
        .map_err(|e| eyre::eyre!("Invalid parameters: {}", e))?;

    let seed = args.seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64
    });
    info!("Seed: {}", seed);
    let mut rng = ChaCha20Rng::seed_from_u64(seed);

    let plan = compare_plan(&protocol);
    info!(
        "Generating keys: {} relinearization levels, {} rotation pairs...",
        ctx.levels(),
        plan.pairs.len()
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Generating keyset...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let gen_start = Instant::now();
    let (sk, bundle) = generate_keys(&ctx, &plan, &mut rng);
    pb.finish_with_message("Keyset generated");
    info!("Generation time: {:.2?}", gen_start.elapsed());

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            args.output_dir.display()
        )
    })?;

    info!("Saving secret key (keep this secure!)...");
    let sk_path = args.output_dir.join("secret_key.bin");
    let sk_file = File::create(&sk_path)
        .with_context(|| format!("Failed to create secret key file: {}", sk_path.display()))?;
    let mut writer = BufWriter::new(sk_file);
    bincode::serialize_into(&mut writer, &sk).with_context(|| "Failed to serialize secret key")?;
    writer.flush()?;
    let sk_size = fs::metadata(&sk_path)?.len();
    info!("Secret key saved: {:.2} KB", sk_size as f64 / 1024.0);

    info!("Saving public context bundle...");
    let ctx_path = args.output_dir.join("context.bin");
    let ctx_file = File::create(&ctx_path)
        .with_context(|| format!("Failed to create context file: {}", ctx_path.display()))?;
    let mut writer = BufWriter::new(ctx_file);
    bincode::serialize_into(&mut writer, &bundle)
        .with_context(|| "Failed to serialize context bundle")?;
    writer.flush()?;
    let ctx_size = fs::metadata(&ctx_path)?.len();
    info!("Context saved: {:.2} MB", ctx_size as f64 / (1024.0 * 1024.0));

    save_summary(&args.output_dir, &params, &protocol, &ctx, seed)?;

    println!();
    println!("=== Keygen Complete ===");
    println!("Output directory: {}", args.output_dir.display());
    println!("Ring dimension: {}", params.ring_dim);
    println!("Slots: {}", ctx.slot_count());
    println!("Levels: {}", ctx.levels());
    println!("Secret key: {:.2} KB", sk_size as f64 / 1024.0);
    println!("Context bundle: {:.2} MB", ctx_size as f64 / (1024.0 * 1024.0));
    println!();
    println!("Upload context.bin as the 'key' blob; never share secret_key.bin.");

    Ok(())
}

fn save_summary(
    output_dir: &PathBuf,
    params: &SchemeParams,
    protocol: &ProtocolParams,
    ctx: &CkksContext,
    seed: u64,
) -> Result<()> {
    #[derive(Serialize)]
    struct KeysetSummary {
        version: String,
        ring_dim: usize,
        slots: usize,
        levels: usize,
        scale_bits: u32,
        dim: usize,
        threshold: f64,
        context_id: String,
        seed: u64,
    }

    let summary = KeysetSummary {
        version: env!("CARGO_PKG_VERSION").to_string(),
        ring_dim: params.ring_dim,
        slots: ctx.slot_count(),
        levels: ctx.levels(),
        scale_bits: params.scale_bits,
        dim: protocol.dim,
        threshold: protocol.threshold,
        context_id: format!("{:#018x}", ctx.context_id()),
        seed,
    };

    let path = output_dir.join("keyset.json");
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, &summary)?;

    info!("Keyset summary saved to {}", path.display());
    Ok(())
}
