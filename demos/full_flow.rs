//! Full matching flow in process: keygen, enrollment, compare, claim.
//!
//! Run with: cargo run --release --features server --example full_flow

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use veilmatch::{
    claim_index, client_keygen, decrypt_scores, encrypt_vector, judge, run_compare, CkksContext,
    ProtocolParams, SchemeParams, CLAIM_CUTOFF,
};

fn main() -> eyre::Result<()> {
    let params = SchemeParams::matching_default();
    let protocol = ProtocolParams::default_128();
    println!(
        "Ring dimension: {}, slots: {}, levels: {}",
        params.ring_dim,
        params.slot_count(),
        params.levels()
    );

    let ctx = CkksContext::new(params)?;
    let mut rng = ChaCha20Rng::seed_from_u64(2024);

    println!("Generating keys...");
    let start = Instant::now();
    let (sk, bundle) = client_keygen(&ctx, &protocol, &mut rng);
    println!("  Done in {:?}", start.elapsed());

    let features: Vec<f64> = (0..protocol.dim)
        .map(|j| ((j * 29) % 13) as f64 / 2.0)
        .collect();

    println!("Encrypting template and sample...");
    let start = Instant::now();
    let template = encrypt_vector(&ctx, &bundle, &protocol, &features, &mut rng)?;
    let sample = encrypt_vector(&ctx, &bundle, &protocol, &features, &mut rng)?;
    println!("  Done in {:?}", start.elapsed());

    println!("\n=== Matching sample ===");
    let start = Instant::now();
    let outcome = run_compare(&ctx, &bundle, &protocol, &template, &sample, &mut rng)?;
    println!("  Compare: {:?}", start.elapsed());

    let scores = decrypt_scores(&ctx, &sk, &outcome.result)?;
    let claim = claim_index(&scores, CLAIM_CUTOFF);
    println!("  Claimed slot: {}", claim);
    println!("  {}", judge(&claim, &outcome.record).message());

    println!("\n=== Distant sample ===");
    let far: Vec<f64> = features.iter().map(|v| v + 2.0).collect();
    let sample = encrypt_vector(&ctx, &bundle, &protocol, &far, &mut rng)?;
    let start = Instant::now();
    let outcome = run_compare(&ctx, &bundle, &protocol, &template, &sample, &mut rng)?;
    println!("  Compare: {:?}", start.elapsed());

    let scores = decrypt_scores(&ctx, &sk, &outcome.result)?;
    let claim = claim_index(&scores, CLAIM_CUTOFF);
    println!("  Claimed slot: {}", claim);
    println!("  {}", judge(&claim, &outcome.record).message());

    Ok(())
}
