use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use veilmatch::params::{ProtocolParams, SchemeParams};
use veilmatch::protocol::distance::encrypted_distance;
use veilmatch::protocol::indicator::{normalize, sign_refine, to_indicator};
use veilmatch::protocol::{client_keygen, decrypt_scores, encrypt_vector, run_compare};
use veilmatch::CkksContext;

fn pipeline_benchmark(c: &mut Criterion) {
    let ctx = CkksContext::new(SchemeParams::matching_default()).unwrap();
    let protocol = ProtocolParams::default_128();
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let (sk, bundle) = client_keygen(&ctx, &protocol, &mut rng);

    let features: Vec<f64> = (0..128).map(|j| ((j * 11) % 19) as f64).collect();
    let template = encrypt_vector(&ctx, &bundle, &protocol, &features, &mut rng).unwrap();
    let sample = encrypt_vector(&ctx, &bundle, &protocol, &features, &mut rng).unwrap();

    let mut group = c.benchmark_group("compare");

    group.bench_function("encrypt_vector", |b| {
        b.iter(|| encrypt_vector(&ctx, &bundle, &protocol, &features, &mut rng).unwrap())
    });

    group.bench_function("distance", |b| {
        b.iter(|| {
            encrypted_distance(&ctx, &bundle, &protocol, &template.ct, &sample.ct).unwrap()
        })
    });

    let dist = encrypted_distance(&ctx, &bundle, &protocol, &template.ct, &sample.ct).unwrap();
    group.bench_function("indicator", |b| {
        b.iter(|| {
            let x = normalize(&ctx, &dist, &protocol).unwrap();
            let y = sign_refine(&ctx, &x, &bundle.relin).unwrap();
            to_indicator(&ctx, &y).unwrap()
        })
    });

    group.bench_function("full_compare", |b| {
        b.iter(|| run_compare(&ctx, &bundle, &protocol, &template, &sample, &mut rng).unwrap())
    });

    let outcome = run_compare(&ctx, &bundle, &protocol, &template, &sample, &mut rng).unwrap();
    group.bench_function("decrypt_scores", |b| {
        b.iter(|| decrypt_scores(&ctx, &sk, &outcome.result).unwrap())
    });

    group.finish();
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
