//! Single-record pipeline latency

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feature_engine::{MeasurementRecord, Sex};
use inference_engine::{AgePipeline, ArtifactBundle, ArtifactPaths};
use std::path::Path;
use std::sync::Arc;

fn bench_predict(c: &mut Criterion) {
    let base = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let paths = ArtifactPaths::from_base_dir(base, "model.json");
    let bundle = ArtifactBundle::load_paths(&paths).expect("fixture artifacts");
    let pipeline = AgePipeline::new(Arc::new(bundle));

    let record = MeasurementRecord {
        sex: Sex::Male,
        length: 0.455,
        diameter: 0.365,
        height: 0.095,
        whole_weight: 0.514,
        shucked_weight: 0.2245,
        viscera_weight: 0.101,
        shell_weight: 0.15,
    };

    c.bench_function("pipeline_predict", |b| {
        b.iter(|| pipeline.predict(black_box(&record)))
    });

    c.bench_function("pipeline_preprocess", |b| {
        b.iter(|| pipeline.preprocess(black_box(&record)))
    });
}

criterion_group!(benches, bench_predict);
criterion_main!(benches);
