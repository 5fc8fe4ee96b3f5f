//! # Fingerprint Benchmarks
//!
//! Hashing cost per record kind and the cost of a full public verification
//! (lookup, recompute, compare) as the ledger grows.

use chrono::{NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use provenance_ledger::{
    compute_fingerprint, CanonicalPayload, CropType, FixedClock, FixedPoint,
    InMemoryRecordStore, LedgerConfig, NewCrop, ProvenanceLedger, Salt, SeededEntropy,
    SupplyChainApi, VerificationApi,
};
use shared_bus::NoopPublisher;
use shared_types::{CallerIdentity, RecordKind};
use std::sync::Arc;

fn crop_payload(name: &str) -> CanonicalPayload {
    CanonicalPayload::new(RecordKind::Crop)
        .required("owner", "farm-north")
        .required("crop_name", name)
        .required("crop_type", "grain")
        .required("quantity", FixedPoint::from_units(500).unwrap_or_default())
        .required("price_per_unit", FixedPoint::from_milli(2_500))
        .optional("sowing_date", NaiveDate::from_ymd_opt(2024, 9, 1))
        .optional("harvest_date", NaiveDate::from_ymd_opt(2025, 1, 10))
        .required("batch_number", "BATCH-K3M9Q2ZX-20250115")
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint-compute");
    let salt = Salt::new(
        Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap(),
        "q7w2e9r1t5y00",
    );

    for name_len in [8usize, 64, 512] {
        let payload = crop_payload(&"r".repeat(name_len));
        group.throughput(Throughput::Bytes(payload.canonical_string().len() as u64));
        group.bench_with_input(BenchmarkId::new("crop", name_len), &payload, |b, payload| {
            b.iter(|| black_box(compute_fingerprint(payload, &salt)))
        });
    }

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("fingerprint-verify");

    for ledger_size in [100usize, 1_000, 10_000] {
        let ledger = ProvenanceLedger::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(FixedClock::new(Utc::now())),
            Arc::new(SeededEntropy::new(ledger_size as u64)),
            Arc::new(NoopPublisher::default()),
            LedgerConfig::default(),
        )
        .unwrap();
        let farmer = CallerIdentity::farmer("farm-north");

        let tokens: Vec<String> = runtime.block_on(async {
            let mut tokens = Vec::with_capacity(ledger_size);
            for i in 0..ledger_size {
                let crop = ledger
                    .ledger()
                    .register_crop(
                        &farmer,
                        NewCrop {
                            crop_name: format!("Lot {i}"),
                            crop_type: CropType::Grain,
                            quantity: FixedPoint::from_units(100).unwrap(),
                            price_per_unit: FixedPoint::from_milli(1_250),
                            sowing_date: None,
                            harvest_date: None,
                        },
                    )
                    .await
                    .unwrap();
                tokens.push(crop.seal.fingerprint.to_hex());
            }
            tokens
        });

        group.bench_with_input(
            BenchmarkId::new("by_fingerprint", ledger_size),
            &tokens,
            |b, tokens| {
                let mut i = 0;
                b.iter(|| {
                    i = (i + 1) % tokens.len();
                    runtime.block_on(ledger.verification().verify(&tokens[i]))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compute, bench_verify);
criterion_main!(benches);
