use chrono::{Duration, NaiveDate, NaiveTime};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use noshow_core::AppointmentRecord;
use noshow_trainer::{ForestParams, ForestTrainer, LabeledDataset};

const SPECIALTIES: [&str; 6] = [
    "Cardiology",
    "Dermatology",
    "Oncology",
    "Pediatrics",
    "Neurology",
    "Ophthalmology",
];

fn synthetic_history(rows: usize) -> Vec<AppointmentRecord> {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    (0..rows)
        .map(|idx| {
            let hour = 8 + (idx * 7 % 10) as u32;
            let specialty = SPECIALTIES[idx * 13 % SPECIALTIES.len()];
            // Late afternoon slots and Mondays skew towards no-shows
            let absent = hour >= 15 || (idx * 31 % 5 == 0);
            AppointmentRecord::historical(
                idx as u64,
                specialty,
                base + Duration::days((idx % 180) as i64),
                NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                absent,
            )
        })
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest_fit");
    group.sample_size(10);

    for rows in [500usize, 2_000] {
        let dataset = LabeledDataset::from_records(&synthetic_history(rows)).unwrap();
        let trainer = ForestTrainer::new(ForestParams::default());

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &dataset, |b, dataset| {
            b.iter(|| trainer.fit(dataset).unwrap())
        });
    }

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let dataset = LabeledDataset::from_records(&synthetic_history(2_000)).unwrap();
    let forest = ForestTrainer::new(ForestParams::default()).fit(&dataset).unwrap();

    let mut group = c.benchmark_group("forest_scoring");
    group.throughput(Throughput::Elements(dataset.len() as u64));
    group.bench_function("predict_proba_fixed", |b| {
        b.iter(|| {
            dataset
                .features
                .iter()
                .map(|row| forest.predict_proba_fixed(row).unwrap())
                .sum::<i64>()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_fit, bench_scoring);
criterion_main!(benches);
