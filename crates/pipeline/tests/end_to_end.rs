//! End-to-end train and predict runs through the public pipeline API

use std::io::Write;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use noshow_core::{
    AppointmentRecord, FeatureEncoder, ModelSelector, NoShowError, RiskCategory, TrainedModel,
};
use noshow_pipeline::{
    predict_pending, train, AppointmentSource, CsvAppointmentSource, InMemorySource, NoShowTrainer, Predictor,
};
use noshow_store::{FsModelStore, InMemoryModelStore, ModelStore};
use noshow_trainer::ForestParams;
use proptest::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 1, 8)
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 7, 0, 0).unwrap()
}

/// Two Monday 09:00 Cardiology rows and two Friday 14:00 Dermatology rows,
/// one no-show each
fn scenario_history() -> Vec<AppointmentRecord> {
    vec![
        AppointmentRecord::historical(1, "Cardiology", date(2024, 1, 1), time(9), false),
        AppointmentRecord::historical(2, "Cardiology", date(2024, 1, 1), time(9), true),
        AppointmentRecord::historical(3, "Dermatology", date(2024, 1, 5), time(14), false),
        AppointmentRecord::historical(4, "Dermatology", date(2024, 1, 5), time(14), true),
    ]
}

/// Wednesday 11:00 Oncology: no training column is realised
fn scenario_pending() -> Vec<AppointmentRecord> {
    vec![AppointmentRecord::pending(5, "Oncology", date(2024, 1, 10), time(11))]
}

fn scenario_model() -> TrainedModel {
    let store = InMemoryModelStore::new();
    train(&store, ForestParams::default(), &scenario_history(), today(), now()).unwrap();
    store.load(&ModelSelector::Latest).unwrap()
}

#[test]
fn scenario_schema_has_one_column_per_observed_value() {
    let model = scenario_model();
    assert_eq!(
        model.schema.names(),
        [
            "specialty=Cardiology",
            "specialty=Dermatology",
            "day_of_week=2",
            "day_of_week=6",
            "hour=9",
            "hour=14",
        ]
    );
    assert_eq!(model.forest.feature_count, 6);
    assert_eq!(model.training_rows, 4);
    assert_eq!(model.positive_rows, 2);
}

#[test]
fn scenario_pending_row_is_fully_zero_filled() {
    let model = scenario_model();
    let batch = FeatureEncoder::new().encode(&scenario_pending()).unwrap();
    let matrix = model.schema.reconcile(&batch).unwrap();

    assert_eq!(matrix.rows, vec![vec![0; 6]]);
    assert!(matrix.matched.is_empty());
    assert_eq!(matrix.zero_filled.len(), 6);
    assert_eq!(
        matrix.dropped,
        vec!["specialty=Oncology", "day_of_week=4", "hour=11"]
    );
}

#[test]
fn scenario_prediction_is_deterministic() {
    let run = || {
        let store = InMemoryModelStore::new();
        train(&store, ForestParams::default(), &scenario_history(), today(), now()).unwrap();
        predict_pending(&store, &scenario_pending(), None).unwrap()
    };

    let first = run();
    let second = run();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].appointment_id, 5);
    assert!((0.0..=1.0).contains(&first[0].probability));
    assert_eq!(first[0].category, RiskCategory::from_probability(first[0].probability));
    assert_eq!(first, second);
}

#[test]
fn predicting_before_training_is_cold_start() {
    let err = predict_pending(InMemoryModelStore::new(), &scenario_pending(), None).unwrap_err();
    assert!(matches!(err, NoShowError::ModelNotFound(_)));
    assert!(err.is_cold_start());
}

#[test]
fn all_attended_history_is_degenerate() {
    let history: Vec<AppointmentRecord> = scenario_history()
        .into_iter()
        .map(|mut r| {
            r.absent = Some(false);
            r
        })
        .collect();

    let store = InMemoryModelStore::new();
    let err = train(&store, ForestParams::default(), &history, today(), now()).unwrap_err();
    assert!(matches!(err, NoShowError::DegenerateLabels { class: false, rows: 4 }));
    assert!(store.is_empty());
}

#[test]
fn partially_known_batch_keeps_training_width() {
    let model = scenario_model();
    let pending = vec![
        AppointmentRecord::pending(10, "Cardiology", date(2024, 1, 15), time(9)),
        AppointmentRecord::pending(11, "Pediatrics", date(2024, 1, 19), time(16)),
    ];
    let batch = FeatureEncoder::new().encode(&pending).unwrap();
    let matrix = model.schema.reconcile(&batch).unwrap();

    // 2024-01-15 is a Monday, 2024-01-19 a Friday
    assert_eq!(matrix.rows[0], vec![1, 0, 1, 0, 1, 0]);
    assert_eq!(matrix.rows[1], vec![0, 0, 0, 1, 0, 0]);
    assert_eq!(matrix.dropped, vec!["specialty=Pediatrics", "hour=16"]);

    let results = Predictor::<InMemoryModelStore>::predict_with(&model, &pending).unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn csv_source_and_file_store_round_trip() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    write!(
        csv,
        "id,specialty,scheduled_date,scheduled_time,absent\n\
         1,Cardiology,2024-01-01,09:00,0\n\
         2,Cardiology,2024-01-01,09:00,1\n\
         3,Dermatology,2024-01-05,14:00,0\n\
         4,Dermatology,2024-01-05,14:00,1\n\
         5,Oncology,2024-01-10,11:00,\n\
         6,Cardiology,2024-01-15,09:00,\n"
    )
    .unwrap();
    csv.flush().unwrap();
    let source = CsvAppointmentSource::new(csv.path());
    let models = tempfile::tempdir().unwrap();

    let tag = {
        let store = FsModelStore::open(models.path()).unwrap();
        NoShowTrainer::new(&store, ForestParams::default())
            .train(&source.historical(today()).unwrap(), today(), now())
            .unwrap()
    };

    // Fresh handle: everything comes back from disk
    let store = FsModelStore::open(models.path()).unwrap();
    assert_eq!(store.latest_tag().unwrap(), Some(tag.clone()));

    let pending = source.pending(today()).unwrap();
    let by_latest = predict_pending(&store, &pending, None).unwrap();
    let by_tag = predict_pending(&store, &pending, Some(&tag)).unwrap();
    assert_eq!(by_latest, by_tag);
    assert_eq!(
        by_latest.iter().map(|r| r.appointment_id).collect::<Vec<_>>(),
        vec![5, 6]
    );

    // Same data through the in-memory path gives the same scores
    let in_memory = InMemoryModelStore::new();
    let records = InMemorySource::new(source.read_all().unwrap());
    train(&in_memory, ForestParams::default(), &records.historical(today()).unwrap(), today(), now()).unwrap();
    assert_eq!(predict_pending(&in_memory, &pending, None).unwrap(), by_latest);
}

fn shared_model() -> &'static TrainedModel {
    static MODEL: OnceLock<TrainedModel> = OnceLock::new();
    MODEL.get_or_init(scenario_model)
}

fn arbitrary_pending() -> impl Strategy<Value = AppointmentRecord> {
    let specialties = prop::sample::select(vec!["Cardiology", "Dermatology", "Oncology", "Neurology"]);
    (any::<u64>(), specialties, 0i64..28, 7u32..20).prop_map(|(id, specialty, offset, hour)| {
        AppointmentRecord::pending(id, specialty, today() + chrono::Duration::days(offset), time(hour))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn results_follow_input_order(pending in prop::collection::vec(arbitrary_pending(), 1..50)) {
        let results = Predictor::<InMemoryModelStore>::predict_with(shared_model(), &pending).unwrap();

        prop_assert_eq!(results.len(), pending.len());
        for (result, record) in results.iter().zip(&pending) {
            prop_assert_eq!(result.appointment_id, record.id);
            prop_assert!((0.0..=1.0).contains(&result.probability));
        }
    }
}
