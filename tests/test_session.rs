//! Integration tests for the tuning session

use greywolf::session::{TuningConfig, TuningReport, TuningSession};
use greywolf::GreyWolfError;
use polars::prelude::*;
use std::io::Write;

fn heart_like(n: usize) -> DataFrame {
    let age: Vec<f64> = (0..n).map(|i| 30.0 + (i % 40) as f64).collect();
    let chol: Vec<f64> = (0..n)
        .map(|i| if i % 2 == 0 { 180.0 + (i % 13) as f64 } else { 260.0 + (i % 17) as f64 })
        .collect();
    let target: Vec<i64> = (0..n).map(|i| (i % 2) as i64).collect();
    df!("age" => &age, "chol" => &chol, "target" => &target).unwrap()
}

#[test]
fn test_full_session_flow() {
    let mut session = TuningSession::new();
    session.load_dataframe(heart_like(60)).unwrap();
    assert_eq!(session.columns(), vec!["age", "chol", "target"]);

    let dataset = session.select_target("target").unwrap();
    assert_eq!(dataset.n_features(), 2);
    assert_eq!(dataset.class_labels(), &["0".to_string(), "1".to_string()]);

    let report = session.run(5, 10).unwrap();
    assert_eq!(report.best_fitness, 1.0);
    assert_eq!(report.test_accuracy, 1.0);
    assert_eq!(report.fitness_history.len(), 10);
    assert_eq!(report.train_rows + report.test_rows, 60);
    assert_eq!(report.feature_names, vec!["age".to_string(), "chol".to_string()]);
    assert_eq!(report.evaluations, 5 * 11);

    let prediction = session.predict(&[50.0, 270.0]).unwrap();
    assert_eq!(prediction.label, "1");
    assert_eq!(session.prediction_log().len(), 1);
    assert_eq!(session.prediction_log()[0].inputs, vec![50.0, 270.0]);
}

#[test]
fn test_missing_target_column() {
    let mut session = TuningSession::new();
    session.load_dataframe(heart_like(20)).unwrap();
    assert!(matches!(
        session.select_target("diagnosis"),
        Err(GreyWolfError::InputError(_))
    ));
}

#[test]
fn test_single_class_target_rejected_before_optimization() {
    let df = df!(
        "age" => &[40.0, 50.0, 60.0, 70.0, 45.0, 55.0, 65.0, 75.0],
        "target" => &[1i64, 1, 1, 1, 1, 1, 1, 1]
    )
    .unwrap();

    let mut session = TuningSession::new();
    session.load_dataframe(df).unwrap();
    session.select_target("target").unwrap();

    assert!(matches!(session.run(5, 10), Err(GreyWolfError::InputError(_))));
    assert!(session.report().is_none());
}

#[test]
fn test_rare_class_rejected() {
    let n = 40;
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let y: Vec<i64> = (0..n).map(|i| if i < 3 { 1 } else { 0 }).collect();
    let df = df!("x" => &x, "target" => &y).unwrap();

    let mut session = TuningSession::new();
    session.load_dataframe(df).unwrap();
    session.select_target("target").unwrap();

    assert!(matches!(session.run(5, 10), Err(GreyWolfError::InputError(_))));
}

#[test]
fn test_controls_out_of_range() {
    let mut session = TuningSession::new();
    session.load_dataframe(heart_like(40)).unwrap();
    session.select_target("target").unwrap();

    assert!(matches!(
        session.run(3, 10),
        Err(GreyWolfError::InvalidParameter { .. })
    ));
    assert!(matches!(
        session.run(15, 60),
        Err(GreyWolfError::InvalidParameter { .. })
    ));
}

#[test]
fn test_predict_requires_run() {
    let mut session = TuningSession::new();
    assert!(matches!(
        session.predict(&[1.0, 2.0]),
        Err(GreyWolfError::ModelNotFitted)
    ));
}

#[test]
fn test_failed_rerun_discards_previous_results() {
    let mut session = TuningSession::new();
    session.load_dataframe(heart_like(40)).unwrap();
    session.select_target("target").unwrap();
    session.run(5, 10).unwrap();
    assert!(session.is_fitted());

    // 20 rows per class cannot fill 20 folds after the split
    let config = TuningConfig::new()
        .with_target("target")
        .with_gwo(greywolf::optimizer::GwoConfig::new().with_pop_size(5).with_max_iter(2))
        .with_cv_folds(20);
    let err = session.run_with(config).unwrap_err();
    assert!(matches!(err, GreyWolfError::InputError(_)));

    assert!(session.report().is_none());
    assert!(!session.is_fitted());
    assert!(matches!(
        session.predict(&[50.0, 270.0]),
        Err(GreyWolfError::ModelNotFitted)
    ));
}

#[test]
fn test_prediction_defaults_are_means_in_feature_order() {
    let df = df!(
        "chol" => &[200.0, 300.0, 250.0, 250.0],
        "sex" => &[0i64, 1, 1, 0],
        "target" => &[0i64, 1, 0, 1]
    )
    .unwrap();

    let mut session = TuningSession::new();
    session.load_dataframe(df).unwrap();
    session.select_target("target").unwrap();

    let defaults = session.prediction_defaults().unwrap();
    assert_eq!(
        defaults,
        vec![("chol".to_string(), 250.0), ("sex".to_string(), 0.5)]
    );
}

#[test]
fn test_run_with_config_selects_target() {
    let config = TuningConfig::new()
        .with_target("target")
        .with_gwo(greywolf::optimizer::GwoConfig::new().with_pop_size(4).with_max_iter(2))
        .with_cv_folds(3);

    let mut session = TuningSession::with_config(config.clone());
    session.load_dataframe(heart_like(30)).unwrap();
    let report = session.run_with(config).unwrap();

    assert_eq!(report.target_column, "target");
    assert_eq!(report.fitness_history.len(), 2);
    assert_eq!(report.confusion_matrix.dim(), (2, 2));
}

#[test]
fn test_report_serializes_to_json() {
    let mut session = TuningSession::new();
    session.load_dataframe(heart_like(40)).unwrap();
    session.select_target("target").unwrap();
    let report = session.run(5, 10).unwrap().clone();

    let json = report.to_json().unwrap();
    assert!(json.contains("\"best_params\""));
    assert!(json.contains("\"fitness_history\""));

    let back: TuningReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.best_params, report.best_params);
    assert_eq!(back.confusion_matrix, report.confusion_matrix);
}

#[test]
fn test_load_uploaded_bytes() {
    let mut csv = String::from("age,chol,target\n");
    for i in 0..30 {
        let chol = if i % 2 == 0 { 190 } else { 280 };
        csv.push_str(&format!("{},{},{}\n", 35 + i, chol, i % 2));
    }

    let mut session = TuningSession::new();
    session.load_csv_bytes(csv.into_bytes()).unwrap();
    session.select_target("target").unwrap();

    let report = session.run(5, 10).unwrap();
    assert_eq!(report.best_fitness, 1.0);
}

#[test]
fn test_config_file_roundtrip() {
    let config = TuningConfig::new().with_target("target").with_test_size(0.25);
    let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();

    config.save(file.path()).unwrap();
    let loaded = TuningConfig::load(file.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_csv_file() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "age,target").unwrap();
    for i in 0..20 {
        writeln!(file, "{},{}", i, if i < 10 { "no" } else { "yes" }).unwrap();
    }

    let mut session = TuningSession::new();
    session.load_csv(file.path()).unwrap();
    let dataset = session.select_target("target").unwrap();
    assert_eq!(dataset.class_counts(), vec![10, 10]);
}
