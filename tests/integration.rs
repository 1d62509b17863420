//! Integration tests for titanic-knn

use std::io::Write;

use tempfile::{tempdir, NamedTempFile};
use titanic_knn::{
    load_passengers, preprocess, run, train_test_split, DegeneratePolicy, MinMaxScaler, PipelineConfig,
    PipelineError,
};

const HEADER: &str = "PassengerId,Survived,Pclass,Name,Sex,Age,SibSp,Parch,Ticket,Fare,Cabin,Embarked";

/// Create a synthetic 20-passenger CSV with a few missing ages, fares and ports
fn create_test_csv() -> NamedTempFile {
    let rows = [
        "892,0,3,\"Kelly, Mr. James\",male,34.5,0,0,330911,7.8292,,Q",
        "893,1,3,\"Wilkes, Mrs. James\",female,47,1,0,363272,7,,S",
        "894,0,2,\"Myles, Mr. Thomas\",male,62,0,0,240276,9.6875,,Q",
        "895,0,3,\"Wirz, Mr. Albert\",male,27,0,0,315154,8.6625,,S",
        "896,1,3,\"Hirvonen, Mrs. Alexander\",female,22,1,1,3101298,12.2875,,S",
        "897,0,3,\"Svensson, Mr. Johan\",male,14,0,0,7538,9.225,,S",
        "898,1,3,\"Connolly, Miss. Kate\",female,30,0,0,330972,7.6292,,Q",
        "899,0,2,\"Caldwell, Mr. Albert\",male,26,1,1,248738,29,,S",
        "900,1,3,\"Abrahim, Mrs. Joseph\",female,18,0,0,2657,7.2292,,C",
        "901,0,3,\"Davies, Mr. John\",male,21,2,0,A/4 48871,24.15,,S",
        "902,0,3,\"Ilieff, Mr. Ylio\",male,,0,0,349220,7.8958,,S",
        "903,0,1,\"Jones, Mr. Charles\",male,46,0,0,694,26,,S",
        "904,1,1,\"Snyder, Mrs. John\",female,23,1,0,21228,82.2667,B45,S",
        "905,0,2,\"Howard, Mr. Benjamin\",male,63,1,0,24065,26,,S",
        "906,1,1,\"Chaffee, Mrs. Herbert\",female,47,1,0,W.E.P. 5734,61.175,E31,",
        "907,1,2,\"del Carlo, Mrs. Sebastiano\",female,24,1,0,SC/PARIS 2167,27.7208,,C",
        "908,0,2,\"Keane, Mr. Daniel\",male,35,0,0,233734,12.35,,Q",
        "909,0,3,\"Assaf, Mr. Gerios\",male,21,0,0,2692,7.225,,C",
        "910,1,3,\"Ilmakangas, Miss. Ida\",female,,1,0,STON/O2. 3101270,,,S",
        "911,1,1,\"Assaf Khalil, Mrs. Mariana\",female,45,0,0,2696,7.225,,C",
    ];

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

#[test]
fn test_end_to_end_pipeline() {
    let test_file = create_test_csv();
    let config = PipelineConfig {
        input: test_file.path().to_path_buf(),
        output: None,
        ..PipelineConfig::default()
    };

    let outcome = run(&config).unwrap();

    assert_eq!(outcome.n_passengers, 20);
    assert_eq!(outcome.n_train, 15);
    assert_eq!(outcome.n_test, 5);

    // Confusion matrix covers exactly the held-out rows
    let confusion = &outcome.evaluation.confusion;
    assert_eq!(confusion.total(), 5);
    assert_eq!(confusion.counts().shape(), &[2, 2]);

    let accuracy = outcome.evaluation.accuracy;
    assert!((0.0..=1.0).contains(&accuracy));
    let tp_tn = confusion.get(0, 0) + confusion.get(1, 1);
    assert!((accuracy - tp_tn as f64 / 5.0).abs() < 1e-6);

    // Folds train on 12 rows, so larger neighbourhoods cannot be scored
    assert!(outcome.best_config.n_neighbors <= 12);
    assert_eq!(outcome.scored_trials, 3 * 12 * 2);
    assert!(!outcome.heatmap_written);
}

#[test]
fn test_pipeline_is_reproducible() {
    let test_file = create_test_csv();
    let config = PipelineConfig {
        input: test_file.path().to_path_buf(),
        output: None,
        ..PipelineConfig::default()
    };

    let first = run(&config).unwrap();
    let second = run(&config).unwrap();

    assert_eq!(first.best_config, second.best_config);
    assert_eq!(first.cv_score, second.cv_score);
    assert_eq!(first.evaluation.predictions, second.evaluation.predictions);
    assert_eq!(first.evaluation.confusion, second.evaluation.confusion);
}

#[test]
fn test_heatmap_failure_does_not_fail_run() {
    let test_file = create_test_csv();
    let temp_dir = tempdir().unwrap();
    let config = PipelineConfig {
        input: test_file.path().to_path_buf(),
        output: Some(temp_dir.path().join("no_such_dir").join("cm.png")),
        ..PipelineConfig::default()
    };

    let outcome = run(&config).unwrap();
    assert!(!outcome.heatmap_written);
    assert_eq!(outcome.evaluation.confusion.total(), 5);
}

#[test]
fn test_preprocessed_features_have_no_gaps() {
    let test_file = create_test_csv();
    let raw = load_passengers(test_file.path()).unwrap();
    let table = preprocess(&raw).unwrap();

    assert_eq!(table.len(), 20);
    assert!(table.features.iter().all(|v| v.is_finite()));

    let fare_bins = table.column("FareBin").unwrap();
    assert!(fare_bins.iter().all(|&b| (0.0..4.0).contains(&b)));
    let age_bins = table.column("AgeBin").unwrap();
    assert!(age_bins.iter().all(|&b| (0.0..5.0).contains(&b)));

    // Row 2 (age 62) is a senior, row 5 (age 14) a teen
    assert_eq!(age_bins[2], 4.0);
    assert_eq!(age_bins[5], 1.0);
}

#[test]
fn test_scaling_fits_training_rows_only() {
    let test_file = create_test_csv();
    let raw = load_passengers(test_file.path()).unwrap();
    let table = preprocess(&raw).unwrap();
    let split = train_test_split(&table, 0.25, 42).unwrap();

    let (scaler, scaled_train) =
        MinMaxScaler::fit_transform(&split.train.records, &table.feature_names, DegeneratePolicy::Lenient).unwrap();

    for (idx, column) in scaled_train.columns().into_iter().enumerate() {
        let min = column.iter().copied().fold(f64::INFINITY, f64::min);
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(min.abs() < 1e-12);
        if !scaler.degenerate_columns().contains(&idx) {
            assert!((max - 1.0).abs() < 1e-12);
        }
    }

    // The test partition reuses the training statistics
    let scaled_test = scaler.transform(&split.test.records).unwrap();
    for ((row, col), &value) in scaled_test.indexed_iter() {
        let raw_value = split.test.records[[row, col]];
        let min = scaler.data_min()[col];
        let range = scaler.data_max()[col] - min;
        let expected = if range == 0.0 { raw_value - min } else { (raw_value - min) / range };
        assert!((value - expected).abs() < 1e-12);
    }
}

#[test]
fn test_missing_column_is_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "PassengerId,Survived,Pclass,Name,Sex,Age,SibSp,Parch,Ticket,Fare,Cabin").unwrap();
    writeln!(file, "1,0,3,Someone,male,30,0,0,A1,7.25,").unwrap();

    let config = PipelineConfig {
        input: file.path().to_path_buf(),
        output: None,
        ..PipelineConfig::default()
    };
    match run(&config) {
        Err(PipelineError::Schema { column }) => assert_eq!(column, "Embarked"),
        other => panic!("expected schema error, got {:?}", other.map(|o| o.n_passengers)),
    }
}

#[test]
fn test_unknown_sex_is_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    writeln!(file, "1,0,3,A,male,30,0,0,T1,7.25,,S").unwrap();
    writeln!(file, "2,1,3,B,other,30,0,0,T2,7.25,,S").unwrap();

    let raw = load_passengers(file.path()).unwrap();
    match preprocess(&raw) {
        Err(PipelineError::InvalidCategory { column, value }) => {
            assert_eq!(column, "Sex");
            assert_eq!(value, "other");
        }
        other => panic!("expected invalid category, got {:?}", other.map(|t| t.len())),
    }
}
