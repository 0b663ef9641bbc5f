//! Integration tests for the ingestion stage

use hotelcancel::error::StageErrorKind;
use hotelcancel::pipeline::{DataIngestion, INDEX_COLUMN};

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_ingestion_downloads_and_splits() {
    let ws = Workspace::new(120);
    let config = test_config();

    let ingestion = DataIngestion::new(&config.data_ingestion, &ws.paths, &ws.store).unwrap();
    let outcome = ingestion.run().unwrap();

    assert!(outcome.raw_bytes > 0);
    assert_eq!(outcome.train_rows, 96);
    assert_eq!(outcome.test_rows, 24);

    assert!(ws.paths.raw_file.exists());
    let train = read_csv(&ws.paths.train_file);
    let test = read_csv(&ws.paths.test_file);
    assert_eq!(train.height(), 96);
    assert_eq!(test.height(), 24);

    let columns = names(&train);
    assert_eq!(columns[0], INDEX_COLUMN);
    assert!(columns.contains(&"Booking_ID".to_string()));
    assert_eq!(names(&test), columns);
}

#[test]
fn test_ingestion_is_reproducible() {
    let ws = Workspace::new(60);
    let config = test_config();

    let ingestion = DataIngestion::new(&config.data_ingestion, &ws.paths, &ws.store).unwrap();
    ingestion.run().unwrap();
    let first = read_csv(&ws.paths.test_file);

    ingestion.run().unwrap();
    let second = read_csv(&ws.paths.test_file);

    assert!(first.equals(&second));
}

#[test]
fn test_different_seed_changes_partition() {
    let ws = Workspace::new(60);
    let config = test_config();

    DataIngestion::new(&config.data_ingestion, &ws.paths, &ws.store)
        .unwrap()
        .run()
        .unwrap();
    let seeded_42 = read_csv(&ws.paths.test_file);

    DataIngestion::new(&config.data_ingestion, &ws.paths, &ws.store)
        .unwrap()
        .with_seed(7)
        .run()
        .unwrap();
    let seeded_7 = read_csv(&ws.paths.test_file);

    assert!(!seeded_42.equals(&seeded_7));
}

#[test]
fn test_missing_object_is_download_error() {
    let ws = Workspace::new(20);
    let mut config = test_config();
    config.data_ingestion.bucket_file_name = "raw/missing.csv".to_string();

    let ingestion = DataIngestion::new(&config.data_ingestion, &ws.paths, &ws.store).unwrap();
    let err = ingestion.run().unwrap_err();

    assert_eq!(err.stage_kind(), Some(StageErrorKind::Download));
    assert!(!ws.paths.train_file.exists());
}

#[test]
fn test_failed_split_keeps_raw_file() {
    // A single data row cannot be split into two non-empty partitions
    let ws = Workspace::new(1);
    let config = test_config();

    let ingestion = DataIngestion::new(&config.data_ingestion, &ws.paths, &ws.store).unwrap();
    let err = ingestion.run().unwrap_err();

    assert_eq!(err.stage_kind(), Some(StageErrorKind::Split));
    assert!(err.to_string().starts_with("split error at"));
    assert!(ws.paths.raw_file.exists());
}
