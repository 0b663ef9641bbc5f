//! Shared test utilities and fixture generators

#![allow(dead_code)]

use hotelcancel::config::{AppConfig, ArtifactPaths};
use hotelcancel::storage::LocalStore;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const BUCKET: &str = "hotel-bookings";
pub const OBJECT_KEY: &str = "raw/Hotel_Reservations.csv";

/// A small configuration matching [`create_bookings_dataframe`], with forests
/// kept tiny so tests stay fast
pub const CONFIG_YAML: &str = r#"
data_ingestion:
  bucket_name: hotel-bookings
  bucket_file_name: raw/Hotel_Reservations.csv
  train_ratio: 0.8
  project_id: null

data_processing:
  categorical_columns:
    - type_of_meal_plan
    - room_type_reserved
    - market_segment_type
    - booking_status
  numerical_columns:
    - lead_time
    - avg_price_per_room
    - no_of_special_requests
  skewness_threshold: 5
  number_of_features: 4
  feature_selection:
    n_estimators: 10

model_training:
  n_estimators: 15
"#;

/// Create a hotel-bookings-like table with a learnable cancellation signal.
///
/// Columns mirror the public hotel reservations dataset: an id, three
/// categorical columns, numeric columns and a string `booking_status`.
/// Every third booking is canceled; canceled bookings have long lead times.
pub fn create_bookings_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let meal_plans = ["Meal Plan 1", "Meal Plan 2", "Not Selected"];
    let rooms = ["Room_Type 1", "Room_Type 2", "Room_Type 4"];
    let segments = ["Online", "Offline", "Corporate"];

    let mut ids = Vec::with_capacity(rows);
    let mut adults = Vec::with_capacity(rows);
    let mut meal = Vec::with_capacity(rows);
    let mut room = Vec::with_capacity(rows);
    let mut lead = Vec::with_capacity(rows);
    let mut segment = Vec::with_capacity(rows);
    let mut price = Vec::with_capacity(rows);
    let mut requests = Vec::with_capacity(rows);
    let mut status = Vec::with_capacity(rows);

    for i in 0..rows {
        let canceled = i % 3 == 0;
        ids.push(format!("INN{:05}", i + 1));
        adults.push(rng.gen_range(1i64..=3));
        meal.push(meal_plans[i % meal_plans.len()].to_string());
        room.push(rooms[(i / 2) % rooms.len()].to_string());
        lead.push(if canceled {
            rng.gen_range(120i64..300)
        } else {
            rng.gen_range(0i64..60)
        });
        segment.push(segments[(i / 3) % segments.len()].to_string());
        price.push((rng.gen_range(60.0f64..180.0) * 100.0).round() / 100.0);
        requests.push(if canceled { 0i64 } else { rng.gen_range(0i64..3) });
        status.push(if canceled { "Canceled" } else { "Not_Canceled" }.to_string());
    }

    df! {
        "Booking_ID" => ids,
        "no_of_adults" => adults,
        "type_of_meal_plan" => meal,
        "room_type_reserved" => room,
        "lead_time" => lead,
        "market_segment_type" => segment,
        "avg_price_per_room" => price,
        "no_of_special_requests" => requests,
        "booking_status" => status,
    }
    .unwrap()
}

/// Write a DataFrame to a CSV file
pub fn write_csv(df: &mut DataFrame, path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

/// Read a CSV file written by a stage
pub fn read_csv(path: &Path) -> DataFrame {
    hotelcancel::pipeline::load_dataset(path).unwrap()
}

/// Column names as owned strings
pub fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// A scratch workspace with a local bucket holding the bookings table
pub struct Workspace {
    pub dir: TempDir,
    pub store: LocalStore,
    pub paths: ArtifactPaths,
}

impl Workspace {
    pub fn new(rows: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let bucket_root = dir.path().join("bucket");
        let mut df = create_bookings_dataframe(rows, 7);
        write_csv(&mut df, &bucket_root.join(BUCKET).join(OBJECT_KEY));

        Self {
            store: LocalStore::new(bucket_root.clone()),
            paths: ArtifactPaths::with_root(dir.path().join("artifacts")),
            dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Parse the fixture configuration
pub fn test_config() -> AppConfig {
    let config: AppConfig = serde_yaml::from_str(CONFIG_YAML).unwrap();
    config.validate().unwrap();
    config
}

/// Write `contents` as `config/config.yaml` under `root`
pub fn write_config(root: &Path, contents: &str) -> PathBuf {
    let path = root.join("config").join("config.yaml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, contents).unwrap();
    path
}
