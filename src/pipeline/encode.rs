//! Categorical label encoding
//!
//! Each categorical column is replaced in place by integer codes assigned in
//! sorted label order, so `["b", "a", "b"]` becomes `[1, 0, 1]`.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use super::target::{column_to_string_vec, sorted_unique_labels};
use crate::config::UnseenLabelPolicy;

/// Fitted label vocabulary for one column
#[derive(Debug, Clone, Serialize)]
pub struct LabelEncoder {
    pub column: String,
    /// Labels in code order
    pub classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the sorted vocabulary of a column. Null values are an error.
    pub fn fit(col: &Column) -> Result<Self> {
        let name = col.name().to_string();
        if col.null_count() > 0 {
            anyhow::bail!(
                "Categorical column '{}' contains {} null value(s)",
                name,
                col.null_count()
            );
        }

        let values = column_to_string_vec(col)?;
        let classes = sorted_unique_labels(col.dtype(), values.iter().flatten());

        Ok(Self {
            column: name,
            classes,
        })
    }

    /// Label to code pairs, in code order
    pub fn mapping(&self) -> Vec<(String, i64)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code as i64))
            .collect()
    }

    /// Encode a column with this vocabulary.
    ///
    /// Labels outside the vocabulary either fail or receive the reserved code
    /// `classes.len()`, depending on `policy`.
    pub fn transform(&self, col: &Column, policy: UnseenLabelPolicy) -> Result<Series> {
        let lookup: HashMap<&str, i64> = self
            .classes
            .iter()
            .enumerate()
            .map(|(code, label)| (label.as_str(), code as i64))
            .collect();
        let reserved = self.classes.len() as i64;

        let values = column_to_string_vec(col)?;
        let mut codes = Vec::with_capacity(values.len());
        let mut unseen: Vec<String> = Vec::new();

        for value in values {
            let label = value.with_context(|| {
                format!("Categorical column '{}' contains null values", self.column)
            })?;
            match lookup.get(label.as_str()) {
                Some(&code) => codes.push(code),
                None => {
                    if policy == UnseenLabelPolicy::Error {
                        anyhow::bail!(
                            "Column '{}' contains label '{}' not seen when the encoder was fitted",
                            self.column,
                            label
                        );
                    }
                    if !unseen.contains(&label) {
                        unseen.push(label);
                    }
                    codes.push(reserved);
                }
            }
        }

        if !unseen.is_empty() {
            warn!(
                "Column '{}' has {} unseen label(s) {:?}; assigned reserved code {}",
                self.column,
                unseen.len(),
                unseen,
                reserved
            );
        }

        Ok(Series::new(self.column.as_str().into(), codes))
    }
}

/// Fit one encoder per configured categorical column
pub fn fit_label_encoders(df: &DataFrame, columns: &[String]) -> Result<Vec<LabelEncoder>> {
    columns
        .iter()
        .map(|name| {
            let col = df
                .column(name)
                .with_context(|| format!("Categorical column '{}' not found", name))?;
            LabelEncoder::fit(col)
        })
        .collect()
}

/// Replace each encoded column with its integer codes and log the mappings
pub fn apply_label_encoders(
    mut df: DataFrame,
    encoders: &[LabelEncoder],
    policy: UnseenLabelPolicy,
) -> Result<DataFrame> {
    for encoder in encoders {
        let col = df
            .column(&encoder.column)
            .with_context(|| format!("Categorical column '{}' not found", encoder.column))?;
        let encoded = encoder.transform(col, policy)?;
        df.with_column(encoded)?;
        info!("Mapping for {}: {:?}", encoder.column, encoder.mapping());
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabetical_codes() {
        let df = df! { "meal" => ["a", "b", "a"] }.unwrap();
        let encoders = fit_label_encoders(&df, &["meal".to_string()]).unwrap();

        assert_eq!(
            encoders[0].mapping(),
            vec![("a".to_string(), 0), ("b".to_string(), 1)]
        );

        let encoded = apply_label_encoders(df, &encoders, UnseenLabelPolicy::Reserve).unwrap();
        let codes: Vec<i64> = encoded
            .column("meal")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(codes, vec![0, 1, 0]);
    }

    #[test]
    fn test_unseen_label_reserved_code() {
        let train = df! { "room" => ["Room_Type 1", "Room_Type 2"] }.unwrap();
        let test = df! { "room" => ["Room_Type 2", "Room_Type 7"] }.unwrap();
        let encoders = fit_label_encoders(&train, &["room".to_string()]).unwrap();

        let encoded = apply_label_encoders(test, &encoders, UnseenLabelPolicy::Reserve).unwrap();
        let codes: Vec<i64> = encoded
            .column("room")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(codes, vec![1, 2]);
    }

    #[test]
    fn test_unseen_label_error_policy() {
        let train = df! { "room" => ["x"] }.unwrap();
        let test = df! { "room" => ["y"] }.unwrap();
        let encoders = fit_label_encoders(&train, &["room".to_string()]).unwrap();

        let err = apply_label_encoders(test, &encoders, UnseenLabelPolicy::Error).unwrap_err();
        assert!(err.to_string().contains("'y'"));
    }

    #[test]
    fn test_numeric_categorical_ordered_by_value() {
        let df = df! { "arrival_month" => [12i64, 3, 10, 3] }.unwrap();
        let encoders = fit_label_encoders(&df, &["arrival_month".to_string()]).unwrap();
        assert_eq!(encoders[0].classes, vec!["3", "10", "12"]);
    }

    #[test]
    fn test_missing_column_rejected() {
        let df = df! { "a" => ["x"] }.unwrap();
        let err = fit_label_encoders(&df, &["b".to_string()]).unwrap_err();
        assert!(err.to_string().contains("'b' not found"));
    }

    #[test]
    fn test_null_values_rejected() {
        let df = df! { "a" => [Some("x"), None] }.unwrap();
        assert!(fit_label_encoders(&df, &["a".to_string()]).is_err());
    }
}
