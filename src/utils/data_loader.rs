//! Data loading utilities

use crate::error::{GreyWolfError, Result};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// CSV loader for uploaded tables with a header row
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Field delimiter
    delimiter: u8,
    /// Rows used to infer column types; `None` scans the whole file
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new comma-delimited loader
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            infer_schema_length: None,
        }
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set how many rows are scanned to infer column types
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    fn read_options(&self) -> CsvReadOptions {
        let parse_opts = CsvParseOptions::default().with_separator(self.delimiter);
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
    }

    /// Load a CSV file; `.tsv` files are read tab-delimited
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| GreyWolfError::DataError(format!("{}: {}", path.display(), e)))?;

        let is_tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("tsv"));
        let loader = if is_tsv { self.clone().with_delimiter(b'\t') } else { self.clone() };

        let df = loader
            .read_options()
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| GreyWolfError::DataError(e.to_string()))?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
        Ok(df)
    }

    /// Load a CSV file with an explicit field delimiter
    pub fn load_csv_with_delimiter(&self, path: impl AsRef<Path>, delimiter: u8) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| GreyWolfError::DataError(format!("{}: {}", path.display(), e)))?;
        self.clone()
            .with_delimiter(delimiter)
            .read_options()
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| GreyWolfError::DataError(e.to_string()))
    }

    /// Load CSV content already held in memory (e.g. an uploaded file)
    pub fn load_csv_bytes(&self, bytes: impl Into<Vec<u8>>) -> Result<DataFrame> {
        let cursor = Cursor::new(bytes.into());
        self.read_options()
            .into_reader_with_file_handle(cursor)
            .finish()
            .map_err(|e| GreyWolfError::DataError(e.to_string()))
    }
}

/// Numeric features plus an encoded class label, ready for training
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Row-major feature matrix
    features: Array2<f64>,
    /// Class index per row, as `f64`
    labels: Array1<f64>,
    /// Feature column names in matrix column order
    feature_names: Vec<String>,
    /// Name of the label column
    target_name: String,
    /// Original label text per class index
    class_labels: Vec<String>,
}

impl Dataset {
    /// Split a DataFrame into features (every other column, in order) and the `target` label
    pub fn from_dataframe(df: &DataFrame, target: &str) -> Result<Self> {
        let target_column = df.column(target).map_err(|_| {
            warn!(column = target, "Target column not found");
            GreyWolfError::InputError(format!("target column `{}` not found", target))
        })?;

        if df.height() == 0 {
            return Err(GreyWolfError::InputError("dataset has no rows".to_string()));
        }

        let feature_names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != target)
            .map(|s| s.to_string())
            .collect();

        if feature_names.is_empty() {
            return Err(GreyWolfError::InputError(
                "dataset has no feature columns besides the target".to_string(),
            ));
        }

        let (labels, class_labels) = encode_labels(target_column)?;
        let features = columns_to_array2(df, &feature_names)?;

        Ok(Self {
            features,
            labels,
            feature_names,
            target_name: target.to_string(),
            class_labels,
        })
    }

    /// Build from arrays whose labels are already class indices into `class_labels`
    pub fn from_arrays(
        features: Array2<f64>,
        labels: Array1<f64>,
        feature_names: Vec<String>,
        target_name: impl Into<String>,
        class_labels: Vec<String>,
    ) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(GreyWolfError::ShapeError {
                expected: format!("{} labels", features.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        if features.ncols() != feature_names.len() {
            return Err(GreyWolfError::ShapeError {
                expected: format!("{} feature names", features.ncols()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        let n_classes = class_labels.len() as f64;
        if let Some(bad) = labels.iter().find(|&&l| l < 0.0 || l >= n_classes || l.fract() != 0.0) {
            return Err(GreyWolfError::InputError(format!(
                "label {} is not a class index below {}",
                bad, n_classes
            )));
        }

        Ok(Self {
            features,
            labels,
            feature_names,
            target_name: target_name.into(),
            class_labels,
        })
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn class_labels(&self) -> &[String] {
        &self.class_labels
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Rows per class index
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.class_labels.len()];
        for &label in self.labels.iter() {
            counts[label as usize] += 1;
        }
        counts
    }

    /// Require at least two classes, each with `min_per_class` rows
    pub fn validate_for_stratification(&self, min_per_class: usize) -> Result<()> {
        let counts = self.class_counts();
        let present = counts.iter().filter(|&&c| c > 0).count();
        if present < 2 {
            warn!(column = %self.target_name, classes = present, "Target unsuitable for stratification");
            return Err(GreyWolfError::InputError(format!(
                "target `{}` has {} class(es); at least 2 are required",
                self.target_name, present
            )));
        }
        for (class, &count) in counts.iter().enumerate() {
            if count > 0 && count < min_per_class {
                warn!(column = %self.target_name, class = %self.class_labels[class], count, "Class too small");
                return Err(GreyWolfError::InputError(format!(
                    "class `{}` of target `{}` has {} row(s); at least {} are required",
                    self.class_labels[class], self.target_name, count, min_per_class
                )));
            }
        }
        Ok(())
    }

    /// Rows at `indices`, keeping names and class encoding
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
            class_labels: self.class_labels.clone(),
        }
    }

    /// Stratified, seeded train/test split; returns `(train, test)`
    pub fn stratified_split(&self, test_size: f64, seed: u64) -> Result<(Self, Self)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(GreyWolfError::InvalidParameter {
                name: "test_size".to_string(),
                value: test_size.to_string(),
                reason: "must be strictly between 0 and 1".to_string(),
            });
        }
        self.validate_for_stratification(2)?;

        let n = self.n_samples();
        let counts = self.class_counts();
        let n_classes = counts.iter().filter(|&&c| c > 0).count();
        let n_test = (test_size * n as f64).ceil() as usize;
        let n_train = n - n_test;
        if n_test < n_classes || n_train < n_classes {
            return Err(GreyWolfError::InputError(format!(
                "a split of {} train / {} test rows cannot hold all {} classes",
                n_train, n_test, n_classes
            )));
        }

        let test_counts = allocate_test_counts(&counts, n_test);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut train = Vec::with_capacity(n_train);
        let mut test = Vec::with_capacity(n_test);
        for (class, &n_class_test) in test_counts.iter().enumerate() {
            let mut members: Vec<usize> = self
                .labels
                .iter()
                .enumerate()
                .filter(|(_, &l)| l as usize == class)
                .map(|(i, _)| i)
                .collect();
            members.shuffle(&mut rng);
            test.extend_from_slice(&members[..n_class_test]);
            train.extend_from_slice(&members[n_class_test..]);
        }
        train.sort_unstable();
        test.sort_unstable();

        debug!(train = train.len(), test = test.len(), seed, "Stratified split");
        Ok((self.subset(&train), self.subset(&test)))
    }

    /// Column means in feature order, used as prediction form defaults
    pub fn feature_means(&self) -> Vec<f64> {
        self.features
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_else(|| vec![0.0; self.n_features()])
    }
}

/// Per-class test rows: proportional floor, then the remainder to the largest fractional parts
fn allocate_test_counts(counts: &[usize], n_test: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let exact: Vec<f64> = counts.iter().map(|&c| c as f64 * n_test as f64 / n as f64).collect();
    let mut alloc: Vec<usize> = exact
        .iter()
        .zip(counts.iter())
        .map(|(&e, &c)| (e.floor() as usize).min(c.saturating_sub(1)))
        .collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| (exact[b] - exact[b].floor()).total_cmp(&(exact[a] - exact[a].floor())));

    let mut remaining = n_test.saturating_sub(alloc.iter().sum());
    while remaining > 0 {
        let mut placed = false;
        for &class in &order {
            if remaining == 0 {
                break;
            }
            if alloc[class] + 1 < counts[class] {
                alloc[class] += 1;
                remaining -= 1;
                placed = true;
            }
        }
        if !placed {
            break;
        }
    }
    alloc
}

/// Encode a label column as class indices; classes sort numerically when every value parses
fn encode_labels(column: &Column) -> Result<(Array1<f64>, Vec<String>)> {
    if column.null_count() > 0 {
        return Err(GreyWolfError::InputError(format!(
            "target column `{}` has {} missing value(s)",
            column.name(),
            column.null_count()
        )));
    }

    let as_text = column.cast(&DataType::String)?;
    let values: Vec<String> = as_text
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect();

    let mut classes: Vec<String> = values.clone();
    let numeric: Option<Vec<f64>> = classes.iter().map(|v| v.trim().parse::<f64>().ok()).collect();
    match numeric {
        Some(_) => classes.sort_by(|a, b| {
            let a: f64 = a.trim().parse().unwrap_or(f64::NAN);
            let b: f64 = b.trim().parse().unwrap_or(f64::NAN);
            a.total_cmp(&b)
        }),
        None => classes.sort(),
    }
    classes.dedup();

    let index: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let labels: Array1<f64> = values
        .iter()
        .map(|v| index.get(v.as_str()).copied().unwrap_or(0) as f64)
        .collect();

    Ok((labels, classes))
}

/// Extract named columns from a DataFrame into a row-major Array2<f64>.
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| GreyWolfError::FeatureNotFound(col_name.clone()))?;
            let column_f64 = column
                .cast(&DataType::Float64)
                .map_err(|e| GreyWolfError::DataError(e.to_string()))?;
            if column_f64.null_count() > 0 {
                return Err(GreyWolfError::InputError(format!(
                    "feature column `{}` has missing or non-numeric values",
                    col_name
                )));
            }
            let values: Vec<f64> = column_f64
                .f64()
                .map_err(|e| GreyWolfError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}
