//! Tuning session: dataset, target selection, optimization run, final model and predictions
//!
//! A [`TuningSession`] owns everything an interactive front end needs between
//! requests. Nothing is process-global; drop the session to reset it.

use crate::error::{GreyWolfError, Result};
use crate::optimizer::{optimize_tree, GwoConfig, OptimizationResult, Position, TreeParams};
use crate::training::{ClassificationMetrics, DecisionTree};
use crate::utils::{DataLoader, Dataset};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Settings for a full tuning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Label column; `None` until a target is chosen
    pub target_column: Option<String>,

    /// Optimizer settings
    pub gwo: GwoConfig,

    /// Cross-validation folds used as fitness
    pub cv_folds: usize,

    /// Held-out share of rows for the final test accuracy
    pub test_size: f64,

    /// Seed of the stratified train/test split
    pub split_seed: u64,

    /// Seed of every decision tree
    pub tree_seed: u64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            target_column: None,
            gwo: GwoConfig::default(),
            cv_folds: 5,
            test_size: 0.2,
            split_seed: 42,
            tree_seed: 42,
        }
    }
}

impl TuningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = Some(target.into());
        self
    }

    pub fn with_gwo(mut self, gwo: GwoConfig) -> Self {
        self.gwo = gwo;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    pub fn with_tree_seed(mut self, seed: u64) -> Self {
        self.tree_seed = seed;
        self
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.gwo.validate()?;
        if self.cv_folds < 2 {
            return Err(GreyWolfError::InvalidParameter {
                name: "cv_folds".to_string(),
                value: self.cv_folds.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(GreyWolfError::InvalidParameter {
                name: "test_size".to_string(),
                value: self.test_size.to_string(),
                reason: "must be strictly between 0 and 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Everything a front end shows after a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningReport {
    pub target_column: String,
    pub best_params: TreeParams,
    pub best_position: Position,
    /// Mean cross-validated accuracy of the best configuration on the training split
    pub best_fitness: f64,
    /// Accuracy of the final model on the held-out split
    pub test_accuracy: f64,
    /// Alpha fitness after each iteration
    pub fitness_history: Vec<f64>,
    /// Held-out confusion matrix, rows actual, columns predicted, in `class_labels` order
    pub confusion_matrix: Array2<usize>,
    pub class_labels: Vec<String>,
    pub feature_names: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub evaluations: usize,
    pub duration_secs: f64,
}

impl TuningReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Class predicted for one input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class_index: usize,
    /// Original label text of the class
    pub label: String,
}

/// One entry of the session's prediction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub inputs: Vec<f64>,
    pub prediction: Prediction,
}

/// Final model trained with the best configuration
#[derive(Debug, Clone)]
struct FittedModel {
    tree: DecisionTree,
    feature_names: Vec<String>,
    class_labels: Vec<String>,
}

/// Session state for one dataset and its tuning runs
#[derive(Debug, Clone, Default)]
pub struct TuningSession {
    config: TuningConfig,
    frame: Option<DataFrame>,
    dataset: Option<Dataset>,
    model: Option<FittedModel>,
    report: Option<TuningReport>,
    predictions: Vec<PredictionRecord>,
}

impl TuningSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TuningConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TuningConfig {
        &self.config
    }

    /// Replace the loaded table; clears target, model and prediction log
    pub fn load_dataframe(&mut self, df: DataFrame) -> Result<()> {
        if df.height() == 0 || df.width() == 0 {
            warn!(rows = df.height(), cols = df.width(), "Rejected empty table");
            return Err(GreyWolfError::InputError("uploaded table is empty".to_string()));
        }
        info!(rows = df.height(), cols = df.width(), "Loaded table");
        self.frame = Some(df);
        self.dataset = None;
        self.model = None;
        self.report = None;
        self.predictions.clear();
        Ok(())
    }

    pub fn load_csv(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let df = DataLoader::new().load_csv(path)?;
        self.load_dataframe(df)
    }

    /// Load an uploaded CSV held in memory
    pub fn load_csv_bytes(&mut self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let df = DataLoader::new().load_csv_bytes(bytes)?;
        self.load_dataframe(df)
    }

    pub fn dataframe(&self) -> Option<&DataFrame> {
        self.frame.as_ref()
    }

    /// Column names available as target
    pub fn columns(&self) -> Vec<String> {
        self.frame
            .as_ref()
            .map(|df| df.get_column_names().into_iter().map(|c| c.to_string()).collect())
            .unwrap_or_default()
    }

    /// Choose the label column and encode the table into features and classes
    pub fn select_target(&mut self, target: &str) -> Result<&Dataset> {
        let df = self
            .frame
            .as_ref()
            .ok_or_else(|| GreyWolfError::InputError("no table loaded".to_string()))?;
        let dataset = Dataset::from_dataframe(df, target)?;

        self.config.target_column = Some(target.to_string());
        self.model = None;
        self.report = None;
        self.predictions.clear();
        Ok(self.dataset.insert(dataset))
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Run with interactive controls, enforcing their ranges
    pub fn run(&mut self, pop_size: usize, max_iter: usize) -> Result<&TuningReport> {
        let mut config = self.config.clone();
        let controls = GwoConfig::from_controls(pop_size, max_iter)?;
        config.gwo.pop_size = controls.pop_size;
        config.gwo.max_iter = controls.max_iter;
        self.run_with(config)
    }

    /// Split, optimize on the training rows, train the final tree and score it on the test rows
    pub fn run_with(&mut self, config: TuningConfig) -> Result<&TuningReport> {
        config.validate()?;

        if let Some(target) = config.target_column.as_deref() {
            let selected = self.dataset.as_ref().map(|d| d.target_name());
            if selected != Some(target) {
                self.select_target(target)?;
            }
        }
        // A failed rerun must not leave the previous run's results behind
        self.report = None;
        self.model = None;

        let dataset = self.dataset.as_ref().ok_or_else(|| {
            GreyWolfError::InputError("no target column selected".to_string())
        })?;

        // Every class must survive the split and still fill each fold
        let min_per_class = config.cv_folds + 1;
        dataset.validate_for_stratification(min_per_class)?;
        let (train, test) = dataset.stratified_split(config.test_size, config.split_seed)?;
        train.validate_for_stratification(config.cv_folds)?;

        info!(
            column = %dataset.target_name(),
            train_rows = train.n_samples(),
            test_rows = test.n_samples(),
            classes = dataset.class_labels().len(),
            "Starting tuning run"
        );

        let result: OptimizationResult = optimize_tree(
            train.features(),
            train.labels(),
            &config.gwo,
            config.cv_folds,
            config.tree_seed,
        )?;

        let mut tree = DecisionTree::from_params(&result.best_params, config.tree_seed);
        tree.fit(train.features(), train.labels())
            .map_err(|e| GreyWolfError::TrainingError(e.to_string()))?;

        let class_indices: Vec<f64> = (0..dataset.class_labels().len()).map(|i| i as f64).collect();
        let y_pred = tree.predict(test.features())?;
        let metrics = ClassificationMetrics::compute(test.labels(), &y_pred, &class_indices);

        info!(
            best_params = %result.best_params,
            cv_accuracy = result.best_fitness,
            test_accuracy = metrics.accuracy,
            "Tuning run finished"
        );

        let report = TuningReport {
            target_column: dataset.target_name().to_string(),
            best_params: result.best_params,
            best_position: result.best_position,
            best_fitness: result.best_fitness,
            test_accuracy: metrics.accuracy,
            fitness_history: result.fitness_history,
            confusion_matrix: metrics.confusion_matrix,
            class_labels: dataset.class_labels().to_vec(),
            feature_names: dataset.feature_names().to_vec(),
            train_rows: train.n_samples(),
            test_rows: test.n_samples(),
            evaluations: result.evaluations,
            duration_secs: result.duration_secs,
        };

        self.model = Some(FittedModel {
            tree,
            feature_names: dataset.feature_names().to_vec(),
            class_labels: dataset.class_labels().to_vec(),
        });
        self.config = config;
        Ok(self.report.insert(report))
    }

    pub fn report(&self) -> Option<&TuningReport> {
        self.report.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Feature names paired with their column means, in feature order
    pub fn prediction_defaults(&self) -> Result<Vec<(String, f64)>> {
        let dataset = self.dataset.as_ref().ok_or_else(|| {
            GreyWolfError::InputError("no target column selected".to_string())
        })?;
        Ok(dataset
            .feature_names()
            .iter()
            .cloned()
            .zip(dataset.feature_means())
            .collect())
    }

    /// Predict one row with the final model and append it to the log
    pub fn predict(&mut self, row: &[f64]) -> Result<Prediction> {
        let model = self.model.as_ref().ok_or(GreyWolfError::ModelNotFitted)?;
        if row.len() != model.feature_names.len() {
            return Err(GreyWolfError::ShapeError {
                expected: format!("{} features", model.feature_names.len()),
                actual: format!("{} features", row.len()),
            });
        }

        let class = model.tree.predict_row(row)?;
        let class_index = class as usize;
        let label = model
            .class_labels
            .get(class_index)
            .cloned()
            .ok_or_else(|| GreyWolfError::TrainingError(format!("unknown class index {}", class_index)))?;
        let prediction = Prediction { class_index, label };

        self.predictions.push(PredictionRecord {
            inputs: row.to_vec(),
            prediction: prediction.clone(),
        });
        Ok(prediction)
    }

    /// Predict every row of a feature matrix without logging
    pub fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self.model.as_ref().ok_or(GreyWolfError::ModelNotFitted)?;
        model.tree.predict(x)
    }

    pub fn prediction_log(&self) -> &[PredictionRecord] {
        &self.predictions
    }

    pub fn clear_predictions(&mut self) {
        self.predictions.clear();
    }
}
