//! Ranking quality measures and the hyperparameter search built on them.

pub mod evaluator;
pub mod metrics;
pub mod tuning;

pub use evaluator::{Evaluator, Summary};
pub use metrics::{Metric, MetricKind};
pub use tuning::{CrossValidation, CrossValidationReport, GridSearch, GridSearchReport, ModelFamily};
