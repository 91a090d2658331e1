use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::prediction::PredictionInput;

pub mod error;
mod http;
pub mod types;

pub use error::ClientError;
pub use http::HttpBackend;
pub use types::{
    DatasetInfo, DatasetList, FeatureImportance, ModelComparison, ModelList, ModelPerformance,
    Prediction, SampleData, UploadReceipt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    DatasetInfo,
    SampleData,
    Datasets,
    Models,
    ModelPerformance,
    CompareModels,
    Correlations,
    FeatureImportance,
    UploadDataset,
    SwitchDataset,
    SwitchModel,
    Predict,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::DatasetInfo => "/api/dataset-info",
            Endpoint::SampleData => "/api/sample-data",
            Endpoint::Datasets => "/api/datasets",
            Endpoint::Models => "/api/models",
            Endpoint::ModelPerformance => "/api/model-performance",
            Endpoint::CompareModels => "/api/compare-models",
            Endpoint::Correlations => "/api/correlations",
            Endpoint::FeatureImportance => "/api/feature-importance",
            Endpoint::UploadDataset => "/api/upload-dataset",
            Endpoint::SwitchDataset => "/api/switch-dataset",
            Endpoint::SwitchModel => "/api/switch-model",
            Endpoint::Predict => "/api/predict",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Endpoint::UploadDataset
            | Endpoint::SwitchDataset
            | Endpoint::SwitchModel
            | Endpoint::Predict => "POST",
            _ => "GET",
        }
    }

    /// Shown when a failed response carries no error message of its own.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::DatasetInfo => "Failed to fetch dataset info",
            Endpoint::SampleData => "Failed to fetch sample data",
            Endpoint::Datasets => "Failed to fetch available datasets",
            Endpoint::Models => "Failed to fetch models",
            Endpoint::ModelPerformance => "Failed to fetch model performance",
            Endpoint::CompareModels => "Failed to compare models",
            Endpoint::Correlations => "Failed to fetch correlations",
            Endpoint::FeatureImportance => "Failed to fetch feature importance",
            Endpoint::UploadDataset => "Failed to upload dataset",
            Endpoint::SwitchDataset => "Failed to switch dataset",
            Endpoint::SwitchModel => "Failed to switch model",
            Endpoint::Predict => "Failed to make prediction",
        }
    }
}

/// The inference backend, one method per endpoint.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn dataset_info(&self) -> Result<DatasetInfo, ClientError>;
    async fn sample_data(&self, limit: usize) -> Result<SampleData, ClientError>;
    async fn datasets(&self) -> Result<DatasetList, ClientError>;
    async fn models(&self) -> Result<ModelList, ClientError>;
    async fn model_performance(&self) -> Result<ModelPerformance, ClientError>;
    async fn compare_models(&self) -> Result<ModelComparison, ClientError>;
    /// Raw body; its layout varies, see `shape`.
    async fn correlations(&self) -> Result<Value, ClientError>;
    async fn feature_importance(&self) -> Result<FeatureImportance, ClientError>;
    async fn upload_dataset(&self, path: &Path) -> Result<UploadReceipt, ClientError>;
    async fn switch_dataset(&self, dataset: &str) -> Result<(), ClientError>;
    async fn switch_model(&self, model: &str) -> Result<(), ClientError>;
    async fn predict(&self, input: &PredictionInput) -> Result<Prediction, ClientError>;
}
