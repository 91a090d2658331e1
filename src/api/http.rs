use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::error::ClientError;
use crate::api::types::{
    DatasetInfo, DatasetList, ErrorBody, FeatureImportance, ModelComparison, ModelList,
    ModelPerformance, Prediction, SampleData, SwitchDataset, SwitchModel, UploadReceipt,
};
use crate::api::{Backend, Endpoint};
use crate::dataset::prepare_upload;
use crate::logging::{
    log_fetch, log_fetch_error, log_prediction, log_switch, log_upload, v_str, Domain,
    ProfileScope,
};
use crate::prediction::PredictionInput;
use crate::state::Config;

/// Backend reached over plain HTTP/JSON.
pub struct HttpBackend {
    client: Client,
    cfg: Config,
}

impl HttpBackend {
    pub fn new(cfg: Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            cfg,
        })
    }

    fn url(&self, endpoint: Endpoint) -> Result<String, ClientError> {
        self.cfg
            .endpoint_url(endpoint.path())
            .map(|u| u.to_string())
            .map_err(|e| ClientError::Validation(format!("invalid backend url: {}", e)))
    }

    /// Sends the request and returns the body of a successful response.
    async fn send(&self, endpoint: Endpoint, req: RequestBuilder) -> Result<String, ClientError> {
        let scope = ProfileScope::with_context(
            "backend_request",
            &[("endpoint", v_str(endpoint.path()))],
        );
        let resp = req.send().await.map_err(|e| {
            log_fetch_error(endpoint.path(), "transport", &e.to_string());
            ClientError::Transport(e.to_string())
        })?;

        let status = resp.status();
        log_fetch(endpoint.method(), endpoint.path(), status.as_u16(), scope.elapsed_ms());
        let body = resp.text().await.map_err(|e| {
            log_fetch_error(endpoint.path(), "transport", &e.to_string());
            ClientError::Transport(e.to_string())
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| endpoint.failure_message().to_string());
            log_fetch_error(endpoint.path(), "status", &message);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(endpoint: Endpoint, body: &str) -> Result<T, ClientError> {
        serde_json::from_str(body).map_err(|e| {
            log_fetch_error(endpoint.path(), "decode", &e.to_string());
            ClientError::Decode(e.to_string())
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, ClientError> {
        let req = self.client.get(self.url(endpoint)?);
        let body = self.send(endpoint, req).await?;
        Self::decode(endpoint, &body)
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn dataset_info(&self) -> Result<DatasetInfo, ClientError> {
        self.get_json(Endpoint::DatasetInfo).await
    }

    async fn sample_data(&self, limit: usize) -> Result<SampleData, ClientError> {
        let endpoint = Endpoint::SampleData;
        let req = self
            .client
            .get(self.url(endpoint)?)
            .query(&[("limit", limit.to_string())]);
        let body = self.send(endpoint, req).await?;
        Self::decode(endpoint, &body)
    }

    async fn datasets(&self) -> Result<DatasetList, ClientError> {
        self.get_json(Endpoint::Datasets).await
    }

    async fn models(&self) -> Result<ModelList, ClientError> {
        self.get_json(Endpoint::Models).await
    }

    async fn model_performance(&self) -> Result<ModelPerformance, ClientError> {
        self.get_json(Endpoint::ModelPerformance).await
    }

    async fn compare_models(&self) -> Result<ModelComparison, ClientError> {
        self.get_json(Endpoint::CompareModels).await
    }

    async fn correlations(&self) -> Result<Value, ClientError> {
        self.get_json(Endpoint::Correlations).await
    }

    async fn feature_importance(&self) -> Result<FeatureImportance, ClientError> {
        self.get_json(Endpoint::FeatureImportance).await
    }

    async fn upload_dataset(&self, path: &Path) -> Result<UploadReceipt, ClientError> {
        let endpoint = Endpoint::UploadDataset;
        // Validation happens before anything touches the network.
        let file = prepare_upload(path).await?;
        log_upload(&file.name, file.bytes.len() as u64, &file.sha256);

        let part = Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str("text/csv")
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        let form = Form::new().part("file", part);
        let req = self.client.post(self.url(endpoint)?).multipart(form);
        let body = self.send(endpoint, req).await?;
        if body.trim().is_empty() {
            return Ok(UploadReceipt::default());
        }
        Self::decode(endpoint, &body)
    }

    async fn switch_dataset(&self, dataset: &str) -> Result<(), ClientError> {
        let endpoint = Endpoint::SwitchDataset;
        let req = self
            .client
            .post(self.url(endpoint)?)
            .json(&SwitchDataset { dataset });
        self.send(endpoint, req).await?;
        log_switch(Domain::Dataset, dataset);
        Ok(())
    }

    async fn switch_model(&self, model: &str) -> Result<(), ClientError> {
        let endpoint = Endpoint::SwitchModel;
        let req = self
            .client
            .post(self.url(endpoint)?)
            .json(&SwitchModel { model });
        self.send(endpoint, req).await?;
        log_switch(Domain::Model, model);
        Ok(())
    }

    async fn predict(&self, input: &PredictionInput) -> Result<Prediction, ClientError> {
        let endpoint = Endpoint::Predict;
        let req = self.client.post(self.url(endpoint)?).json(input);
        let body = self.send(endpoint, req).await?;
        let prediction: Prediction = Self::decode(endpoint, &body)?;
        let top = prediction
            .probabilities
            .get(&prediction.prediction)
            .copied()
            .unwrap_or(0.0);
        log_prediction(&prediction.prediction, top);
        Ok(prediction)
    }
}
