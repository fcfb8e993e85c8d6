/*!
Transport independent handling of a predict request: validate, fetch,
classify and turn the outcome into a status code and a body.
*/

use crate::fetch::{Fetch, FetchError};
use lesion_core::{LesionError, ModelKind, Pipeline, Prediction};
use serde::Deserialize;
use thiserror::Error;

const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// Everything that can make a predict request fail.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("invalid model type {0:?}")]
    InvalidModelType(String),

    #[error("missing url")]
    MissingUrl,

    #[error("failed fetching image")]
    FetchError(#[from] FetchError),

    #[error("classification failed")]
    Pipeline(#[from] LesionError),
}

impl RequestError {
    /// The HTTP status reported for this error.
    pub fn status(&self) -> u16 {
        match self {
            RequestError::InvalidModelType(_) | RequestError::MissingUrl => 400,
            RequestError::FetchError(_) | RequestError::Pipeline(_) => 500,
        }
    }
}

#[derive(Deserialize)]
struct PredictRequest {
    url: Option<String>,
}

/// A finished response, ready for the transport to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
    pub json: bool,
}

impl Reply {
    fn json(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            json: true,
        }
    }

    fn internal_error() -> Self {
        Self {
            status: 500,
            body: INTERNAL_ERROR_BODY.as_bytes().to_vec(),
            json: false,
        }
    }
}

/// Handles predict requests against a shared [`Pipeline`].
pub struct Handler {
    pipeline: Pipeline,
    fetcher: Box<dyn Fetch>,
}

impl Handler {
    pub fn new(pipeline: Pipeline, fetcher: impl Fetch + 'static) -> Self {
        Self {
            pipeline,
            fetcher: Box::new(fetcher),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Handle one request. `model_type` of `None` selects the default model.
    ///
    /// Client errors are answered with a JSON error message, everything
    /// else is logged and answered with a bare 500.
    pub fn handle(&self, model_type: Option<&str>, body: &[u8]) -> Reply {
        match self.predict(model_type, body) {
            Ok(predictions) => {
                log::debug!("predictions: {:?}", predictions);
                match serde_json::to_vec(&predictions) {
                    Ok(body) => Reply::json(200, body),
                    Err(err) => {
                        log::error!("failed serializing predictions: {}", err);
                        Reply::internal_error()
                    }
                }
            }
            Err(err) if err.status() == 400 => {
                log::warn!("rejected request: {}", err);
                let body = serde_json::json!({ "error": err.to_string() });
                Reply::json(400, body.to_string().into_bytes())
            }
            Err(err) => {
                log::error!("request failed: {:#}", anyhow::Error::new(err));
                Reply::internal_error()
            }
        }
    }

    fn predict(
        &self,
        model_type: Option<&str>,
        body: &[u8],
    ) -> Result<Vec<Prediction>, RequestError> {
        let kind = match model_type {
            Some(name) => name
                .parse::<ModelKind>()
                .map_err(|_| RequestError::InvalidModelType(name.to_owned()))?,
            None => ModelKind::default(),
        };

        let url = parse_url(body)?;
        let bytes = self.fetcher.fetch(&url)?;

        Ok(self.pipeline.classify(kind, &bytes)?)
    }
}

fn parse_url(body: &[u8]) -> Result<String, RequestError> {
    let request: PredictRequest =
        serde_json::from_slice(body).map_err(|_| RequestError::MissingUrl)?;

    match request.url {
        Some(url) if !url.trim().is_empty() => Ok(url),
        _ => Err(RequestError::MissingUrl),
    }
}
