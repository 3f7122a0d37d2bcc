//! Blocking executor backed by `ureq`.

use tracing::debug;

use crate::call::Executor;
use crate::config::ExecutorConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Runs each request as a single blocking GET.
///
/// Status-code-as-error is turned off so 4xx/5xx answers come back as
/// `HttpResponse` values for the core to judge.
#[derive(Debug, Clone)]
pub struct UreqExecutor {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for UreqExecutor {
    fn default() -> Self {
        Self::new(&ExecutorConfig::default())
    }
}

impl Executor for UreqExecutor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut response = self
            .agent
            .get(&request.url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::TransportFailure {
                status: Some(status),
                message: format!("reading body: {e}"),
            })?;

        debug!(url = %request.redacted_url(), status, "exchange complete");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
