//! One operation, ready to run under any driving model.
//!
//! # Design
//! A `Call<T>` pairs a built request with the parser for its response, so
//! each API operation is written once. The caller picks how the exchange happens:
//! hand `request()` to its own transport and feed the result to `parse`, run
//! it on a blocking [`Executor`], or await it on an [`AsyncExecutor`].
//! Nothing here retries; a failed exchange is reported as is.

use std::fmt;
use std::future::Future;

use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Blocking transport: one GET per call.
///
/// Implementations return non-2xx responses as `Ok(HttpResponse)` and
/// reserve `Err(ApiError::TransportFailure)` for exchanges that did not
/// complete at all.
pub trait Executor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Non-blocking transport. Same contract as [`Executor`].
pub trait AsyncExecutor {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

type Parser<T> = fn(HttpResponse) -> Result<T, ApiError>;

/// A built request paired with the decoder for its response.
pub struct Call<T> {
    request: HttpRequest,
    parser: Parser<T>,
}

impl<T> Call<T> {
    pub(crate) fn new(request: HttpRequest, parser: Parser<T>) -> Self {
        Self { request, parser }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Decode a response obtained for [`Call::request`].
    pub fn parse(&self, response: HttpResponse) -> Result<T, ApiError> {
        let result = (self.parser)(response);
        if let Err(err) = &result {
            debug!(url = %self.request.redacted_url(), error = %err, "response rejected");
        }
        result
    }

    /// Split into the request and its decoder, for hosts that keep the two
    /// apart across an I/O boundary.
    pub fn into_parts(self) -> (HttpRequest, Parser<T>) {
        (self.request, self.parser)
    }

    pub fn execute<E: Executor>(&self, executor: &E) -> Result<T, ApiError> {
        let response = executor.execute(&self.request)?;
        self.parse(response)
    }

    /// Drive the call on a non-blocking executor. Nothing is sent until the
    /// returned future is polled.
    pub async fn execute_async<E: AsyncExecutor>(self, executor: &E) -> Result<T, ApiError> {
        let response = executor.execute(self.request.clone()).await?;
        self.parse(response)
    }
}

impl<T> fmt::Debug for Call<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("url", &self.request.redacted_url())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct Canned {
        response: HttpResponse,
        seen: RefCell<Vec<String>>,
    }

    impl Executor for Canned {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.url.clone());
            Ok(self.response.clone())
        }
    }

    struct Unreachable;

    impl Executor for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::transport("connection refused"))
        }
    }

    fn body_len(response: HttpResponse) -> Result<usize, ApiError> {
        Ok(response.body.len())
    }

    fn call() -> Call<usize> {
        Call::new(
            HttpRequest {
                url: "http://localhost/x?auth_token=t".to_string(),
            },
            body_len,
        )
    }

    #[test]
    fn execute_sends_request_once_and_parses() {
        let executor = Canned {
            response: HttpResponse::new(200, "abcd"),
            seen: RefCell::new(Vec::new()),
        };
        assert_eq!(call().execute(&executor).unwrap(), 4);
        assert_eq!(executor.seen.borrow().len(), 1);
    }

    #[test]
    fn transport_errors_pass_through_untouched() {
        let err = call().execute(&Unreachable).unwrap_err();
        assert!(matches!(err, ApiError::TransportFailure { status: None, .. }));
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", call());
        assert!(rendered.contains("auth_token=***"));
        assert!(!rendered.contains("auth_token=t\""));
    }
}
