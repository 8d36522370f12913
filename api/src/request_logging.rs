use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::{
    Error,
    body::MessageBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
};
use tracing::{Instrument, info, warn};
use uuid::Uuid;

/// Logs the start and the completion of every request inside a request span.
///
/// Operations may stay pending for as long as their batch is open, so the
/// completion event carries the full wait in `duration_ms`.
pub struct RequestLogging;

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggingMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingMiddleware { service }))
    }
}

pub struct RequestLoggingMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();

        let content_length = req
            .headers()
            .get("content-length")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let remote_addr = req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_string();

        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "HTTP request",
            method = %req.method(),
            path = %req.path(),
            content_length = content_length,
            remote_addr = %remote_addr,
            request_id = %request_id,
        );

        {
            let _enter = span.enter();
            info!("HTTP request received");
        }

        let fut = self.service.call(req);

        Box::pin(
            async move {
                let res = fut.await;
                let duration = start_time.elapsed();

                match res {
                    Ok(response) => {
                        let status_code = response.status().as_u16();
                        if response.status().is_success() {
                            info!(
                                status_code,
                                duration_ms = duration.as_millis(),
                                "HTTP request completed"
                            );
                        } else {
                            warn!(
                                status_code,
                                duration_ms = duration.as_millis(),
                                "HTTP request failed"
                            );
                        }

                        Ok(response)
                    }
                    Err(error) => {
                        warn!(
                            error = %error,
                            duration_ms = duration.as_millis(),
                            "HTTP request completed with error"
                        );

                        Err(error)
                    }
                }
            }
            .instrument(span),
        )
    }
}
