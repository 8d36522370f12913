use std::string::FromUtf8Error;

use actix_web::{
    HttpResponse, Responder, ResponseError,
    http::{StatusCode, header::ContentType},
    post,
    web::{Bytes, Data},
};
use batchsum::concurrency::barrier::BarrierError;
use batchsum::dispatcher::WorkDispatcher;
use batchsum::error::CoordinatorError;
use thiserror::Error;

use crate::routes::ErrorMessage;

#[derive(Debug, Error)]
pub enum SumError {
    #[error("the request body is not valid UTF-8")]
    InvalidEncoding(#[from] FromUtf8Error),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

impl SumError {
    pub fn to_message(&self) -> String {
        match self {
            // A cancelled worker is an internal failure, its details stay in the logs
            SumError::Coordinator(CoordinatorError::WorkerCancelled) => {
                "internal server error".to_string()
            }
            e => e.to_string(),
        }
    }
}

impl ResponseError for SumError {
    fn status_code(&self) -> StatusCode {
        match self {
            SumError::InvalidEncoding(_) => StatusCode::BAD_REQUEST,
            SumError::Coordinator(CoordinatorError::InvalidCommand(_)) => StatusCode::BAD_REQUEST,
            SumError::Coordinator(CoordinatorError::Barrier(BarrierError::ReleaseInProgress)) => {
                StatusCode::CONFLICT
            }
            SumError::Coordinator(CoordinatorError::WorkerCancelled) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_message(),
        };
        let body =
            serde_json::to_string(&error_message).expect("failed to serialize error message");
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(body)
    }
}

/// Runs the operation carried by the body and answers with `<sum> <token>`.
///
/// Contributions only get a response once their batch is released.
#[post("/")]
pub async fn submit_operation(
    body: Bytes,
    dispatcher: Data<WorkDispatcher>,
) -> Result<impl Responder, SumError> {
    let body = String::from_utf8(body.to_vec())?;
    let result = dispatcher.dispatch(body).await?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(result.to_string()))
}
