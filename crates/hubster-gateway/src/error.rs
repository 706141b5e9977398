use axum::{Json, http::StatusCode};
use hubster_core::ProposalError;
use hubster_platform::ErrorBody;
use tracing::error;

pub type ApiError = (StatusCode, Json<ErrorBody>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn error_response(status: StatusCode, error: &str, details: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            details: details.into(),
        }),
    )
}

pub fn invalid_request(details: impl Into<String>) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, "Invalid request", details)
}

/// Gateway and persistence failures keep their raw text in the logs only.
pub fn proposal_error(err: ProposalError) -> ApiError {
    match err {
        ProposalError::Validation(message) => invalid_request(message),
        ProposalError::InvalidTransition { .. } => {
            error_response(StatusCode::CONFLICT, "Invalid status transition", err.to_string())
        }
        ProposalError::NotFound { .. } => {
            error_response(StatusCode::NOT_FOUND, "Not found", err.to_string())
        }
        ProposalError::LinkExpired { .. } => {
            error_response(StatusCode::GONE, "Link expired", err.to_string())
        }
        ProposalError::LinkSuperseded { .. } => {
            error_response(StatusCode::GONE, "Link replaced", err.to_string())
        }
        ProposalError::Conflict(_) => {
            error_response(StatusCode::CONFLICT, "Concurrent update", err.to_string())
        }
        ProposalError::GatewayLookup(_) | ProposalError::GatewayCreate(_) => {
            error!("payment gateway failure: {err:#}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Payment gateway error",
                "the payment provider request failed",
            )
        }
        ProposalError::Persistence(_) => {
            error!("persistence failure: {err:#}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "the request could not be completed",
            )
        }
    }
}
