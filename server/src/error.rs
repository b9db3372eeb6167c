use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Request-terminating failures. Messages are user-facing (the frontend
/// renders `detail` verbatim); storage variants keep their source
/// server-side and answer with a generic message only.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("El campo '{0}' debe contener solo números")]
    NonNumericField(&'static str),

    #[error("El campo '{0}' no tiene una longitud válida")]
    FieldLength(&'static str),

    #[error("Debes aceptar el consentimiento para continuar")]
    ConsentRequired,

    #[error("Captcha inválido o faltante")]
    CaptchaMissing,

    #[error("Captcha inválido")]
    CaptchaRejected,

    #[error("Error validando captcha")]
    CaptchaUnavailable,

    #[error("Barrio inválido")]
    UnknownNeighborhood,

    #[error("El barrio no pertenece al municipio seleccionado")]
    NeighborhoodMismatch,

    #[error("Líder inválido")]
    UnknownLeader,

    #[error("Coordinador inválido")]
    UnknownCoordinator,

    #[error("El líder no pertenece a este coordinador")]
    LeaderMismatch,

    #[error("Error guardando el registro")]
    SaveFailed(#[source] sqlx::Error),

    #[error("Error interno del servidor")]
    Database(#[from] sqlx::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::SaveFailed(source) | AppError::Database(source) = &self {
            error!("Database failure: {source}");
        }

        let status = match &self {
            AppError::CaptchaMissing | AppError::CaptchaRejected => StatusCode::BAD_REQUEST,
            AppError::CaptchaUnavailable => StatusCode::BAD_GATEWAY,
            AppError::SaveFailed(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };

        let body = ErrorBody {
            detail: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::AppError;

    #[test]
    fn test_client_input_errors_are_unprocessable() {
        assert_eq!(
            AppError::NonNumericField("document").into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::ConsentRequired.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::NeighborhoodMismatch.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::LeaderMismatch.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_captcha_errors_keep_their_classes() {
        assert_eq!(
            AppError::CaptchaMissing.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::CaptchaRejected.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::CaptchaUnavailable.into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_storage_errors_stay_generic() {
        let response = AppError::SaveFailed(sqlx::Error::PoolClosed).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
