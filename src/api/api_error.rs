use crate::error::Error;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub(crate) struct APIError(anyhow::Error);

impl APIError {
    fn status(&self) -> StatusCode {
        if let Some(rejection) = self.0.downcast_ref::<JsonRejection>() {
            return rejection_status(rejection);
        }
        match self.0.downcast_ref::<Error>() {
            Some(Error::NotImplemented) => StatusCode::NOT_IMPLEMENTED,
            Some(
                Error::ClientIdCheck(_)
                | Error::Dhcp(_)
                | Error::InvalidDoHRequest(_)
                | Error::InvalidDoHEncoding(_)
                | Error::MalformedMessage(_),
            ) => StatusCode::BAD_REQUEST,
            Some(Error::MethodNotAllowed) => StatusCode::METHOD_NOT_ALLOWED,
            Some(Error::MessageTooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            Some(Error::JsonExtractorRejection(err)) => rejection_status(err),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn rejection_status(rejection: &JsonRejection) -> StatusCode {
    match rejection {
        JsonRejection::JsonDataError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        JsonRejection::JsonSyntaxError(_) => StatusCode::BAD_REQUEST,
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let status = self.status();
        let any_err = self.0;
        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!("request failed: {any_err:?}");
        } else {
            tracing::debug!("request rejected: {any_err}");
        }
        let body = Json(json!({
            "error": format!("{any_err}"),
        }));
        (status, body).into_response()
    }
}

impl<E> From<E> for APIError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_id::{ClientIdError, GrammarError};
    use crate::dhcp::DhcpError;

    fn status_of(err: Error) -> StatusCode {
        APIError::from(err).into_response().status()
    }

    #[test]
    fn status_codes() {
        assert_eq!(status_of(Error::NotImplemented), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            status_of(Error::Dhcp(DhcpError::IncompleteConfig)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::ClientIdCheck(ClientIdError::Invalid(GrammarError::TooLong {
                id: "x".repeat(65),
                max: 64,
            }))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(Error::MethodNotAllowed), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            status_of(Error::IO(std::io::Error::from(std::io::ErrorKind::Other))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
