use crate::api::api_error::APIError;
use crate::client_id::Transport;
use crate::dns::Pipeline;
use crate::error::Error;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use trust_dns_server::client::op::Message;

pub(super) const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

#[derive(Clone)]
struct DohState {
    pipeline: Arc<Pipeline>,
}

#[derive(Deserialize, Debug, Default)]
struct DnsParams {
    dns: Option<String>,
}

/// Every path is routed to the query handler; the path itself carries the client id and is
/// checked by the pipeline.
pub(super) fn new(pipeline: Arc<Pipeline>, timeout: Duration) -> Router {
    Router::new()
        .fallback(dns_query)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(DohState { pipeline })
}

async fn dns_query(
    State(state): State<DohState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<DnsParams>,
    body: Bytes,
) -> Result<Response, APIError> {
    let wire = match method {
        Method::GET => {
            let dns = params
                .dns
                .ok_or(Error::InvalidDoHRequest("missing dns parameter"))?;
            // Padding is tolerated even though RFC-8484 forbids it.
            URL_SAFE_NO_PAD
                .decode(dns.trim_end_matches('='))
                .map_err(Error::from)?
        }
        Method::POST => {
            let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
            if content_type != Some(DNS_MESSAGE_CONTENT_TYPE) {
                return Err(Error::InvalidDoHRequest("unsupported content type").into());
            }
            body.to_vec()
        }
        _ => return Err(Error::MethodNotAllowed.into()),
    };

    let path = urlencoding::decode(uri.path())
        .map_err(|_| Error::InvalidDoHRequest("path isn't valid UTF-8 once decoded"))?;
    let response = answer(&state.pipeline, &path, &wire).await?;
    Ok(([(CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE)], response).into_response())
}

async fn answer(pipeline: &Pipeline, path: &str, wire: &[u8]) -> Result<Vec<u8>, Error> {
    if wire.len() > usize::from(u16::MAX) {
        return Err(Error::MessageTooLarge(wire.len()));
    }
    let request = Message::from_vec(wire).map_err(Error::MalformedMessage)?;
    let transport = Transport::Https {
        path: path.to_string(),
    };
    let response = pipeline.handle_message(transport, &request).await?;
    Ok(response.to_vec()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::pipeline::tests::{query, test_pipeline};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use trust_dns_server::client::op::ResponseCode;
    use trust_dns_server::client::rr::RecordType;

    async fn router() -> Router {
        new(Arc::new(test_pipeline().await), Duration::from_secs(5))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn encoded_query() -> String {
        URL_SAFE_NO_PAD.encode(query("router.lan.", RecordType::A).to_vec().unwrap())
    }

    async fn dns_response(response: Response) -> Message {
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], DNS_MESSAGE_CONTENT_TYPE);
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        Message::from_vec(&bytes).unwrap()
    }

    async fn error_response(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn get_query() {
        for path in ["/dns-query", "/dns-query/", "/dns-query/laptop", "/dns-query/laptop/"] {
            let uri = format!("{path}?dns={}", encoded_query());
            let response = router().await.oneshot(get(&uri)).await.unwrap();
            let message = dns_response(response).await;
            assert_eq!(message.response_code(), ResponseCode::NoError, "{path}");
            assert_eq!(message.answers().len(), 1, "{path}");
        }
    }

    #[tokio::test]
    async fn post_query() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/dns-query/laptop")
            .header(CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE)
            .body(Body::from(query("nas.lan.", RecordType::AAAA).to_vec().unwrap()))
            .unwrap();
        let response = router().await.oneshot(request).await.unwrap();
        let message = dns_response(response).await;
        assert_eq!(message.id(), 4242);
        assert_eq!(message.answers().len(), 1);
    }

    #[tokio::test]
    async fn invalid_client_id_paths() {
        let cases = [
            (
                "/dns-query/a/b",
                r#"client id check: invalid path "/dns-query/a/b": extra parts"#,
            ),
            ("/other", r#"client id check: invalid path "/other""#),
            (
                "/dns-query/!!!",
                r#"client id check: invalid client id: invalid char '!' at index 0 in client id "!!!""#,
            ),
        ];
        for (path, want) in cases {
            let uri = format!("{path}?dns={}", encoded_query());
            let response = router().await.oneshot(get(&uri)).await.unwrap();
            let (status, body) = error_response(response).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(body, json!({ "error": want }), "{path}");
        }
    }

    #[tokio::test]
    async fn percent_encoded_paths() {
        let uri = format!("/dns-query/%6Captop?dns={}", encoded_query());
        let response = router().await.oneshot(get(&uri)).await.unwrap();
        let message = dns_response(response).await;
        assert_eq!(message.answers().len(), 1);

        let uri = format!("/dns-query/a%2Fb?dns={}", encoded_query());
        let response = router().await.oneshot(get(&uri)).await.unwrap();
        let (status, body) = error_response(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": r#"client id check: invalid path "/dns-query/a/b": extra parts"#})
        );

        let uri = format!("/dns-query/%FF?dns={}", encoded_query());
        let response = router().await.oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_requests() {
        let response = router().await.oneshot(get("/dns-query")).await.unwrap();
        let (status, body) = error_response(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "invalid DNS-over-HTTPS request: missing dns parameter"})
        );

        let response = router().await.oneshot(get("/dns-query?dns=!!")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router().await.oneshot(get("/dns-query?dns=AAAA")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/dns-query")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = router().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn other_methods_not_allowed() {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/dns-query")
            .body(Body::empty())
            .unwrap();
        let response = router().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
