use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON body extractor whose rejections are JSON too, keeping the status axum
/// picked (400 syntax, 415 content type, 422 shape).
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_string();
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(reject(&path, rejection)),
        }
    }
}

fn reject(path: &str, rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let message = rejection.body_text();
    tracing::warn!("Rejected request body on {}: {}", path, message);
    (
        status,
        Json(json!({
            "message": message,
            "status": status.as_u16(),
        })),
    )
        .into_response()
}
