use salvo::http::ParseError;
use salvo::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

pub mod contacts;
pub mod health;
pub mod opportunities;

#[derive(Debug, Error)]
pub(crate) enum BodyError {
    #[error("failed to read request body: {0}")]
    Read(#[from] ParseError),
    #[error("request body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes the body as JSON whatever the `Content-Type` header says. Browser
/// `fetch` calls with a string body are sent as `text/plain`.
pub(crate) async fn parse_body<T>(req: &mut Request) -> Result<T, BodyError>
where
    T: DeserializeOwned,
{
    let payload = req.payload().await?;
    Ok(serde_json::from_slice(payload)?)
}

pub(crate) fn render_json<T>(res: &mut Response, status: StatusCode, body: T)
where
    T: Serialize + Send,
{
    res.status_code(status);
    res.render(Json(body));
}

pub(crate) fn render_error(res: &mut Response, status: StatusCode, message: &str) {
    res.status_code(status);
    res.render(Json(json!({ "error": message })));
}
