/// Response module.
///
/// Everything the cutout service sends back goes through a
/// `CutoutResponse`, whether it's cutout data or an error.
use crate::error::BossError;
use crate::renderers::{EncodedPayload, JSON_MEDIA_TYPE};
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use rocket::Request;
use std::io::Cursor;


#[derive(Clone, Debug, PartialEq)]
pub struct CutoutResponse {
    status: u16,
    /// Error code and message; only set for errors.
    code: Option<u32>,
    message: Option<String>,
    body: Vec<u8>,
    content_type: &'static str,
}

impl CutoutResponse {
    /// Wrap a rendered payload.  Error-json payloads become error responses.
    pub fn from_payload(payload: EncodedPayload) -> CutoutResponse {
        if let Some(error) = payload.error() {
            return CutoutResponse::from_error(error);
        }
        CutoutResponse {
            status: payload.status(),
            code: None,
            message: None,
            content_type: payload.media_type(),
            body: payload.into_bytes(),
        }
    }

    /// JSON `{status, code, message}` with the error's status.
    pub fn from_error(error: &BossError) -> CutoutResponse {
        CutoutResponse {
            status: error.status(),
            code: Some(error.code()),
            message: Some(error.message().to_string()),
            body: error.to_body(),
            content_type: JSON_MEDIA_TYPE,
        }
    }

    pub fn is_error(&self) -> bool {
        self.code.is_some()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn code(&self) -> Option<u32> {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }
}

impl From<EncodedPayload> for CutoutResponse {
    fn from(payload: EncodedPayload) -> CutoutResponse {
        CutoutResponse::from_payload(payload)
    }
}

impl From<BossError> for CutoutResponse {
    fn from(error: BossError) -> CutoutResponse {
        CutoutResponse::from_error(&error)
    }
}

impl From<Result<EncodedPayload, BossError>> for CutoutResponse {
    fn from(result: Result<EncodedPayload, BossError>) -> CutoutResponse {
        match result {
            Ok(payload) => CutoutResponse::from_payload(payload),
            Err(error) => CutoutResponse::from_error(&error),
        }
    }
}

impl<'r> Responder<'r, 'static> for CutoutResponse {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        let content_type =
            ContentType::parse_flexible(self.content_type).unwrap_or(ContentType::Binary);
        Response::build()
            .status(Status::new(self.status))
            .header(content_type)
            .sized_body(self.body.len(), Cursor::new(self.body))
            .ok()
    }
}
