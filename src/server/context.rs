use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Extensions, HeaderMap, Method, Request, Response, StatusCode};
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use crate::binding::RequestFacade;
use crate::handler::SharedError;
use crate::router::ParamVec;

/// Header carrying a caller-supplied request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ULID identifying one request in logs.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse a valid incoming ID, otherwise mint a new one.
    #[must_use]
    pub fn from_header_or_new(value: Option<&str>) -> Self {
        value
            .and_then(|raw| raw.parse::<RequestId>().ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn as_ulid(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

impl Serialize for RequestId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

type QueryVec = SmallVec<[(String, String); 8]>;

fn parse_query(query: Option<&str>) -> QueryVec {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// Per-request state shared by middlewares, hooks and handlers.
///
/// Wraps the incoming request, the captured path parameters, a typed
/// scratch space ([`Context::locals`]), the response being built and the
/// errors handled so far.
pub struct Context {
    request: Request<Vec<u8>>,
    request_id: RequestId,
    path_params: ParamVec,
    query: QueryVec,
    locals: Extensions,
    errors: Vec<SharedError>,
    status: u16,
    response_headers: HeaderMap,
    body: Vec<u8>,
    written: bool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("path_params", &self.path_params)
            .field("status", &self.status)
            .field("errors", &self.errors.len())
            .finish()
    }
}

impl Context {
    #[must_use]
    pub fn new(request: Request<Vec<u8>>) -> Self {
        let request_id = RequestId::from_header_or_new(
            request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
        );
        let query = parse_query(request.uri().query());
        Context {
            request,
            request_id,
            path_params: ParamVec::new(),
            query,
            locals: Extensions::new(),
            errors: Vec::new(),
            status: StatusCode::OK.as_u16(),
            response_headers: HeaderMap::new(),
            body: Vec::new(),
            written: false,
        }
    }

    #[must_use]
    pub fn request(&self) -> &Request<Vec<u8>> {
        &self.request
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.request.body()
    }

    /// First value of query key `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn path_params(&self) -> &ParamVec {
        &self.path_params
    }

    pub fn set_path_params(&mut self, params: ParamVec) {
        self.path_params = params;
    }

    /// Typed per-request scratch space.
    #[must_use]
    pub fn locals(&self) -> &Extensions {
        &self.locals
    }

    pub fn locals_mut(&mut self) -> &mut Extensions {
        &mut self.locals
    }

    /// Errors handled during this request, oldest first.
    #[must_use]
    pub fn errors(&self) -> &[SharedError] {
        &self.errors
    }

    pub fn push_error(&mut self, err: SharedError) {
        self.errors.push(err);
    }

    /// Set the response status without writing a body.
    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    /// Add a response header.
    ///
    /// # Errors
    ///
    /// Fails if `name` or `value` is not a valid header.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self, http::Error> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.response_headers.insert(name, value);
        Ok(self)
    }

    /// Write `body` with `content_type` and `status`.
    pub fn send(&mut self, status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) {
        self.status = status;
        self.response_headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body.into();
        self.written = true;
    }

    /// Serialize `value` as the JSON response body.
    ///
    /// # Errors
    ///
    /// Fails if `value` cannot be serialized; the response is left unchanged.
    pub fn json<T: Serialize + ?Sized>(
        &mut self,
        status: u16,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.send(status, "application/json", body);
        Ok(())
    }

    pub fn text(&mut self, status: u16, body: impl Into<String>) {
        self.send(status, "text/plain; charset=utf-8", body.into());
    }

    /// Finish the response with `status` and no body.
    pub fn empty(&mut self, status: u16) {
        self.status = status;
        self.body.clear();
        self.written = true;
    }

    /// Whether a body or final status was written.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.written
    }

    #[must_use]
    pub fn response_status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    #[must_use]
    pub fn response_body(&self) -> &[u8] {
        &self.body
    }

    /// Build the HTTP response; invalid status codes become `500`.
    #[must_use]
    pub fn into_response(self) -> Response<Vec<u8>> {
        let mut response = Response::new(self.body);
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *response.headers_mut() = self.response_headers;
        response
    }
}

impl RequestFacade for Context {
    fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }
}
