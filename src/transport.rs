use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::io::{Cursor, Read};

use crate::client::ClientConfig;
use crate::error::{Error, Result};

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// An HTTP response whose body has not been read yet.
pub struct StreamingResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Box<dyn Read + Send>,
}

impl StreamingResponse {
    /// Reads the rest of the body into memory.
    pub fn into_response(mut self) -> Result<Response> {
        let mut body = Vec::new();
        self.body.read_to_end(&mut body).map_err(|e| {
            Error::with_source(format!("Error sending request to host server: {}", e), e)
        })?;
        Ok(Response {
            status: self.status,
            headers: self.headers,
            body,
        })
    }
}

impl From<Response> for StreamingResponse {
    fn from(resp: Response) -> Self {
        Self {
            status: resp.status,
            headers: resp.headers,
            body: Box::new(Cursor::new(resp.body)),
        }
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// The HTTP session a [`Client`](crate::Client) sends its requests through.
///
/// Failures to reach the server are reported as [`Error`]; any response that
/// arrives, whatever its status, is returned as-is.
pub trait Transport {
    fn get(&self, url: &str, params: &[(&str, String)], headers: &HeaderMap) -> Result<Response>;

    /// Sends `form` as `application/x-www-form-urlencoded`.
    fn post(&self, url: &str, form: &[(&str, String)], headers: &HeaderMap) -> Result<Response>;

    /// GET for downloads: the body is handed over unread.
    ///
    /// The default buffers through [`get`](Transport::get).
    fn get_stream(
        &self,
        url: &str,
        params: &[(&str, String)],
        headers: &HeaderMap,
    ) -> Result<StreamingResponse> {
        self.get(url, params, headers).map(StreamingResponse::from)
    }
}

/// [`Transport`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpSession {
    http: HttpClient,
}

impl HttpSession {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("bdcapi-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("bdcapi-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(cfg.timeout);

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::with_source(format!("failed to build HTTP client: {}", e), e))?;
        Ok(Self { http })
    }

    fn read(result: reqwest::Result<reqwest::blocking::Response>) -> Result<Response> {
        let resp = result.map_err(send_error)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().map_err(send_error)?.to_vec();
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

fn send_error(e: reqwest::Error) -> Error {
    Error::with_source(format!("Error sending request to host server: {}", e), e)
}

impl Transport for HttpSession {
    fn get(&self, url: &str, params: &[(&str, String)], headers: &HeaderMap) -> Result<Response> {
        let mut req = self.http.get(url).headers(headers.clone());
        if !params.is_empty() {
            req = req.query(params);
        }
        Self::read(req.send())
    }

    fn post(&self, url: &str, form: &[(&str, String)], headers: &HeaderMap) -> Result<Response> {
        Self::read(self.http.post(url).headers(headers.clone()).form(form).send())
    }

    fn get_stream(
        &self,
        url: &str,
        params: &[(&str, String)],
        headers: &HeaderMap,
    ) -> Result<StreamingResponse> {
        let mut req = self.http.get(url).headers(headers.clone());
        if !params.is_empty() {
            req = req.query(params);
        }
        let resp = req.send().map_err(send_error)?;
        Ok(StreamingResponse {
            status: resp.status(),
            headers: resp.headers().clone(),
            body: Box::new(resp),
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct Call {
        pub(crate) method: &'static str,
        pub(crate) url: String,
        pub(crate) params: Vec<(String, String)>,
        pub(crate) headers: HeaderMap,
    }

    #[derive(Debug)]
    enum Canned {
        Reply(Response),
        // Body is delivered, then the connection drops.
        Broken(Response),
        Fail(String),
    }

    struct DroppedConnection;

    impl Read for DroppedConnection {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
        }
    }

    /// Replays canned responses in order and records every request.
    #[derive(Debug, Default)]
    pub(crate) struct FakeTransport {
        responses: RefCell<VecDeque<Canned>>,
        calls: RefCell<Vec<Call>>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn reply(self, response: Response) -> Self {
            self.responses.borrow_mut().push_back(Canned::Reply(response));
            self
        }

        pub(crate) fn reply_json(self, value: serde_json::Value) -> Self {
            let body = serde_json::to_vec(&value).unwrap();
            self.reply(Response::new(StatusCode::OK, body))
        }

        pub(crate) fn reply_broken(self, response: Response) -> Self {
            self.responses.borrow_mut().push_back(Canned::Broken(response));
            self
        }

        pub(crate) fn fail(self, message: &str) -> Self {
            self.responses
                .borrow_mut()
                .push_back(Canned::Fail(message.to_string()));
            self
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn record(
            &self,
            method: &'static str,
            url: &str,
            params: &[(&str, String)],
            headers: &HeaderMap,
        ) -> Canned {
            self.calls.borrow_mut().push(Call {
                method,
                url: url.to_string(),
                params: params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                headers: headers.clone(),
            });
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Canned::Fail("no canned response left".to_string()))
        }
    }

    fn buffered(canned: Canned) -> Result<Response> {
        match canned {
            Canned::Reply(resp) | Canned::Broken(resp) => Ok(resp),
            Canned::Fail(message) => Err(Error::new(message)),
        }
    }

    impl Transport for FakeTransport {
        fn get(
            &self,
            url: &str,
            params: &[(&str, String)],
            headers: &HeaderMap,
        ) -> Result<Response> {
            buffered(self.record("GET", url, params, headers))
        }

        fn post(
            &self,
            url: &str,
            form: &[(&str, String)],
            headers: &HeaderMap,
        ) -> Result<Response> {
            buffered(self.record("POST", url, form, headers))
        }

        fn get_stream(
            &self,
            url: &str,
            params: &[(&str, String)],
            headers: &HeaderMap,
        ) -> Result<StreamingResponse> {
            match self.record("GET", url, params, headers) {
                Canned::Broken(resp) => Ok(StreamingResponse {
                    status: resp.status,
                    headers: resp.headers,
                    body: Box::new(Cursor::new(resp.body).chain(DroppedConnection)),
                }),
                other => buffered(other).map(StreamingResponse::from),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffering_a_stream_keeps_status_and_headers() {
        let mut resp = Response::new(StatusCode::ACCEPTED, b"abc".to_vec());
        resp.headers
            .insert("x-test", HeaderValue::from_static("1"));
        let back = StreamingResponse::from(resp).into_response().unwrap();
        assert_eq!(back.status, StatusCode::ACCEPTED);
        assert_eq!(back.headers.get("x-test").unwrap(), "1");
        assert_eq!(back.body, b"abc");
    }
}
