use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::config::{Overrides, load_config};
use crate::credentials::basic_auth_header;
use crate::error::{Error, Result, format_status_error};
use crate::filters::{DatacollectionFilter, FileFilter, Names};
use crate::models::{Destination, QueryInfo, QueryStatus, SaveReceipt, Selection, TaskInfo};
use crate::object_id::validate_object_id;
use crate::reply::{Reply, error_in_body};
use crate::transport::{HttpSession, Response, StreamingResponse, Transport};
use crate::util::{filename_from_disposition, urljoin};

const URL_TASK_NUMBERS: &str = "minos_restapi/tasks_info";
const URL_DOMAINS: &str = "minos_restapi/domains_info";
const URL_DATACOLLECTIONS: &str = "minos_restapi/datacollections";
const URL_FILELIST: &str = "minos_restapi/files";
const URL_QUERY: &str = "minos_restapi/request_data";
const URL_PROGRESS: &str = "minos_restapi/progress";
const URL_DOWNLOAD: &str = "minos_restapi/download";

const QUERY_ACCEPT_TYPES: &str = "application/zip, application/x-hdf";

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Catalog host, e.g. `https://minos.lbl.gov`.
    pub host: String,
    pub username: String,
    /// API key generated under `REST API Key Manager`.
    pub api_key: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Per-request timeout of the HTTP session.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            api_key: api_key.into(),
            verify: true,
            timeout: Duration::from_secs(60),
        }
    }

    /// Loads the configuration from `BDCAPI_*` environment variables and/or `.bdcapirc`.
    pub fn from_env() -> Result<Self> {
        Self::load(None, None, None, None)
    }

    /// Like [`from_env`](Self::from_env), with explicit values taking precedence.
    pub fn load(
        host: Option<String>,
        username: Option<String>,
        api_key: Option<String>,
        verify: Option<bool>,
    ) -> Result<Self> {
        load_config(Overrides {
            host,
            username,
            api_key,
            verify,
        })
    }
}

#[derive(Debug)]
pub struct Client<T = HttpSession> {
    host: String,
    username: String,
    auth: HeaderValue,

    poll_interval: Duration,
    progress: bool,
    fallback_file_name: Option<String>,

    transport: T,
}

#[derive(Debug, serde::Deserialize)]
struct SubmitReply {
    #[serde(default)]
    query_id: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct DatacollectionDoc {
    name: String,
}

impl Client<HttpSession> {
    /// Creates a client for `host` authenticating as `username` with `api_key`.
    pub fn new(
        username: impl Into<String>,
        api_key: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Self> {
        Self::from_config(ClientConfig::new(host, username, api_key))
    }

    /// Creates a client using environment variables and/or `.bdcapirc`.
    ///
    /// Precedence is `BDCAPI_URL` / `BDCAPI_USERNAME` / `BDCAPI_KEY`, then the
    /// file named by `BDCAPI_RC`, then `./.bdcapirc`, then `~/.bdcapirc`.
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    /// Creates a client from whichever values are given, filling the rest in
    /// from the environment and `.bdcapirc` like [`from_env`](Self::from_env).
    pub fn from_options(
        host: Option<String>,
        username: Option<String>,
        api_key: Option<String>,
        verify: Option<bool>,
    ) -> Result<Self> {
        Self::from_config(ClientConfig::load(host, username, api_key, verify)?)
    }

    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        let session = HttpSession::new(&cfg)?;
        Self::with_transport(&cfg, session)
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client that sends its requests through `transport`.
    pub fn with_transport(cfg: &ClientConfig, transport: T) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&basic_auth_header(&cfg.username, &cfg.api_key))
            .map_err(|e| Error::with_source(format!("invalid credentials: {}", e), e))?;
        auth.set_sensitive(true);

        Ok(Self {
            host: cfg.host.clone(),
            username: cfg.username.clone(),
            auth,
            poll_interval: Duration::from_secs(2),
            progress: true,
            fallback_file_name: None,
            transport,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// File name used for local saves when the response carries no `content-disposition`.
    pub fn with_fallback_file_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_file_name = Some(name.into());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Task numbers of the user's organizations, keyed by `"{task name} / {task number}"`.
    pub fn task_numbers(&self) -> Result<BTreeMap<String, TaskInfo>> {
        let (url, resp) = self.send_get(URL_TASK_NUMBERS, &[], HeaderMap::new())?;
        Reply::decode(&resp.body, &url)
    }

    /// Domains per task, for every task or just `task_id` (an empty id means every task).
    pub fn domains(&self, task_id: &str) -> Result<BTreeMap<String, Vec<String>>> {
        validate_object_id(task_id)?;
        let path = format!("{}/{}", URL_DOMAINS, task_id);
        let (url, resp) = self.send_get(&path, &[], HeaderMap::new())?;
        Reply::decode(&resp.body, &url)
    }

    /// Names of the available datacollections, in server order.
    pub fn datacollections(&self, filter: &DatacollectionFilter) -> Result<Vec<String>> {
        let params = filter.params();
        let path = if params.is_empty() {
            format!("{}/", URL_DATACOLLECTIONS)
        } else {
            URL_DATACOLLECTIONS.to_string()
        };
        let (url, resp) = self.send_get(&path, &params, HeaderMap::new())?;

        if resp.body.is_empty() {
            return Err(Error::new("No datacollections found."));
        }
        let docs: Vec<DatacollectionDoc> = Reply::decode(&resp.body, &url)?;
        Ok(docs.into_iter().map(|d| d.name).collect())
    }

    /// File paths per datacollection.
    pub fn files(&self, filter: &FileFilter) -> Result<BTreeMap<String, Vec<String>>> {
        let (url, resp) = self.send_get(URL_FILELIST, &filter.params(), HeaderMap::new())?;
        Reply::decode(&resp.body, &url)
    }

    /// Starts an export query and returns its id.
    pub fn submit(&self, selection: &Selection) -> Result<String> {
        let form = match selection {
            Selection::Files(files) => {
                if files.is_empty() {
                    return Err(Error::new("Please select at least one file."));
                }
                vec![("filepaths", files.joined())]
            }
            Selection::Datacollection(name) => {
                if name.trim().is_empty() {
                    return Err(Error::new(
                        "Please use a datacollection name in string form.",
                    ));
                }
                vec![("datacollection", name.clone())]
            }
        };

        let (url, resp) = self.send_post(URL_QUERY, &form, accept_headers())?;
        let reply: SubmitReply = Reply::decode(&resp.body, &url)?;
        match reply.query_id {
            Some(id) => {
                log::info!("Submitted query {}", id);
                Ok(id)
            }
            None => Err(Error::new(
                "Unknown response received when requesting files!",
            )),
        }
    }

    /// Shorthand for [`submit`](Self::submit) with [`Selection::Files`].
    pub fn start_files_query(&self, files: impl Into<Names>) -> Result<String> {
        self.submit(&Selection::files(files))
    }

    /// Shorthand for [`submit`](Self::submit) with [`Selection::Datacollection`].
    pub fn start_datacollection_query(&self, datacollection: &str) -> Result<String> {
        self.submit(&Selection::datacollection(datacollection))
    }

    /// Current progress and status of a query.
    pub fn poll(&self, query_id: &str) -> Result<QueryInfo> {
        validate_object_id(query_id)?;
        let path = format!("{}/{}", URL_PROGRESS, query_id);
        let (url, resp) = self.send_get(&path, &[], HeaderMap::new())?;
        Reply::decode(&resp.body, &url)
    }

    /// Polls until the query reaches a terminal status and returns that last observation.
    pub fn wait(&self, query_id: &str) -> Result<QueryInfo> {
        validate_object_id(query_id)?;

        let pb = if self.progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} query {prefix}: {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_prefix(query_id.to_string());
            Some(pb)
        } else {
            None
        };

        let mut last_status: Option<QueryStatus> = None;
        loop {
            let info = self.poll(query_id)?;

            if last_status.as_ref() != Some(&info.status) {
                log::info!(
                    "Query {} status: {} ({})",
                    query_id,
                    info.status,
                    info.progress
                );
                if let QueryStatus::Unknown(s) = &info.status {
                    log::warn!("Query {} reported unrecognised status {:?}", query_id, s);
                }
                last_status = Some(info.status.clone());
            }
            if let Some(pb) = &pb {
                pb.set_message(format!("{} ({})", info.status, info.progress));
                pb.tick();
            }

            if info.status.is_terminal() {
                if let Some(pb) = &pb {
                    pb.finish_and_clear();
                }
                return Ok(info);
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Saves the results of a finished query.
    pub fn fetch(&self, query_id: &str, destination: &Destination) -> Result<SaveReceipt> {
        validate_object_id(query_id)?;
        match destination {
            Destination::UserHome => {
                let path = format!("{}/{}", URL_DOWNLOAD, query_id);
                let params = [("jupyterhub", "1".to_string())];
                let (url, resp) = self.send_get(&path, &params, HeaderMap::new())?;
                Reply::decode(&resp.body, &url)
            }
            Destination::LocalDir(dir) => self.save_local(query_id, dir),
        }
    }

    /// Submits `selection`, waits for it and saves the results.
    pub fn export(&self, selection: &Selection, destination: &Destination) -> Result<SaveReceipt> {
        let query_id = self.submit(selection)?;
        let info = self.wait(&query_id)?;
        if !info.status.is_success() {
            return Err(Error::new(format!(
                "Query {} finished with status {}",
                query_id, info.status
            )));
        }
        self.fetch(&query_id, destination)
    }

    fn save_local(&self, query_id: &str, dir: &Path) -> Result<SaveReceipt> {
        if !dir.is_dir() {
            return Err(Error::new(format!(
                "Invalid directory \"{}\".",
                dir.display()
            )));
        }

        let path = format!("{}/{}", URL_DOWNLOAD, query_id);
        let mut resp = self.send_get_stream(&path, &[], accept_headers())?;

        let file_name = match (
            filename_from_disposition(&resp.headers),
            &self.fallback_file_name,
        ) {
            (Ok(name), _) => name,
            (Err(_), Some(fallback)) => fallback.clone(),
            (Err(details), None) => {
                return Err(Error::new(format!(
                    "Error occurred while retrieving file name from response. Details: {}",
                    details
                )));
            }
        };

        let pb = if self.progress {
            Some(download_bar(content_length(&resp.headers)))
        } else {
            None
        };

        let full_path = dir.join(&file_name);
        let mut out = File::create(&full_path).map_err(|e| save_error(&full_path, e))?;
        let written = match copy_chunks(resp.body.as_mut(), &mut out, pb.as_ref()) {
            Ok(n) => n,
            Err(e) => {
                drop(out);
                // Never leave a truncated archive behind.
                let _ = std::fs::remove_file(&full_path);
                if let Some(pb) = &pb {
                    pb.abandon();
                }
                return Err(save_error(&full_path, e));
            }
        };
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        log::info!(
            "Saved query {} results ({} bytes) to {}",
            query_id,
            written,
            full_path.display()
        );

        Ok(SaveReceipt {
            message: format!(
                "Successfully downloaded query results to \"{}\". Filename is: {}.",
                dir.display(),
                file_name
            ),
            path: Some(full_path),
        })
    }

    fn send_get(
        &self,
        path: &str,
        params: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<(String, Response)> {
        let url = urljoin(&self.host, path);
        log::debug!("GET {} {:?}", url, params);
        let resp = self
            .transport
            .get(&url, params, &self.authorized(headers))?;
        check_response(&url, &resp)?;
        Ok((url, resp))
    }

    /// GET whose body is left unread, unless it carries a status or error to check.
    fn send_get_stream(
        &self,
        path: &str,
        params: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<StreamingResponse> {
        let url = urljoin(&self.host, path);
        log::debug!("GET {} {:?} (streamed)", url, params);
        let resp = self
            .transport
            .get_stream(&url, params, &self.authorized(headers))?;

        let json_type = resp
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));
        let mut body = BufReader::with_capacity(CHUNK_SIZE, resp.body);
        let json_start = body
            .fill_buf()
            .map_err(|e| {
                Error::with_source(format!("Error sending request to host server: {}", e), e)
            })?
            .trim_ascii_start()
            .starts_with(b"{");
        let resp = StreamingResponse {
            status: resp.status,
            headers: resp.headers,
            body: Box::new(body),
        };

        if resp.status.is_success() && !json_type && !json_start {
            return Ok(resp);
        }
        let resp = resp.into_response()?;
        check_response(&url, &resp)?;
        Ok(resp.into())
    }

    fn send_post(
        &self,
        path: &str,
        form: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<(String, Response)> {
        // The submission endpoint expects a trailing slash.
        let url = format!("{}/", urljoin(&self.host, path));
        log::debug!("POST {}", url);
        let resp = self.transport.post(&url, form, &self.authorized(headers))?;
        check_response(&url, &resp)?;
        Ok((url, resp))
    }

    fn authorized(&self, mut headers: HeaderMap) -> HeaderMap {
        headers.insert(AUTHORIZATION, self.auth.clone());
        headers
    }
}

fn accept_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(QUERY_ACCEPT_TYPES));
    headers
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn download_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        }
    }
}

/// Copies `body` into `out` one chunk at a time, returning the byte count.
fn copy_chunks<R: Read + ?Sized>(
    body: &mut R,
    out: &mut impl Write,
    pb: Option<&ProgressBar>,
) -> io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        out.write_all(&buf[..n])?;
        written += n as u64;
        if let Some(pb) = pb {
            pb.inc(n as u64);
        }
    }
    out.flush()?;
    Ok(written)
}

fn save_error(path: &Path, e: io::Error) -> Error {
    Error::with_source(
        format!(
            "Error occurred while saving file to {}. Details: {}",
            path.display(),
            e
        ),
        e,
    )
}

// Server-reported errors can arrive on any endpoint, with any status.
fn check_response(url: &str, resp: &Response) -> Result<()> {
    if let Some(message) = error_in_body(&resp.body) {
        return Err(Error::new(message));
    }
    if !resp.status.is_success() {
        return Err(format_status_error(resp.status, url, &resp.body));
    }
    Ok(())
}
