use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ClientConfig;
use crate::credentials::split_key_basic;
use crate::error::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const RC_FILE_NAME: &str = ".bdcapirc";

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    username: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
}

/// Values given explicitly by the caller; each one beats env and rc file.
#[derive(Debug, Default, Clone)]
pub(crate) struct Overrides {
    pub(crate) host: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) api_key: Option<String>,
    pub(crate) verify: Option<bool>,
}

pub(crate) fn load_config(overrides: Overrides) -> Result<ClientConfig> {
    let env = |k: &str| std::env::var(k).ok();
    let candidates = rc_candidates(&env);
    resolve(overrides, &env, &candidates)
}

fn resolve(
    overrides: Overrides,
    env: &dyn Fn(&str) -> Option<String>,
    rc_candidates: &[PathBuf],
) -> Result<ClientConfig> {
    let mut host = overrides.host.or_else(|| env("BDCAPI_URL"));
    let mut username = overrides.username.or_else(|| env("BDCAPI_USERNAME"));
    let mut key = overrides.api_key.or_else(|| env("BDCAPI_KEY"));
    let mut file_verify: Option<bool> = None;

    if host.is_none() || username.is_none() || key.is_none() || overrides.verify.is_none() {
        for rc_path in rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).map_err(|e| {
                    Error::with_source(
                        format!(
                            "failed to read configuration file {}: {}",
                            rc_path.display(),
                            e
                        ),
                        e,
                    )
                })?;

                if host.is_none() {
                    host = cfg.url;
                }
                if username.is_none() {
                    username = cfg.username;
                }
                if key.is_none() {
                    key = cfg.key;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let host = host.ok_or_else(|| missing("url", "BDCAPI_URL", rc_candidates))?;
    let key = key.ok_or_else(|| missing("key", "BDCAPI_KEY", rc_candidates))?;

    // A key written as `<username>:<apikey>` carries the username too.
    let (username, api_key) = match (username, split_key_basic(&key)) {
        (Some(u), _) => (u, key),
        (None, Some((u, k))) => (u, k),
        (None, None) => return Err(missing("username", "BDCAPI_USERNAME", rc_candidates)),
    };

    let verify = overrides.verify.or(file_verify).unwrap_or(true);

    Ok(ClientConfig {
        host,
        username,
        api_key,
        verify,
        timeout: DEFAULT_TIMEOUT,
    })
}

fn missing(field: &str, env_var: &str, rc_candidates: &[PathBuf]) -> Error {
    if rc_candidates.is_empty() {
        return Error::new(format!(
            "Missing configuration: {} (set {} or create .bdcapirc)",
            field, env_var
        ));
    }
    Error::new(format!(
        "Missing configuration: {} (set {} or put `{}:` in one of: {})",
        field,
        env_var,
        field,
        rc_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

fn read_rc(path: &Path) -> std::io::Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // `key:` may be on one line with the value on the next.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !line.contains(':') {
                cfg.set(pk, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "url" | "username" | "key" => {
                    if !v.is_empty() {
                        cfg.set(k, v);
                    } else {
                        pending_key = Some(k);
                    }
                }
                "verify" => {
                    if !v.is_empty() {
                        cfg.verify = Some(v != "0");
                    }
                }
                _ => {}
            }
        }
    }

    cfg
}

impl RcConfig {
    fn set(&mut self, field: &str, value: &str) {
        let value = Some(value.to_string());
        match field {
            "url" => self.url = value,
            "username" => self.username = value,
            "key" => self.key = value,
            _ => {}
        }
    }
}

/// Removes one pair of matching surrounding quotes, if present.
fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    ['"', '\'']
        .into_iter()
        .find_map(|q| value.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(value)
}

/// `BDCAPI_RC` when set, otherwise `.bdcapirc` in the working and home directories.
fn rc_candidates(env: &dyn Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    match env("BDCAPI_RC") {
        Some(explicit) => vec![PathBuf::from(explicit)],
        None => [std::env::current_dir().ok(), dirs::home_dir()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(RC_FILE_NAME))
            .collect(),
    }
}
