use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Reads the file name out of `content-disposition: attachment; filename=<name>`.
///
/// An extended `filename*=<charset>'<lang>'<name>` parameter takes precedence.
pub(crate) fn filename_from_disposition(headers: &HeaderMap) -> Result<String, String> {
    let value = headers
        .get(CONTENT_DISPOSITION)
        .ok_or_else(|| "missing content-disposition header".to_string())?
        .to_str()
        .map_err(|e| e.to_string())?;

    let mut plain = None;
    let mut extended = None;
    for param in value.split(';') {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(raw),
            "filename*" => {
                extended = Some(raw.trim().splitn(3, '\'').nth(2).unwrap_or(raw));
            }
            _ => {}
        }
    }

    let name = extended
        .or(plain)
        .ok_or_else(|| format!("no file name in content-disposition {:?}", value))?
        .trim()
        .trim_matches('"')
        .trim();

    if name.is_empty() {
        return Err(format!("Empty file name {:?}.", name));
    }
    // Only ever write directly into the chosen directory.
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(format!("Unsafe file name {:?}.", name));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn with_disposition(v: &'static str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_DISPOSITION, HeaderValue::from_static(v));
        h
    }

    #[test]
    fn join_handles_slashes() {
        assert_eq!(urljoin("https://h/", "minos_restapi/files"), "https://h/minos_restapi/files");
        assert_eq!(urljoin("https://h", "/minos_restapi/files"), "https://h/minos_restapi/files");
        assert_eq!(urljoin("https://h", "https://other/x"), "https://other/x");
    }

    #[test]
    fn plain_and_quoted_names() {
        assert_eq!(
            filename_from_disposition(&with_disposition(
                "attachment; filename=download_5d9407266362395834cdbfbe.zip"
            )),
            Ok("download_5d9407266362395834cdbfbe.zip".to_string())
        );
        assert_eq!(
            filename_from_disposition(&with_disposition("attachment; filename=\" a.h5 \"; size=3")),
            Ok("a.h5".to_string())
        );
    }

    #[test]
    fn missing_or_empty_names_fail() {
        assert!(filename_from_disposition(&HeaderMap::new()).is_err());
        assert!(filename_from_disposition(&with_disposition("attachment")).is_err());
        assert!(filename_from_disposition(&with_disposition("attachment; filename=  ")).is_err());
        assert!(filename_from_disposition(&with_disposition("attachment; filename=../x.zip")).is_err());
    }

    #[test]
    fn extended_name_drops_the_charset_prefix() {
        assert_eq!(
            filename_from_disposition(&with_disposition(
                "attachment; filename*=UTF-8''download.zip"
            )),
            Ok("download.zip".to_string())
        );
        assert_eq!(
            filename_from_disposition(&with_disposition(
                "attachment; filename=fallback.zip; filename*=utf-8'en'result.h5"
            )),
            Ok("result.h5".to_string())
        );
        assert!(
            filename_from_disposition(&with_disposition("attachment; filename*=UTF-8''../x"))
                .is_err()
        );
    }
}
