//! CDS API credentials.

use std::fmt;
use std::path::{Path, PathBuf};

use super::error::RetrievalError;

/// Endpoint and key for the Climate Data Store API.
///
/// Keys have the form `<uid>:<api-key>` and are sent as basic auth.
#[derive(Clone)]
pub struct CdsCredentials {
    url: String,
    uid: String,
    api_key: String,
}

impl fmt::Debug for CdsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdsCredentials")
            .field("url", &self.url)
            .field("uid", &self.uid)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl CdsCredentials {
    /// Creates credentials from an endpoint URL and a `uid:key` string.
    pub fn new(url: impl Into<String>, key: &str) -> Result<Self, RetrievalError> {
        let url = url.into().trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(RetrievalError::Credentials("missing url".to_string()));
        }

        let (uid, api_key) = key
            .trim()
            .split_once(':')
            .filter(|(uid, api_key)| !uid.is_empty() && !api_key.is_empty())
            .ok_or_else(|| {
                RetrievalError::Credentials("key must have the form <uid>:<api-key>".to_string())
            })?;

        Ok(Self {
            url,
            uid: uid.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Loads credentials the same way the CDS tooling does.
    ///
    /// `CDSAPI_URL` + `CDSAPI_KEY` win when both are set. Otherwise the file
    /// is `explicit`, then `CDSAPI_RC`, then `~/.cdsapirc`.
    pub fn load(explicit: Option<&Path>) -> Result<Self, RetrievalError> {
        if let (Ok(url), Ok(key)) = (std::env::var("CDSAPI_URL"), std::env::var("CDSAPI_KEY")) {
            return Self::new(url, &key);
        }

        let path = explicit
            .map(expand_home)
            .or_else(|| std::env::var_os("CDSAPI_RC").map(PathBuf::from))
            .or_else(|| dirs::home_dir().map(|home| home.join(".cdsapirc")))
            .ok_or_else(|| {
                RetrievalError::Credentials("cannot locate a .cdsapirc file".to_string())
            })?;

        Self::from_file(&path)
    }

    /// Reads a `.cdsapirc` file.
    pub fn from_file(path: &Path) -> Result<Self, RetrievalError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    /// Parses `url: ...` / `key: ...` lines. Other keys are ignored.
    pub fn parse(contents: &str) -> Result<Self, RetrievalError> {
        let mut url = None;
        let mut key = None;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                match name.trim() {
                    "url" => url = Some(value.trim().to_string()),
                    "key" => key = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        match (url, key) {
            (Some(url), Some(key)) => Self::new(url, &key),
            (None, _) => Err(RetrievalError::Credentials(
                "missing 'url' entry".to_string(),
            )),
            (_, None) => Err(RetrievalError::Credentials(
                "missing 'key' entry".to_string(),
            )),
        }
    }

    /// API root without trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
