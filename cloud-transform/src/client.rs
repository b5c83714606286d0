// SPDX-License-Identifier: MIT
//! # Blocking Cloudinary Client
//!
//! Talks to the upload and admin APIs over `reqwest::blocking`:
//!
//! - **upload**: signed POST with the image as a base64 data URI and an incoming
//!   transformation, so the stored asset is already the transformed rendition
//! - **fetch**: plain GET of the returned `secure_url`
//! - **list / delete**: admin API with HTTP basic auth (key + secret)
//!
//! Every call is synchronous and bounded by the client timeout.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{Engine as _, engine::general_purpose};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::credentials::Credentials;
use crate::error::{CloudError, CloudResult};
use crate::params::TransformParams;
use crate::{RemoteTransform, TransformedAsset};

/// Production API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Admin API page size used by the resource sweep.
const LIST_PAGE_SIZE: u32 = 500;

/// The admin API accepts at most this many ids per delete call.
pub const DELETE_BATCH_SIZE: usize = 100;

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Deserialize)]
struct ResourcePage {
    #[serde(default)]
    resources: Vec<ResourceEntry>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct ResourceEntry {
    public_id: String,
}

/// Builder for [`CloudinaryClient`].
pub struct CloudinaryClientBuilder {
    credentials: Credentials,
    timeout: Duration,
    api_base: String,
}

impl CloudinaryClientBuilder {
    /// Per-request timeout (default 60 s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the API endpoint, e.g. for a regional host or a local stub.
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn build(self) -> CloudResult<CloudinaryClient> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| CloudError::http("client setup", e))?;
        Ok(CloudinaryClient {
            http,
            credentials: self.credentials,
            api_base: self.api_base,
        })
    }
}

/// Handle to one Cloudinary account.
pub struct CloudinaryClient {
    http: Client,
    credentials: Credentials,
    api_base: String,
}

impl CloudinaryClient {
    pub fn builder(credentials: Credentials) -> CloudinaryClientBuilder {
        CloudinaryClientBuilder {
            credentials,
            timeout: Duration::from_secs(60),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Client with default timeout and endpoint.
    pub fn new(credentials: Credentials) -> CloudResult<Self> {
        Self::builder(credentials).build()
    }

    pub fn cloud_name(&self) -> &str {
        &self.credentials.cloud_name
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.api_base, self.credentials.cloud_name, path)
    }

    fn read_json<T: DeserializeOwned>(operation: &'static str, response: Response) -> CloudResult<T> {
        let response = Self::check_status(operation, response)?;
        let body = response.text().map_err(|e| CloudError::http(operation, e))?;
        serde_json::from_str(&body).map_err(|e| CloudError::Decode {
            operation,
            reason: e.to_string(),
        })
    }

    fn check_status(operation: &'static str, response: Response) -> CloudResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(CloudError::Status {
            operation,
            status: status.as_u16(),
            body,
        })
    }
}

impl RemoteTransform for CloudinaryClient {
    fn transform(&self, payload: &[u8], params: &TransformParams) -> CloudResult<TransformedAsset> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
            .to_string();
        let transformation = params.to_transformation_string();
        let signature = sign_params(
            &[
                ("timestamp", timestamp.clone()),
                ("transformation", transformation.clone()),
            ],
            &self.credentials.api_secret,
        );

        debug!(
            cloud = %self.credentials.cloud_name,
            %transformation,
            bytes = payload.len(),
            "uploading image"
        );

        let form = [
            ("file", data_uri(payload)),
            ("api_key", self.credentials.api_key.clone()),
            ("timestamp", timestamp),
            ("transformation", transformation),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ];
        let response = self
            .http
            .post(self.endpoint("image/upload"))
            .form(&form)
            .send()
            .map_err(|e| CloudError::http("upload", e))?;
        let uploaded: UploadResponse = Self::read_json("upload", response)?;

        Ok(TransformedAsset {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
            format: uploaded.format.unwrap_or_default(),
        })
    }

    fn fetch(&self, url: &str) -> CloudResult<Vec<u8>> {
        debug!(%url, "fetching transformed asset");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| CloudError::http("fetch", e))?;
        let response = Self::check_status("fetch", response)?;
        let bytes = response.bytes().map_err(|e| CloudError::http("fetch", e))?;
        Ok(bytes.to_vec())
    }

    fn delete_resources(&self, ids: &[String]) -> CloudResult<()> {
        delete_in_chunks(ids, |chunk| {
            debug!(count = chunk.len(), "deleting remote resources");
            let query: Vec<(&str, &str)> = chunk.iter().map(|id| ("public_ids[]", id.as_str())).collect();
            let response = self
                .http
                .delete(self.endpoint("resources/image/upload"))
                .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
                .query(&query)
                .send()
                .map_err(|e| CloudError::http("delete", e))?;
            Self::check_status("delete", response).map(drop)
        })
    }

    fn list_resources(&self) -> CloudResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut request = self
                .http
                .get(self.endpoint("resources/image"))
                .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
                .query(&[("max_results", LIST_PAGE_SIZE.to_string())]);
            if let Some(next) = &cursor {
                request = request.query(&[("next_cursor", next.as_str())]);
            }
            let response = request.send().map_err(|e| CloudError::http("list", e))?;
            let page: ResourcePage = Self::read_json("list", response)?;

            ids.extend(page.resources.into_iter().map(|r| r.public_id));
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        debug!(count = ids.len(), "listed remote resources");
        Ok(ids)
    }
}

/// Run `delete` over `ids` in chunks of [`DELETE_BATCH_SIZE`].
///
/// A failing chunk does not stop the remaining ones; the first error is returned once
/// every chunk has been attempted.
fn delete_in_chunks<F>(ids: &[String], mut delete: F) -> CloudResult<()>
where
    F: FnMut(&[String]) -> CloudResult<()>,
{
    let mut first_error = None;
    for chunk in ids.chunks(DELETE_BATCH_SIZE) {
        if let Err(error) = delete(chunk) {
            warn!(count = chunk.len(), %error, "delete chunk failed, continuing");
            first_error.get_or_insert(error);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Signature over upload parameters: `key=value` pairs sorted by key, joined with `&`,
/// secret appended, SHA-256, lowercase hex.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let digest = Sha256::digest(string_to_sign(params, api_secret).as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn string_to_sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{joined}{api_secret}")
}

/// `data:<mime>;base64,<payload>` for the upload `file` field.
fn data_uri(payload: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        sniff_mime(payload),
        general_purpose::STANDARD.encode(payload)
    )
}

fn sniff_mime(payload: &[u8]) -> &'static str {
    match payload {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}
