use bytes::Bytes;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::{Digest, Sha256};
use url::Url;

use super::{StorageError, StorageResult};
use crate::config::Config;

type HmacSha256 = Hmac<Sha256>;

const PRESIGN_EXPIRY_SECS: u32 = 900;
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// S3-compatible object store client. Talks plain HTTP with AWS Signature V4
/// (path-style addressing), which keeps it working against MinIO and friends
/// without an SDK.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    endpoint: Url,
    bucket: String,
    region: String,
    access_key: String,
    secret_key: String,
}

impl S3Storage {
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        let endpoint = config
            .s3_endpoint
            .as_deref()
            .ok_or_else(|| StorageError::Config("S3_ENDPOINT is required".into()))?;
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StorageError::Config(format!("Invalid S3_ENDPOINT: {}", e)))?;

        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| StorageError::Config(format!("{} is required", name)))
        };

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(StorageError::Http)?;

        Ok(Self {
            client,
            endpoint,
            bucket: required(&config.s3_bucket, "S3_BUCKET")?,
            region: required(&config.s3_region, "S3_REGION")?,
            access_key: required(&config.s3_access_key, "S3_ACCESS_KEY")?,
            secret_key: required(&config.s3_secret_key, "S3_SECRET_KEY")?,
        })
    }

    fn object_path(&self, key: &str) -> String {
        format!("/{}/{}", self.bucket, key)
    }

    fn object_url(&self, key: &str) -> StorageResult<Url> {
        let mut url = self.endpoint.clone();
        url.set_path(&self.object_path(key));
        Ok(url)
    }

    fn host_header(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Build the SigV4 Authorization header for a request with no query
    /// string and the given payload hash.
    fn authorization(
        &self,
        method: &str,
        key: &str,
        amz_date: &str,
        payload_hash: &str,
    ) -> String {
        let date = &amz_date[..8];
        let canonical_uri = uri_encode(&self.object_path(key), false);
        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            self.host_header(),
            payload_hash,
            amz_date
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";
        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method, canonical_uri, canonical_headers, signed_headers, payload_hash
        );

        let scope = format!("{}/{}/s3/aws4_request", date, self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );
        let signature = hex::encode(hmac_sha256(
            &derive_signing_key(&self.secret_key, date, &self.region, "s3"),
            string_to_sign.as_bytes(),
        ));

        format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key, scope, signed_headers, signature
        )
    }

    async fn send(
        &self,
        method: reqwest::Method,
        key: &str,
        body: Option<Bytes>,
    ) -> StorageResult<reqwest::Response> {
        let url = self.object_url(key)?;
        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = match &body {
            Some(bytes) => sha256_hex(bytes),
            None => sha256_hex(b""),
        };
        let authorization = self.authorization(method.as_str(), key, &amz_date, &payload_hash);

        let mut request = self
            .client
            .request(method, url)
            .header("x-amz-date", amz_date)
            .header("x-amz-content-sha256", payload_hash)
            .header("authorization", authorization);
        if let Some(bytes) = body {
            request = request.body(bytes);
        }
        Ok(request.send().await?)
    }

    async fn check(
        response: reqwest::Response,
        key: &str,
    ) -> StorageResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn save(&self, key: &str, bytes: &Bytes) -> StorageResult<String> {
        let response = self
            .send(reqwest::Method::PUT, key, Some(bytes.clone()))
            .await?;
        Self::check(response, key).await?;
        Ok(key.to_string())
    }

    pub async fn retrieve(&self, key: &str) -> StorageResult<Bytes> {
        let response = self.send(reqwest::Method::GET, key, None).await?;
        let response = Self::check(response, key).await?;
        Ok(response.bytes().await?)
    }

    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        let response = self.send(reqwest::Method::DELETE, key, None).await?;
        Self::check(response, key).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        let response = self.send(reqwest::Method::HEAD, key, None).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response, key).await?;
        Ok(true)
    }

    /// Presigned GET URL with a bounded expiry; only the host header is
    /// signed, the payload stays unsigned per the query presigning scheme.
    pub fn presigned_get_url(&self, key: &str) -> StorageResult<String> {
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/s3/aws4_request", date, self.region);
        let credential = format!("{}/{}", self.access_key, scope);

        let mut params = vec![
            ("X-Amz-Algorithm", "AWS4-HMAC-SHA256".to_string()),
            ("X-Amz-Credential", credential),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", PRESIGN_EXPIRY_SECS.to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ];
        params.sort_by(|a, b| a.0.cmp(b.0));
        let canonical_query = params
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k, true), uri_encode(v, true)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_uri = uri_encode(&self.object_path(key), false);
        let canonical_request = format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\n{}",
            canonical_uri,
            canonical_query,
            self.host_header(),
            UNSIGNED_PAYLOAD
        );
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );
        let signature = hex::encode(hmac_sha256(
            &derive_signing_key(&self.secret_key, &date, &self.region, "s3"),
            string_to_sign.as_bytes(),
        ));

        let mut url = self.object_url(key)?;
        url.set_query(Some(&format!(
            "{}&X-Amz-Signature={}",
            canonical_query, signature
        )));
        Ok(url.to_string())
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// RFC 3986 encoding as SigV4 wants it: unreserved characters pass through,
/// '/' passes only in paths.
fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
