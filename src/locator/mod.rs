use crate::config::types::S3Config;
use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Validity window for pre-signed artifact URLs.
const PRE_SIGNED_URL_EXPIRY: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("object storage is not configured")]
    Disabled,

    #[error("invalid object URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: &'static str },

    #[error("failed to generate pre-signed URL: {0}")]
    Sign(String),
}

/// Produces time-limited access URLs for artifacts stored in object storage.
///
/// Disabled when no storage region is configured; callers must check
/// `is_enabled()` before signing and fall back to serving artifacts by local
/// path. URLs are generated fresh on every call and never memoized.
pub struct ArtifactLocator {
    client: Option<aws_sdk_s3::Client>,
}

impl ArtifactLocator {
    pub async fn new(s3_config: Option<&S3Config>) -> Self {
        let client = match s3_config {
            Some(config) => {
                let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(aws_config::Region::new(config.region.clone()))
                    .load()
                    .await;
                info!(region = %config.region, "Object storage pre-signing enabled");
                Some(aws_sdk_s3::Client::new(&sdk_config))
            }
            None => None,
        };
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Generates a pre-signed GET URL for an `s3://bucket/key` object URI.
    pub async fn pre_signed_url(&self, uri: &str) -> Result<String, LocatorError> {
        let client = self.client.as_ref().ok_or(LocatorError::Disabled)?;
        let (bucket, key) = parse_object_uri(uri)?;

        let presigning = PresigningConfig::expires_in(PRE_SIGNED_URL_EXPIRY)
            .map_err(|e| LocatorError::Sign(e.to_string()))?;
        let request = client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| LocatorError::Sign(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

/// Whether an artifact path points into object storage (vs. a local path).
pub fn is_object_uri(path: &str) -> bool {
    path.starts_with("s3://")
}

fn parse_object_uri(uri: &str) -> Result<(String, String), LocatorError> {
    let rest = uri.strip_prefix("s3://").ok_or(LocatorError::InvalidUri {
        uri: uri.to_string(),
        reason: "expected an s3:// scheme",
    })?;
    let mut parts = rest.splitn(2, '/');
    let bucket = parts.next().unwrap_or("").trim();
    if bucket.is_empty() {
        return Err(LocatorError::InvalidUri {
            uri: uri.to_string(),
            reason: "missing bucket",
        });
    }
    let key = parts.next().unwrap_or("");
    if key.is_empty() {
        return Err(LocatorError::InvalidUri {
            uri: uri.to_string(),
            reason: "missing object key",
        });
    }
    Ok((bucket.to_string(), key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_uri() {
        let (bucket, key) = parse_object_uri("s3://logs/ir/f1-chunk-0.clp.zst").unwrap();
        assert_eq!(bucket, "logs");
        assert_eq!(key, "ir/f1-chunk-0.clp.zst");
    }

    #[test]
    fn test_parse_object_uri_rejects_malformed_input() {
        assert!(matches!(
            parse_object_uri("https://logs/key"),
            Err(LocatorError::InvalidUri { .. })
        ));
        assert!(matches!(
            parse_object_uri("s3:///key"),
            Err(LocatorError::InvalidUri { .. })
        ));
        assert!(matches!(
            parse_object_uri("s3://bucket-only"),
            Err(LocatorError::InvalidUri { .. })
        ));
    }

    #[test]
    fn test_object_uri_classification() {
        assert!(is_object_uri("s3://logs/ir/chunk.clp.zst"));
        assert!(!is_object_uri("ir/chunk.clp.zst"));
        assert!(!is_object_uri("/var/data/ir/chunk.clp.zst"));
    }

    #[tokio::test]
    async fn test_disabled_locator_never_signs() {
        let locator = ArtifactLocator::disabled();
        assert!(!locator.is_enabled());
        assert!(matches!(
            locator.pre_signed_url("s3://logs/key").await,
            Err(LocatorError::Disabled)
        ));
    }
}
