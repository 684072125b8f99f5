#[cfg(feature = "s3")]
mod inner {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use aws_sdk_s3::Client;
    use aws_sdk_s3::config::{
        Credentials, RequestChecksumCalculation, ResponseChecksumValidation,
    };
    use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
    use aws_sdk_s3::presigning::PresigningConfig;
    use aws_sdk_s3::primitives::ByteStream;
    use futures::TryStreamExt;
    use http_body::Frame;
    use http_body_util::StreamBody;

    use najie_core::types::ObjectRecord;
    use najie_core::{CosError, Result};

    use crate::body::UploadBody;
    use crate::provider::{ByteChunks, ConnectionIdentity, Connector, ObjectBackend, PutOutcome};

    /// Tencent COS S3-compatible endpoint, `{region}` substituted per connection.
    pub const COS_ENDPOINT_TEMPLATE: &str = "https://cos.{region}.myqcloud.com";

    /// A single ListObjectsV2 page never holds more than this many keys.
    const MAX_KEYS_PER_PAGE: usize = 1000;

    /// Builds S3-protocol clients for COS or any S3-compatible service.
    #[derive(Debug, Clone)]
    pub struct S3Connector {
        endpoint_template: String,
        /// Force path-style addressing (`http://host/bucket/key`).
        /// Most self-hosted S3-compatible servers require this.
        path_style: bool,
    }

    impl S3Connector {
        /// Connector for Tencent COS (virtual-hosted addressing).
        pub fn cos() -> Self {
            Self {
                endpoint_template: COS_ENDPOINT_TEMPLATE.to_string(),
                path_style: false,
            }
        }

        /// Connector for an S3-compatible service at `endpoint`
        /// (e.g. `http://localhost:9000` for MinIO). `{region}` is substituted.
        pub fn s3_compatible(endpoint: &str) -> Self {
            Self {
                endpoint_template: endpoint.trim_end_matches('/').to_string(),
                path_style: true,
            }
        }

        pub fn endpoint_for(&self, region: &str) -> String {
            self.endpoint_template.replace("{region}", region)
        }
    }

    #[async_trait]
    impl Connector for S3Connector {
        async fn connect(&self, identity: &ConnectionIdentity) -> Result<Arc<dyn ObjectBackend>> {
            let endpoint = self.endpoint_for(&identity.region);
            let creds = Credentials::new(
                &identity.secret_id,
                &identity.secret_key,
                None,
                None,
                "najie-config",
            );

            let sdk_config = aws_config::from_env()
                .region(aws_config::Region::new(identity.region.clone()))
                .credentials_provider(creds)
                .retry_config(aws_config::retry::RetryConfig::disabled())
                .load()
                .await;

            // COS and most S3-compatible servers reject the SDK's default
            // trailing checksums.
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .endpoint_url(&endpoint)
                .force_path_style(self.path_style)
                .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
                .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
                .build();

            tracing::debug!(endpoint = %endpoint, path_style = self.path_style, "built S3 client");

            Ok(Arc::new(S3Backend {
                client: Client::from_conf(s3_config),
                endpoint,
                path_style: self.path_style,
            }))
        }
    }

    /// Connection handle over the S3 protocol.
    pub struct S3Backend {
        client: Client,
        endpoint: String,
        path_style: bool,
    }

    /// `bucket.cos.region.myqcloud.com/key`, the shape COS reports as Location.
    fn object_location(endpoint: &str, path_style: bool, bucket: &str, key: &str) -> String {
        let (scheme, host) = endpoint.split_once("://").unwrap_or(("https", endpoint));
        if path_style {
            format!("{scheme}://{host}/{bucket}/{key}")
        } else {
            format!("{bucket}.{host}/{key}")
        }
    }

    /// Keep the service's own code and message; fall back to the error chain.
    fn remote_error<E, R>(operation: &str, err: SdkError<E, R>) -> CosError
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let message = match (err.code(), err.message()) {
            (Some(code), Some(msg)) => format!("{code}: {msg}"),
            (None, Some(msg)) => msg.to_string(),
            (Some(code), None) => code.to_string(),
            (None, None) => DisplayErrorContext(&err).to_string(),
        };
        tracing::warn!(operation, error = %message, "remote call failed");
        CosError::Remote(message)
    }

    fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
    }

    #[async_trait]
    impl ObjectBackend for S3Backend {
        async fn head_bucket(&self, bucket: &str) -> Result<()> {
            self.client
                .head_bucket()
                .bucket(bucket)
                .send()
                .await
                .map_err(|e| remote_error("head_bucket", e))?;
            Ok(())
        }

        async fn put_object(&self, bucket: &str, key: &str, body: UploadBody) -> Result<PutOutcome> {
            let content_length = i64::try_from(body.content_length())
                .map_err(|_| CosError::InvalidArgument("file too large".into()))?;
            let stream = ByteStream::from_body_1_x(StreamBody::new(body.map_ok(Frame::data)));

            let out = self
                .client
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_length(content_length)
                .body(stream)
                .send()
                .await
                .map_err(|e| remote_error("put_object", e))?;

            Ok(PutOutcome {
                location: object_location(&self.endpoint, self.path_style, bucket, key),
                etag: out.e_tag().unwrap_or_default().to_string(),
            })
        }

        async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteChunks> {
            let resp = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| remote_error("get_object", e))?;

            let chunks = futures::stream::try_unfold(resp.body, |mut body| async move {
                match body.try_next().await {
                    Ok(Some(chunk)) => Ok(Some((chunk, body))),
                    Ok(None) => Ok(None),
                    Err(e) => Err(std::io::Error::other(e)),
                }
            });
            Ok(Box::pin(chunks))
        }

        async fn list_objects(
            &self,
            bucket: &str,
            prefix: &str,
            max_keys: usize,
        ) -> Result<Vec<ObjectRecord>> {
            let mut objects = Vec::new();
            let mut continuation_token: Option<String> = None;

            while objects.len() < max_keys {
                let page = (max_keys - objects.len()).min(MAX_KEYS_PER_PAGE);
                let mut req = self
                    .client
                    .list_objects_v2()
                    .bucket(bucket)
                    .max_keys(page as i32);
                if !prefix.is_empty() {
                    req = req.prefix(prefix);
                }
                if let Some(tok) = continuation_token.take() {
                    req = req.continuation_token(tok);
                }

                let out = req
                    .send()
                    .await
                    .map_err(|e| remote_error("list_objects", e))?;

                for o in out.contents() {
                    objects.push(ObjectRecord {
                        key: o.key().unwrap_or_default().to_string(),
                        size: o.size().unwrap_or(0).max(0) as u64,
                        last_modified: o.last_modified().and_then(to_chrono),
                        etag: o.e_tag().unwrap_or_default().to_string(),
                    });
                }

                continuation_token = out.next_continuation_token().map(str::to_string);
                if continuation_token.is_none() {
                    break;
                }
            }

            objects.truncate(max_keys);
            Ok(objects)
        }

        async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| remote_error("delete_object", e))?;
            Ok(())
        }

        async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String> {
            let presigning = PresigningConfig::expires_in(expires_in)
                .map_err(|e| CosError::InvalidArgument(e.to_string()))?;
            let req = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| remote_error("presign_get", e))?;
            Ok(req.uri().to_string())
        }

        fn name(&self) -> &str {
            &self.endpoint
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn identity() -> ConnectionIdentity {
            ConnectionIdentity {
                secret_id: "AKIDEXAMPLE".into(),
                secret_key: "secret".into(),
                region: "ap-guangzhou".into(),
            }
        }

        #[test]
        fn cos_endpoint_follows_region() {
            assert_eq!(
                S3Connector::cos().endpoint_for("ap-guangzhou"),
                "https://cos.ap-guangzhou.myqcloud.com"
            );
        }

        #[test]
        fn compatible_endpoint_is_trimmed() {
            let c = S3Connector::s3_compatible("http://localhost:9000/");
            assert_eq!(c.endpoint_for("us-east-1"), "http://localhost:9000");
        }

        #[tokio::test]
        async fn presign_is_local_and_carries_expiry() {
            let backend = S3Connector::cos().connect(&identity()).await.unwrap();
            let url = backend
                .presign_get("b-1234567890", "a.txt", Duration::from_secs(3600))
                .await
                .unwrap();
            assert!(url.starts_with("https://b-1234567890.cos.ap-guangzhou.myqcloud.com/a.txt?"));
            assert!(url.contains("X-Amz-Expires=3600"));
            assert!(url.contains("X-Amz-Signature="));
        }

        #[tokio::test]
        async fn presign_rejects_more_than_a_week() {
            let backend = S3Connector::cos().connect(&identity()).await.unwrap();
            let err = backend
                .presign_get("b-1", "a.txt", Duration::from_secs(8 * 24 * 3600))
                .await
                .unwrap_err();
            assert!(matches!(err, CosError::InvalidArgument(_)));
        }

        #[test]
        fn location_shapes() {
            assert_eq!(
                object_location("https://cos.ap-guangzhou.myqcloud.com", false, "b-1", "docs/a.txt"),
                "b-1.cos.ap-guangzhou.myqcloud.com/docs/a.txt"
            );
            assert_eq!(
                object_location("http://localhost:9000", true, "b-1", "a.txt"),
                "http://localhost:9000/b-1/a.txt"
            );
        }
    }
}

#[cfg(feature = "s3")]
pub use inner::{COS_ENDPOINT_TEMPLATE, S3Backend, S3Connector};
