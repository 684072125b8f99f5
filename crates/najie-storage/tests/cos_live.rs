/// Integration test against a real Tencent COS bucket.
///
/// Skipped unless credentials are set. Run with:
///   NAJIE_TEST_SECRET_ID=AKID... \
///   NAJIE_TEST_SECRET_KEY="..." \
///   NAJIE_TEST_BUCKET=najie-test-1250000000 \
///   NAJIE_TEST_REGION=ap-guangzhou \
///   cargo test -p najie-storage --test cos_live -- --nocapture
#[cfg(feature = "s3")]
mod cos_tests {
    use najie_core::{ConfigStore, CosConfig};
    use najie_storage::ObjectStorageClient;

    fn live_config() -> Option<CosConfig> {
        Some(CosConfig::new(
            std::env::var("NAJIE_TEST_SECRET_ID").ok()?,
            std::env::var("NAJIE_TEST_SECRET_KEY").ok()?,
            std::env::var("NAJIE_TEST_BUCKET").ok()?,
            std::env::var("NAJIE_TEST_REGION").ok()?,
        ))
    }

    #[tokio::test]
    async fn cos_upload_list_download_delete() {
        let Some(config) = live_config() else {
            eprintln!("SKIP: NAJIE_TEST_SECRET_ID not set");
            return;
        };

        let tmp = tempfile::TempDir::new().unwrap();
        let store = ConfigStore::at(tmp.path().join("storage-cos.json"));
        store.write(&config).await.unwrap();
        let client = ObjectStorageClient::cos(store);

        assert!(client.test_connection(&config).await.is_ok());
        println!("OK: COS connection");

        let key = "najie/test/integration.txt";
        let src = tmp.path().join("integration.txt");
        std::fs::write(&src, b"Hello from najie integration test").unwrap();

        let uploaded = client.upload(&src, Some(key), None).await;
        assert!(uploaded.is_ok(), "upload failed: {:?}", uploaded.error());
        println!("OK: COS upload");

        let files = client.list("najie/test/", 100).await.ok().unwrap().files;
        assert!(files.iter().any(|f| f.key == key));
        println!("OK: COS list");

        let out = tmp.path().join("downloaded.txt");
        assert!(client.download(key, &out).await.is_ok());
        assert_eq!(
            std::fs::read(&out).unwrap(),
            b"Hello from najie integration test"
        );
        println!("OK: COS download matches");

        let url = client.signed_url(key, 600).await.ok().unwrap().url;
        assert!(url.contains("X-Amz-Signature="));
        println!("OK: COS signed url");

        assert!(client.delete(key).await.is_ok());
        println!("OK: COS delete");
    }
}
