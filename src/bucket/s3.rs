//! S3 bucket handles backed by `object_store`

use crate::bucket::{BucketHandle, BucketProvider, Credentials};
use crate::error::TransferError;
use crate::settings::S3Settings;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::Error as ObjectStoreError;
use object_store::ObjectStoreExt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::{Builder, Handle, Runtime};

/// Provider for AWS S3 and S3-compatible services (MinIO, Spaces, R2, ...).
///
/// Connection details come from the `AWS_*` environment, overlaid with
/// [`S3Settings`], overlaid with the per-call [`Credentials`].
#[derive(Debug, Clone, Default)]
pub struct S3Provider {
    settings: S3Settings,
}

impl S3Provider {
    pub fn new(settings: S3Settings) -> Self {
        Self { settings }
    }

    /// Provider that relies on the environment only.
    pub fn from_env() -> Self {
        Self::default()
    }

    fn build_store(&self, name: &str, credentials: &Credentials) -> Result<AmazonS3, TransferError> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(name);

        if let Some(region) = credentials.region.as_ref().or(self.settings.region.as_ref()) {
            builder = builder.with_region(region.clone());
        }
        if let Some(key) = credentials.access_key.as_ref().or(self.settings.access_key.as_ref()) {
            builder = builder.with_access_key_id(key.clone());
        }
        if let Some(secret) = credentials.secret_key.as_ref().or(self.settings.secret_key.as_ref())
        {
            builder = builder.with_secret_access_key(secret.clone());
        }
        if let Some(ref endpoint) = self.settings.endpoint {
            let allow_http = self.settings.allow_http || endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint.clone()).with_allow_http(allow_http);
        }

        builder.build().map_err(|e| TransferError::Config(e.to_string()))
    }
}

impl BucketProvider for S3Provider {
    fn bucket(
        &self,
        name: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn BucketHandle>, TransferError> {
        let store = self.build_store(name, credentials)?;
        tracing::debug!(
            bucket = %name,
            endpoint = self.settings.endpoint.as_deref().unwrap_or("aws"),
            "Opened S3 bucket"
        );
        Ok(Box::new(ObjectStoreBucket::new(name, Arc::new(store))?))
    }
}

/// Blocking download handle over any [`object_store::ObjectStore`].
pub struct ObjectStoreBucket {
    bucket: String,
    store: Arc<dyn object_store::ObjectStore>,
    runtime: Runtime,
}

impl ObjectStoreBucket {
    pub fn new(
        bucket: impl Into<String>,
        store: Arc<dyn object_store::ObjectStore>,
    ) -> Result<Self, TransferError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TransferError::Runtime(e.to_string()))?;
        Ok(Self { bucket: bucket.into(), store, runtime })
    }

    fn map_error(&self, key: &str, error: ObjectStoreError) -> TransferError {
        match error {
            ObjectStoreError::NotFound { .. } => {
                TransferError::NotFound { bucket: self.bucket.clone(), key: key.to_string() }
            }
            other => TransferError::Backend(other.to_string()),
        }
    }

    async fn stream_into(&self, key: &str, writer: &mut dyn Write) -> Result<u64, TransferError> {
        let location = ObjectPath::from(key);
        let result = self.store.get(&location).await.map_err(|e| self.map_error(key, e))?;

        let mut stream = result.into_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_error(key, e))?;
            writer.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        writer.flush()?;
        Ok(written)
    }

    /// Drives [`Self::stream_into`] on the private runtime. A runtime cannot be
    /// entered from a thread that already runs one, so inside an async host the
    /// object is buffered on a scoped worker thread and copied out afterwards.
    fn run_stream(&self, key: &str, writer: &mut dyn Write) -> Result<u64, TransferError> {
        if Handle::try_current().is_err() {
            return self.runtime.block_on(self.stream_into(key, writer));
        }

        let buffered = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let mut buf: Vec<u8> = Vec::new();
                    self.runtime.block_on(self.stream_into(key, &mut buf)).map(|_| buf)
                })
                .join()
        })
        .map_err(|_| TransferError::Runtime("download worker panicked".to_string()))??;

        writer.write_all(&buffered)?;
        writer.flush()?;
        Ok(buffered.len() as u64)
    }

    fn transfer(
        &self,
        key: &str,
        destination: &str,
        writer: &mut dyn Write,
    ) -> Result<u64, TransferError> {
        let start = Instant::now();
        match self.run_stream(key, writer) {
            Ok(size) => {
                tracing::info!(
                    bucket = %self.bucket,
                    key = %key,
                    destination,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download successful"
                );
                Ok(size)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    destination,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                Err(e)
            }
        }
    }
}

impl BucketHandle for ObjectStoreBucket {
    fn download_to_writer(&self, key: &str, writer: &mut dyn Write) -> Result<u64, TransferError> {
        self.transfer(key, "memory", writer)
    }

    /// Downloads into a temporary file next to `path` and renames it into
    /// place, so a failed transfer never leaves a truncated cache file.
    fn download_to_file(&self, key: &str, path: &Path) -> Result<u64, TransferError> {
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        let size = self.transfer(key, "file", staged.as_file_mut())?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| TransferError::Io(e.error))?;
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::PutPayload;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn store_with(key: &str, content: &str) -> Arc<dyn object_store::ObjectStore> {
        let store: Arc<dyn object_store::ObjectStore> = Arc::new(InMemory::new());
        let runtime = Builder::new_current_thread().build().expect("runtime");
        let payload = PutPayload::from(content.as_bytes().to_vec());
        runtime.block_on(store.put(&ObjectPath::from(key), payload)).expect("put");
        store
    }

    #[test]
    fn download_to_writer_streams_object() {
        let bucket = ObjectStoreBucket::new("cfg", store_with("app/mycfg.py", "A = 1\n")).unwrap();
        let mut buf = Cursor::new(Vec::<u8>::new());

        let size = bucket.download_to_writer("app/mycfg.py", &mut buf).expect("download");

        assert_eq!(size, 6);
        assert_eq!(buf.into_inner(), b"A = 1\n");
    }

    #[test]
    fn download_works_inside_an_async_caller() {
        let bucket = ObjectStoreBucket::new("cfg", store_with("app/mycfg.py", "A = 1\n")).unwrap();
        let host = Builder::new_current_thread().enable_all().build().expect("host runtime");

        let (size, buf) = host.block_on(async {
            let mut buf: Vec<u8> = Vec::new();
            let size = bucket.download_to_writer("app/mycfg.py", &mut buf).expect("download");
            (size, buf)
        });

        assert_eq!(size, 6);
        assert_eq!(buf, b"A = 1\n");
    }

    #[test]
    fn missing_object_inside_an_async_caller_is_not_found() {
        let bucket = ObjectStoreBucket::new("cfg", store_with("other.py", "B = 2\n")).unwrap();
        let host = Builder::new_current_thread().enable_all().build().expect("host runtime");

        let err = host.block_on(async {
            let mut buf: Vec<u8> = Vec::new();
            bucket.download_to_writer("mycfg.py", &mut buf).unwrap_err()
        });

        assert!(matches!(err, TransferError::NotFound { .. }));
    }

    #[test]
    fn missing_object_maps_to_not_found() {
        let bucket = ObjectStoreBucket::new("cfg", store_with("other.py", "")).unwrap();
        let mut buf: Vec<u8> = Vec::new();

        let err = bucket.download_to_writer("mycfg.py", &mut buf).unwrap_err();

        match err {
            TransferError::NotFound { bucket, key } => {
                assert_eq!(bucket, "cfg");
                assert_eq!(key, "mycfg.py");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn download_to_file_creates_parents_and_overwrites() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("nested").join("out.py");
        let bucket = ObjectStoreBucket::new("cfg", store_with("mycfg.py", "B = 2\n")).unwrap();

        bucket.download_to_file("mycfg.py", &path).expect("first download");
        fs::write(&path, "stale").expect("write");
        bucket.download_to_file("mycfg.py", &path).expect("second download");

        assert_eq!(fs::read_to_string(&path).unwrap(), "B = 2\n");
    }

    #[test]
    fn failed_file_download_keeps_existing_cache() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("out.py");
        fs::write(&path, "A = 1\n").expect("write");
        let bucket = ObjectStoreBucket::new("cfg", store_with("other.py", "")).unwrap();

        assert!(bucket.download_to_file("mycfg.py", &path).is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), "A = 1\n");
        let leftovers = fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 1, "staged temp file should be cleaned up");
    }

    #[test]
    fn provider_builds_store_for_custom_endpoint() {
        let provider = S3Provider::new(S3Settings {
            endpoint: Some("http://localhost:9000".into()),
            region: Some("us-east-1".into()),
            access_key: Some("minio".into()),
            secret_key: Some("minio123".into()),
            allow_http: false,
        });
        let credentials = Credentials { region: Some("eu-west-1".into()), ..Default::default() };
        assert!(provider.bucket("cfg", &credentials).is_ok());
    }
}
