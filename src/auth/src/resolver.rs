// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application Default Credentials.
//!
//! The [Resolver] finds the credentials for an application from its
//! environment, trying in order:
//!
//! 1. The credentials JSON set with [Builder::with_credentials_json].
//! 2. The file named by the `GOOGLE_APPLICATION_CREDENTIALS` environment
//!    variable. If the variable is set, failing to load the file is an
//!    error, the resolver does not try the next sources.
//! 3. The file created by `gcloud auth application-default login`:
//!    `$HOME/.config/gcloud/application_default_credentials.json`, or
//!    `%APPDATA%\gcloud\application_default_credentials.json` on Windows.
//! 4. The metadata service, when running on Google Compute Engine.
//!
//! A resolver caches its results: the credentials, the project id, and the
//! outcome of the Compute Engine probe. Each resolver has its own caches.
//!
//! [Application Default Credentials]: https://cloud.google.com/docs/authentication/application-default-credentials

use crate::Result;
use crate::build_errors::Error as BuildError;
use crate::constants::{
    APPDATA_VAR, CLOUDSDK_CONFIG_DIR, GCE_METADATA_HOST_VAR, GCLOUD_PROJECT_VAR,
    GOOGLE_APPLICATION_CREDENTIALS_VAR, GOOGLE_CLOUD_PROJECT_VAR, HOME_VAR, METADATA_ROOT,
    WELL_KNOWN_FILE,
};
use crate::credentials::{self, Credentials, mds};
use crate::environment::{
    EnvReader, FileSystem, GcloudSdkConfig, HostPlatform, LocalFileSystem, PathJoiner,
    PlatformProbe, ProcessEnv, SdkConfig, StdPathJoiner,
};
use crate::errors::CredentialsError;
use crate::transport::{ReqwestTransporter, Transporter};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::OnceCell;

const EXHAUSTED_MESSAGE: &str = "Could not load the default credentials. Browse to \
    https://developers.google.com/accounts/docs/application-default-credentials for more information.";
// Relative to APPDATA on Windows, and to HOME elsewhere.
const WINDOWS_WELL_KNOWN_PATH: &[&str] = &[CLOUDSDK_CONFIG_DIR, WELL_KNOWN_FILE];
const UNIX_WELL_KNOWN_PATH: &[&str] = &[".config", CLOUDSDK_CONFIG_DIR, WELL_KNOWN_FILE];
const NO_PROJECT_MESSAGE: &str = "Unable to detect a Project Id in the current environment.";

/// A builder for [Resolver].
///
/// Every capability defaults to the host process: its environment
/// variables, its file system, the `gcloud` command line tool, and an HTTP
/// client.
#[derive(Debug)]
pub struct Builder {
    env: Arc<dyn EnvReader>,
    paths: Arc<dyn PathJoiner>,
    platform: Arc<dyn PlatformProbe>,
    fs: Arc<dyn FileSystem>,
    sdk: Arc<dyn SdkConfig>,
    transporter: Option<Arc<dyn Transporter>>,
    metadata_endpoint: Option<String>,
    credentials_json: Option<Value>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            env: Arc::new(ProcessEnv),
            paths: Arc::new(StdPathJoiner),
            platform: Arc::new(HostPlatform),
            fs: Arc::new(LocalFileSystem),
            sdk: Arc::new(GcloudSdkConfig),
            transporter: None,
            metadata_endpoint: None,
            credentials_json: None,
        }
    }
}

impl Builder {
    /// Reads environment variables from `env`.
    pub fn with_env<T: EnvReader + 'static>(mut self, env: T) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Builds the well-known file path with `paths`.
    pub fn with_path_joiner<T: PathJoiner + 'static>(mut self, paths: T) -> Self {
        self.paths = Arc::new(paths);
        self
    }

    /// Detects the operating system with `platform`.
    pub fn with_platform<T: PlatformProbe + 'static>(mut self, platform: T) -> Self {
        self.platform = Arc::new(platform);
        self
    }

    /// Reads credential files with `fs`.
    pub fn with_file_system<T: FileSystem + 'static>(mut self, fs: T) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    /// Reads the Google Cloud SDK configuration with `sdk`.
    pub fn with_sdk_config<T: SdkConfig + 'static>(mut self, sdk: T) -> Self {
        self.sdk = Arc::new(sdk);
        self
    }

    /// Sets the transporter for the metadata service, and for the
    /// credentials created by the resolver.
    pub fn with_transporter(mut self, transporter: Arc<dyn Transporter>) -> Self {
        self.transporter = Some(transporter);
        self
    }

    /// Overrides the metadata service endpoint.
    ///
    /// By default the resolver uses `http://${GCE_METADATA_HOST}` if the
    /// variable is set, and `http://metadata.google.internal` otherwise.
    pub fn with_metadata_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.metadata_endpoint = Some(endpoint.into());
        self
    }

    /// Uses these credentials instead of searching the environment.
    pub fn with_credentials_json(mut self, json: Value) -> Self {
        self.credentials_json = Some(json);
        self
    }

    /// Returns the configured resolver.
    pub fn build(self) -> Resolver {
        let metadata_endpoint = self
            .metadata_endpoint
            .or_else(|| {
                self.env
                    .var(GCE_METADATA_HOST_VAR)
                    .filter(|h| !h.is_empty())
                    .map(|h| format!("http://{h}"))
            })
            .unwrap_or_else(|| METADATA_ROOT.to_string());
        Resolver {
            env: self.env,
            paths: self.paths,
            platform: self.platform,
            fs: self.fs,
            sdk: self.sdk,
            transporter: self
                .transporter
                .unwrap_or_else(|| Arc::new(ReqwestTransporter::new())),
            metadata_endpoint: metadata_endpoint.trim_end_matches('/').to_string(),
            credentials_json: self.credentials_json,
            credentials: OnceCell::new(),
            project_id: OnceCell::new(),
            on_gce: OnceCell::new(),
        }
    }
}

/// Finds the [Application Default Credentials] and the default project id.
///
/// Concurrent callers share a single resolution. Failed resolutions are not
/// cached, the next call tries again.
///
/// # Example
/// ```no_run
/// # use google_cloud_adc::resolver::Resolver;
/// # tokio_test::block_on(async {
/// let resolver = Resolver::builder().build();
/// let credentials = resolver.application_default().await?;
/// let project_id = resolver.default_project_id().await?;
/// # Ok::<(), google_cloud_adc::errors::CredentialsError>(())
/// # });
/// ```
///
/// [Application Default Credentials]: https://cloud.google.com/docs/authentication/application-default-credentials
#[derive(Debug)]
pub struct Resolver {
    env: Arc<dyn EnvReader>,
    paths: Arc<dyn PathJoiner>,
    platform: Arc<dyn PlatformProbe>,
    fs: Arc<dyn FileSystem>,
    sdk: Arc<dyn SdkConfig>,
    transporter: Arc<dyn Transporter>,
    metadata_endpoint: String,
    credentials_json: Option<Value>,

    credentials: OnceCell<Credentials>,
    project_id: OnceCell<String>,
    on_gce: OnceCell<bool>,
}

impl Resolver {
    /// Returns a builder with the default capabilities.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns the Application Default Credentials.
    ///
    /// After the first success, returns a handle to the same credentials
    /// ([Credentials::ptr_eq] is `true`).
    pub async fn application_default(&self) -> Result<Credentials> {
        self.credentials
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    /// Creates credentials from JSON, using the transporter of the resolver.
    ///
    /// The result is not cached.
    pub fn from_json(&self, json: Value) -> Result<Credentials> {
        credentials::from_json(json, self.transporter.clone())
    }

    /// Creates credentials from a stream with JSON contents, using the
    /// transporter of the resolver.
    ///
    /// The result is not cached.
    pub async fn from_stream<R: AsyncRead + Unpin>(&self, reader: R) -> Result<Credentials> {
        credentials::from_stream(reader, self.transporter.clone()).await
    }

    /// Returns `true` if the metadata service is reachable.
    ///
    /// The service is probed once per resolver. A failed probe counts as
    /// "not on Compute Engine", and is not retried.
    pub async fn is_running_on_compute(&self) -> bool {
        *self
            .on_gce
            .get_or_init(|| async {
                let on_gce =
                    mds::is_running_on_compute(self.transporter.as_ref(), &self.metadata_endpoint)
                        .await;
                tracing::debug!(on_gce, endpoint = %self.metadata_endpoint, "probed the metadata service");
                on_gce
            })
            .await
    }

    /// The cached result of [is_running_on_compute][Self::is_running_on_compute],
    /// or `None` if the metadata service has not been probed yet.
    pub fn cached_compute_detection(&self) -> Option<bool> {
        self.on_gce.get().copied()
    }

    /// Returns the default project id.
    ///
    /// Tries, in order, the `GCLOUD_PROJECT` and `GOOGLE_CLOUD_PROJECT`
    /// environment variables, the `project_id` in the file named by
    /// `GOOGLE_APPLICATION_CREDENTIALS`, the Google Cloud SDK configuration,
    /// and the metadata service.
    pub async fn default_project_id(&self) -> Result<String> {
        self.project_id
            .get_or_try_init(|| self.detect_project_id())
            .await
            .cloned()
    }

    async fn resolve(&self) -> Result<Credentials> {
        if let Some(json) = &self.credentials_json {
            tracing::debug!("using the explicit credentials");
            return self
                .from_json(json.clone())
                .map_err(|e| e.with_context("cannot create credentials from the explicit JSON"));
        }
        if let Some(credentials) = self.from_env_var().await? {
            tracing::info!(kind = ?credentials.kind(), "loaded credentials from {GOOGLE_APPLICATION_CREDENTIALS_VAR}");
            return Ok(credentials);
        }
        if let Some(credentials) = self.from_well_known_file().await? {
            tracing::info!(kind = ?credentials.kind(), "loaded credentials from the well-known file");
            return Ok(credentials);
        }
        if self.is_running_on_compute().await {
            tracing::info!("using the metadata service credentials");
            return Ok(mds::Builder::default()
                .with_endpoint(self.metadata_endpoint.clone())
                .with_transporter(self.transporter.clone())
                .build());
        }
        tracing::warn!("no credentials found");
        Err(CredentialsError::exhausted(EXHAUSTED_MESSAGE))
    }

    async fn from_env_var(&self) -> Result<Option<Credentials>> {
        let Some(path) = self
            .env
            .var(GOOGLE_APPLICATION_CREDENTIALS_VAR)
            .filter(|p| !p.is_empty())
        else {
            return Ok(None);
        };
        self.load_file(Path::new(&path)).await.map(Some).map_err(|e| {
            e.with_context(format!(
                "Unable to read the credential file specified by the {GOOGLE_APPLICATION_CREDENTIALS_VAR} environment variable"
            ))
        })
    }

    fn well_known_path(&self) -> Option<PathBuf> {
        let (var, parts) = if self.platform.is_windows() {
            (APPDATA_VAR, WINDOWS_WELL_KNOWN_PATH)
        } else {
            (HOME_VAR, UNIX_WELL_KNOWN_PATH)
        };
        let base = self.env.var(var).filter(|v| !v.is_empty())?;
        Some(self.paths.join(&base, parts))
    }

    async fn from_well_known_file(&self) -> Result<Option<Credentials>> {
        let Some(path) = self.well_known_path() else {
            tracing::debug!("cannot build the well-known file path");
            return Ok(None);
        };
        if !self.fs.exists(&path).await {
            tracing::debug!(path = %path.display(), "the well-known file does not exist");
            return Ok(None);
        }
        self.load_file(&path).await.map(Some).map_err(|e| {
            e.with_context(format!(
                "Unable to read the default credential file at {}",
                path.display()
            ))
        })
    }

    async fn read_json_file(&self, path: &Path) -> Result<Value> {
        if path.as_os_str().is_empty() {
            return Err(BuildError::invalid_path("the path must be non-empty").into());
        }
        let not_a_file = |detail: String| {
            CredentialsError::from(BuildError::invalid_path(format!(
                "the file at {} does not exist, or it is not a file: {detail}",
                path.display()
            )))
        };
        let resolved = self
            .fs
            .canonicalize(path)
            .await
            .map_err(|e| not_a_file(e.to_string()))?;
        match self.fs.is_dir(&resolved).await {
            Ok(false) => {}
            Ok(true) => return Err(not_a_file("it is a directory".to_string())),
            Err(e) => return Err(not_a_file(e.to_string())),
        }
        let contents = self
            .fs
            .read(&resolved)
            .await
            .map_err(BuildError::loading)?;
        Ok(serde_json::from_slice(&contents).map_err(BuildError::parsing)?)
    }

    async fn load_file(&self, path: &Path) -> Result<Credentials> {
        tracing::debug!(path = %path.display(), "loading credentials file");
        self.from_json(self.read_json_file(path).await?)
    }

    async fn detect_project_id(&self) -> Result<String> {
        for var in [GCLOUD_PROJECT_VAR, GOOGLE_CLOUD_PROJECT_VAR] {
            if let Some(project_id) = self.env.var(var).filter(|p| !p.is_empty()) {
                tracing::debug!("project id from {var}");
                return Ok(project_id);
            }
        }
        if let Some(project_id) = self.project_id_from_file().await {
            tracing::debug!("project id from {GOOGLE_APPLICATION_CREDENTIALS_VAR}");
            return Ok(project_id);
        }
        if let Some(project_id) = self.sdk.project_id().await.filter(|p| !p.is_empty()) {
            tracing::debug!("project id from the Google Cloud SDK configuration");
            return Ok(project_id);
        }
        if self.is_running_on_compute().await {
            match mds::project_id(self.transporter.as_ref(), &self.metadata_endpoint).await {
                Ok(project_id) => {
                    tracing::debug!("project id from the metadata service");
                    return Ok(project_id);
                }
                Err(e) => tracing::debug!("cannot get the project id from the metadata service: {e}"),
            }
        }
        Err(CredentialsError::exhausted(NO_PROJECT_MESSAGE))
    }

    async fn project_id_from_file(&self) -> Option<String> {
        let path = self
            .env
            .var(GOOGLE_APPLICATION_CREDENTIALS_VAR)
            .filter(|p| !p.is_empty())?;
        let json = self
            .read_json_file(Path::new(&path))
            .await
            .inspect_err(|e| tracing::debug!("cannot read the project id from {path}: {e}"))
            .ok()?;
        json.get("project_id")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COMPUTE_PLACEHOLDER_REFRESH_TOKEN;
    use crate::credentials::CredentialsKind;
    use crate::credentials::tests::{authorized_user_json, service_account_json};
    use crate::environment::StaticEnv;
    use crate::environment::tests::{MockFileSystem, MockSdkConfig};
    use crate::transport::tests::MockTransporter;
    use http::StatusCode;
    use serde_json::json;
    use std::io;

    fn flavor_response() -> crate::transport::HttpResponse {
        http::Response::builder()
            .status(StatusCode::OK)
            .header("metadata-flavor", "Google")
            .body(bytes::Bytes::new())
            .unwrap()
    }

    fn on_gce() -> MockTransporter {
        let mut mock = MockTransporter::new();
        mock.expect_execute()
            .withf(|r| r.uri().host() == Some("metadata.google.internal"))
            .times(1)
            .returning(|_| Ok(flavor_response()));
        mock
    }

    fn off_gce() -> MockTransporter {
        let mut mock = MockTransporter::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Err(CredentialsError::from_msg(true, "connection refused")));
        mock
    }

    fn no_sdk() -> MockSdkConfig {
        let mut sdk = MockSdkConfig::new();
        sdk.expect_project_id().returning(|| None);
        sdk
    }

    fn write_json(dir: &Path, name: &str, json: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, json.to_string()).unwrap();
        path
    }

    fn well_known(home: &Path, json: &Value) -> PathBuf {
        let dir = home.join(".config").join("gcloud");
        std::fs::create_dir_all(&dir).unwrap();
        write_json(&dir, WELL_KNOWN_FILE, json)
    }

    #[derive(Debug)]
    struct Linux;
    impl PlatformProbe for Linux {
        fn is_windows(&self) -> bool {
            false
        }
    }

    #[derive(Debug)]
    struct Windows;
    impl PlatformProbe for Windows {
        fn is_windows(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn explicit_json() -> anyhow::Result<()> {
        let resolver = Resolver::builder()
            .with_env(StaticEnv::default())
            .with_file_system(MockFileSystem::new())
            .with_transporter(Arc::new(MockTransporter::new()))
            .with_credentials_json(authorized_user_json())
            .build();
        let credentials = resolver.application_default().await?;
        assert_eq!(credentials.kind(), CredentialsKind::UserRefresh);
        assert_eq!(resolver.cached_compute_detection(), None);
        Ok(())
    }

    #[tokio::test]
    async fn env_var_wins() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_json(dir.path(), "sa.json", &service_account_json());
        well_known(dir.path(), &authorized_user_json());
        // Neither the well-known file nor the metadata service are consulted.
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([
                (GOOGLE_APPLICATION_CREDENTIALS_VAR, &*path.to_string_lossy()),
                (HOME_VAR, &*dir.path().to_string_lossy()),
            ]))
            .with_platform(Linux)
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        let credentials = resolver.application_default().await?;
        assert_eq!(credentials.kind(), CredentialsKind::ServiceAccount);
        assert_eq!(resolver.cached_compute_detection(), None);
        Ok(())
    }

    #[tokio::test]
    async fn env_var_failure_is_terminal() -> anyhow::Result<()> {
        let _guard = google_cloud_adc_test_utils::tracing::enable_tracing();
        let dir = tempfile::tempdir()?;
        well_known(dir.path(), &authorized_user_json());
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([
                (
                    GOOGLE_APPLICATION_CREDENTIALS_VAR,
                    &*dir.path().join("missing.json").to_string_lossy(),
                ),
                (HOME_VAR, &*dir.path().to_string_lossy()),
            ]))
            .with_platform(Linux)
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        let err = resolver.application_default().await.unwrap_err();
        assert!(err.is_configuration(), "{err:?}");
        assert!(err.build_error().unwrap().is_invalid_path(), "{err:?}");
        assert!(
            err.to_string().contains(GOOGLE_APPLICATION_CREDENTIALS_VAR),
            "{err}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn env_var_directory() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(
                GOOGLE_APPLICATION_CREDENTIALS_VAR,
                &*dir.path().to_string_lossy(),
            )]))
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        let err = resolver.application_default().await.unwrap_err();
        assert!(err.build_error().unwrap().is_invalid_path(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn env_var_empty_is_ignored() -> anyhow::Result<()> {
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(GOOGLE_APPLICATION_CREDENTIALS_VAR, "")]))
            .with_platform(Linux)
            .with_transporter(Arc::new(off_gce()))
            .build();
        let err = resolver.application_default().await.unwrap_err();
        assert!(err.is_exhausted(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn env_var_bad_json() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json")?;
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(
                GOOGLE_APPLICATION_CREDENTIALS_VAR,
                &*path.to_string_lossy(),
            )]))
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        let err = resolver.application_default().await.unwrap_err();
        assert!(err.build_error().unwrap().is_parsing(), "{err:?}");

        std::fs::write(&path, json!({"type": "unknown"}).to_string())?;
        let err = resolver.application_default().await.unwrap_err();
        assert!(err.build_error().unwrap().is_unknown_type(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn well_known_file_before_gce() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        well_known(dir.path(), &authorized_user_json());
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(
                HOME_VAR,
                &*dir.path().to_string_lossy(),
            )]))
            .with_platform(Linux)
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        let credentials = resolver.application_default().await?;
        assert_eq!(credentials.kind(), CredentialsKind::UserRefresh);
        assert_eq!(resolver.cached_compute_detection(), None);
        Ok(())
    }

    #[tokio::test]
    async fn well_known_file_windows() -> anyhow::Result<()> {
        let mut fs = MockFileSystem::new();
        let want = PathBuf::from("C:/Users/test/AppData")
            .join(CLOUDSDK_CONFIG_DIR)
            .join(WELL_KNOWN_FILE);
        let expected = want.clone();
        fs.expect_exists()
            .withf(move |p| p == expected.as_path())
            .times(1)
            .returning(|_| true);
        fs.expect_canonicalize()
            .times(1)
            .returning(|p| Ok(p.to_path_buf()));
        fs.expect_is_dir().times(1).returning(|_| Ok(false));
        fs.expect_read()
            .times(1)
            .returning(|_| Ok(authorized_user_json().to_string().into_bytes()));

        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([
                (APPDATA_VAR, "C:/Users/test/AppData"),
                (HOME_VAR, "/home/test"),
            ]))
            .with_platform(Windows)
            .with_file_system(fs)
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        let credentials = resolver.application_default().await?;
        assert_eq!(credentials.kind(), CredentialsKind::UserRefresh);
        Ok(())
    }

    #[tokio::test]
    async fn well_known_file_load_error() -> anyhow::Result<()> {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| true);
        fs.expect_canonicalize().returning(|p| Ok(p.to_path_buf()));
        fs.expect_is_dir().returning(|_| Ok(false));
        fs.expect_read()
            .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(HOME_VAR, "/home/test")]))
            .with_platform(Linux)
            .with_file_system(fs)
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        let err = resolver.application_default().await.unwrap_err();
        assert!(err.build_error().unwrap().is_loading(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn missing_home_falls_through_to_gce() -> anyhow::Result<()> {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().never();
        let resolver = Resolver::builder()
            .with_env(StaticEnv::default())
            .with_platform(Linux)
            .with_file_system(fs)
            .with_transporter(Arc::new(on_gce()))
            .build();
        let credentials = resolver.application_default().await?;
        assert_eq!(credentials.kind(), CredentialsKind::ComputeEngine);
        assert_eq!(
            credentials.credentials().refresh_token.as_deref(),
            Some(COMPUTE_PLACEHOLDER_REFRESH_TOKEN)
        );
        assert_eq!(resolver.cached_compute_detection(), Some(true));
        Ok(())
    }

    #[tokio::test]
    async fn exhausted() -> anyhow::Result<()> {
        let _guard = google_cloud_adc_test_utils::tracing::enable_tracing();
        let dir = tempfile::tempdir()?;
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(
                HOME_VAR,
                &*dir.path().to_string_lossy(),
            )]))
            .with_platform(Linux)
            .with_transporter(Arc::new(off_gce()))
            .build();
        let err = resolver.application_default().await.unwrap_err();
        assert!(err.is_exhausted(), "{err:?}");
        assert_eq!(err.to_string(), EXHAUSTED_MESSAGE);
        assert_eq!(resolver.cached_compute_detection(), Some(false));

        // The probe result is cached, and failures are not.
        let err = resolver.application_default().await.unwrap_err();
        assert!(err.is_exhausted(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn memoized_per_resolver() -> anyhow::Result<()> {
        let make = || {
            Resolver::builder()
                .with_env(StaticEnv::default())
                .with_credentials_json(authorized_user_json())
                .build()
        };
        let resolver = make();
        let first = resolver.application_default().await?;
        let second = resolver.application_default().await?;
        assert!(Credentials::ptr_eq(&first, &second));

        let other = make().application_default().await?;
        assert!(!Credentials::ptr_eq(&first, &other));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolution() -> anyhow::Result<()> {
        let resolver = Arc::new(
            Resolver::builder()
                .with_env(StaticEnv::default())
                .with_platform(Linux)
                .with_transporter(Arc::new(on_gce()))
                .build(),
        );
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.application_default().await })
            })
            .collect();
        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await??);
        }
        assert!(results.iter().all(|c| Credentials::ptr_eq(c, &results[0])));
        Ok(())
    }

    #[test]
    fn metadata_endpoint() {
        let resolver = Resolver::builder().with_env(StaticEnv::default()).build();
        assert_eq!(resolver.metadata_endpoint, METADATA_ROOT);

        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(GCE_METADATA_HOST_VAR, "169.254.169.254")]))
            .build();
        assert_eq!(resolver.metadata_endpoint, "http://169.254.169.254");

        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(GCE_METADATA_HOST_VAR, "169.254.169.254")]))
            .with_metadata_endpoint("http://localhost:8080/")
            .build();
        assert_eq!(resolver.metadata_endpoint, "http://localhost:8080");
    }

    #[tokio::test]
    async fn project_id_env_vars() -> anyhow::Result<()> {
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([
                (GCLOUD_PROJECT_VAR, "gcloud-project"),
                (GOOGLE_CLOUD_PROJECT_VAR, "cloud-project"),
            ]))
            .with_sdk_config(MockSdkConfig::new())
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        assert_eq!(resolver.default_project_id().await?, "gcloud-project");

        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(GOOGLE_CLOUD_PROJECT_VAR, "cloud-project")]))
            .with_sdk_config(MockSdkConfig::new())
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        assert_eq!(resolver.default_project_id().await?, "cloud-project");
        Ok(())
    }

    #[tokio::test]
    async fn project_id_from_credentials_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_json(dir.path(), "sa.json", &service_account_json());
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(
                GOOGLE_APPLICATION_CREDENTIALS_VAR,
                &*path.to_string_lossy(),
            )]))
            .with_sdk_config(MockSdkConfig::new())
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        assert_eq!(resolver.default_project_id().await?, "test-project-id");
        Ok(())
    }

    #[tokio::test]
    async fn project_id_from_sdk() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        // A missing credentials file means "try the next source".
        let mut sdk = MockSdkConfig::new();
        sdk.expect_project_id()
            .times(1)
            .returning(|| Some("sdk-project".to_string()));
        let resolver = Resolver::builder()
            .with_env(StaticEnv::from_iter([(
                GOOGLE_APPLICATION_CREDENTIALS_VAR,
                &*dir.path().join("missing.json").to_string_lossy(),
            )]))
            .with_sdk_config(sdk)
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        assert_eq!(resolver.default_project_id().await?, "sdk-project");
        // Cached.
        assert_eq!(resolver.default_project_id().await?, "sdk-project");
        Ok(())
    }

    #[tokio::test]
    async fn project_id_from_metadata() -> anyhow::Result<()> {
        let mut seq = mockall::Sequence::new();
        let mut mock = MockTransporter::new();
        mock.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(flavor_response()));
        mock.expect_execute()
            .withf(|r| r.uri().path() == crate::constants::MDS_PROJECT_ID_PATH)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(http::Response::builder()
                    .status(StatusCode::OK)
                    .body(bytes::Bytes::from_static(b"mds-project"))
                    .unwrap())
            });
        let resolver = Resolver::builder()
            .with_env(StaticEnv::default())
            .with_sdk_config(no_sdk())
            .with_transporter(Arc::new(mock))
            .build();
        assert_eq!(resolver.default_project_id().await?, "mds-project");
        assert_eq!(resolver.cached_compute_detection(), Some(true));
        Ok(())
    }

    #[tokio::test]
    async fn project_id_not_found() {
        let resolver = Resolver::builder()
            .with_env(StaticEnv::default())
            .with_sdk_config(no_sdk())
            .with_transporter(Arc::new(off_gce()))
            .build();
        let err = resolver.default_project_id().await.unwrap_err();
        assert_eq!(err.to_string(), NO_PROJECT_MESSAGE);
    }

    #[tokio::test]
    async fn from_json_and_stream_are_not_cached() -> anyhow::Result<()> {
        let resolver = Resolver::builder()
            .with_env(StaticEnv::default())
            .with_transporter(Arc::new(MockTransporter::new()))
            .build();
        let a = resolver.from_json(service_account_json())?;
        let contents = service_account_json().to_string();
        let b = resolver.from_stream(contents.as_bytes()).await?;
        assert_eq!(a.kind(), CredentialsKind::ServiceAccount);
        assert!(!Credentials::ptr_eq(&a, &b));
        Ok(())
    }
}
