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

//! Capabilities the [Resolver](crate::resolver::Resolver) uses to inspect
//! its environment.
//!
//! Each capability is a trait with a default implementation backed by the
//! host process. Applications and tests replace them through the resolver
//! builder, for example to resolve credentials against a fixed set of
//! environment variables.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Reads environment variables.
pub trait EnvReader: std::fmt::Debug + Send + Sync {
    /// Returns the value of `name`, or `None` if it is not set or not
    /// valid unicode.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the environment of the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvReader for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of environment variables.
///
/// ```
/// # use google_cloud_adc::environment::{EnvReader, StaticEnv};
/// let env = StaticEnv::from_iter([("HOME", "/home/user")]);
/// assert_eq!(env.var("HOME").as_deref(), Some("/home/user"));
/// assert_eq!(env.var("APPDATA"), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticEnv(HashMap<String, String>);

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticEnv {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl EnvReader for StaticEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// Builds file system paths.
pub trait PathJoiner: std::fmt::Debug + Send + Sync {
    /// Appends each of `parts` to `base`.
    fn join(&self, base: &str, parts: &[&str]) -> PathBuf;
}

/// Joins paths with [Path::join].
#[derive(Clone, Copy, Debug, Default)]
pub struct StdPathJoiner;

impl PathJoiner for StdPathJoiner {
    fn join(&self, base: &str, parts: &[&str]) -> PathBuf {
        parts
            .iter()
            .fold(PathBuf::from(base), |path, part| path.join(part))
    }
}

/// Reports the host operating system family.
pub trait PlatformProbe: std::fmt::Debug + Send + Sync {
    /// Returns `true` on Windows.
    fn is_windows(&self) -> bool;
}

/// The platform this crate was compiled for.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostPlatform;

impl PlatformProbe for HostPlatform {
    fn is_windows(&self) -> bool {
        cfg!(windows)
    }
}

/// The file system operations used to load credential files.
#[async_trait::async_trait]
pub trait FileSystem: std::fmt::Debug + Send + Sync {
    /// Returns `true` if `path` exists.
    async fn exists(&self, path: &Path) -> bool;

    /// Returns the absolute path, with all symbolic links resolved.
    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Returns `true` if `path` is a directory.
    async fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Reads the full contents of a file.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The local file system, accessed through [tokio::fs].
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileSystem;

#[async_trait::async_trait]
impl FileSystem for LocalFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::fs::canonicalize(path).await
    }

    async fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(tokio::fs::metadata(path).await?.is_dir())
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// Reads the default project from the Google Cloud SDK configuration.
#[async_trait::async_trait]
pub trait SdkConfig: std::fmt::Debug + Send + Sync {
    /// Returns the configured project, or `None` if the SDK is not
    /// installed or has no project configured.
    async fn project_id(&self) -> Option<String>;
}

/// Queries the `gcloud` command line tool.
#[derive(Clone, Copy, Debug, Default)]
pub struct GcloudSdkConfig;

#[async_trait::async_trait]
impl SdkConfig for GcloudSdkConfig {
    async fn project_id(&self) -> Option<String> {
        let program = if cfg!(windows) { "gcloud.cmd" } else { "gcloud" };
        let output = tokio::process::Command::new(program)
            .args(["-q", "config", "list", "core/project", "--format=json"])
            .output()
            .await;
        match output {
            Ok(output) if output.status.success() => parse_sdk_project(&output.stdout),
            Ok(output) => {
                tracing::debug!(status = %output.status, "gcloud config list failed");
                None
            }
            Err(e) => {
                tracing::debug!("cannot run gcloud: {e}");
                None
            }
        }
    }
}

#[derive(serde::Deserialize)]
struct SdkConfigList {
    core: Option<SdkCoreSection>,
}

#[derive(serde::Deserialize)]
struct SdkCoreSection {
    project: Option<String>,
}

// The output of `gcloud config list core/project --format=json` looks like
// `{"core": {"project": "my-project"}}`.
fn parse_sdk_project(output: &[u8]) -> Option<String> {
    serde_json::from_slice::<SdkConfigList>(output)
        .ok()?
        .core?
        .project
        .filter(|p| !p.is_empty())
}
