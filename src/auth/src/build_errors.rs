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

//! The detailed reason a credential file or JSON object was rejected.

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Problems turning a credential file, stream or JSON object into
/// [Credentials].
///
/// These errors reach applications wrapped in a
/// [CredentialsError](crate::errors::CredentialsError) of kind
/// [Configuration](crate::errors::ErrorKind::Configuration). Use
/// [CredentialsError::build_error](crate::errors::CredentialsError::build_error)
/// to get the details.
///
/// [Credentials]: crate::credentials::Credentials
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    /// The path is empty, is a directory, or cannot be resolved.
    pub fn is_invalid_path(&self) -> bool {
        matches!(self.0, ErrorKind::InvalidPath(_))
    }

    /// A problem opening or reading the credentials file or stream.
    pub fn is_loading(&self) -> bool {
        matches!(self.0, ErrorKind::Loading(_))
    }

    /// The contents are not valid JSON, or do not match the credential type.
    pub fn is_parsing(&self) -> bool {
        matches!(self.0, ErrorKind::Parsing(_))
    }

    /// The `type` field is missing or names an unsupported credential type.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self.0, ErrorKind::UnknownType(_))
    }

    /// A required field is missing or empty.
    pub fn is_missing_field(&self) -> bool {
        matches!(self.0, ErrorKind::MissingField(_))
    }

    pub(crate) fn invalid_path<T: Into<String>>(reason: T) -> Error {
        Error(ErrorKind::InvalidPath(reason.into()))
    }

    pub(crate) fn loading<T>(source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::Loading(source.into()))
    }

    pub(crate) fn parsing<T>(source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::Parsing(source.into()))
    }

    pub(crate) fn unknown_type<T: Into<String>>(credential_type: T) -> Error {
        Error(ErrorKind::UnknownType(credential_type.into()))
    }

    pub(crate) fn missing_field(field: &'static str) -> Error {
        Error(ErrorKind::MissingField(field))
    }
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("invalid credentials path: {0}")]
    InvalidPath(String),
    #[error("cannot read the credentials: {0}")]
    Loading(#[source] BoxError),
    #[error("cannot parse the credentials: {0}")]
    Parsing(#[source] BoxError),
    #[error("unknown or missing credentials type `{0}`")]
    UnknownType(String),
    #[error("the credentials must contain a non-empty `{0}` field")]
    MissingField(&'static str),
}
