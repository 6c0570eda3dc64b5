//! Error taxonomy for the content-resolution-and-decrypt pipeline.
//!
//! Every failure the pipeline can report is one of the variants below. Leaf
//! failures are wrapped in [`Error::Leaf`] so that callers always see which
//! track or episode was being processed when things went wrong.

use std::fmt;

use thiserror::Error;

use crate::types::{ContainerFormat, Quality};

/// The license-protocol step that failed while acquiring a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStep {
    PsshLookup,
    Challenge,
    LicenseRequest,
    LicenseParse,
    ResponseDecode,
    Deobfuscate,
}

impl fmt::Display for KeyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyStep::PsshLookup => "pssh lookup",
            KeyStep::Challenge => "license challenge",
            KeyStep::LicenseRequest => "license request",
            KeyStep::LicenseParse => "license parse",
            KeyStep::ResponseDecode => "response decode",
            KeyStep::Deobfuscate => "key deobfuscation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The user-supplied reference matched no known URL, URI or ID form.
    #[error("invalid content reference: {0}")]
    InvalidReference(String),

    /// Transport failure or non-2xx response from any HTTP collaborator.
    #[error("upstream request to {url} failed{}: {message}", status_suffix(.status))]
    Upstream {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// A response body could not be decoded.
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: crate::CapabilityError,
    },

    /// The leaf has no audio file for the configured quality.
    #[error("no {quality} file available for [{id}]")]
    FormatUnavailable { id: String, quality: Quality },

    #[error("{format} key acquisition failed at {step}: {message}")]
    KeyAcquisition {
        format: ContainerFormat,
        step: KeyStep,
        message: String,
    },

    #[error("failed to decrypt {format} file: {source}")]
    Decrypt {
        format: ContainerFormat,
        #[source]
        source: crate::CapabilityError,
    },

    /// Transcoding or tagging failed. The decrypted output is left in place.
    #[error("post-processing ({stage}) failed: {source}")]
    PostProcess {
        stage: &'static str,
        #[source]
        source: crate::CapabilityError,
    },

    #[error("failed to download [{name}]: {source}")]
    Leaf {
        id: String,
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn upstream(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Upstream {
            url: url.into(),
            status: None,
            message: message.to_string(),
        }
    }

    pub(crate) fn decode(
        context: impl Into<String>,
        source: impl Into<crate::CapabilityError>,
    ) -> Self {
        Error::Decode {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn key(format: ContainerFormat, step: KeyStep, message: impl fmt::Display) -> Self {
        Error::KeyAcquisition {
            format,
            step,
            message: message.to_string(),
        }
    }

    /// Wraps a per-leaf failure with the leaf's display name, falling back to
    /// the raw ID when metadata never arrived.
    pub(crate) fn leaf(id: &str, name: Option<&str>, source: Error) -> Self {
        Error::Leaf {
            id: id.to_string(),
            name: name.unwrap_or(id).to_string(),
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, looking through [`Error::Leaf`].
    pub fn root(&self) -> &Error {
        match self {
            Error::Leaf { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Cancelled)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" with status [{s}]"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
