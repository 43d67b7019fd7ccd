//! Error types for convergence checks
//!
//! Errors carry both the expected and the observed value wherever a comparison
//! failed, so the last error of a timed-out step is enough to diagnose it.

use thiserror::Error;

use crate::pki::PkiError;

/// Main error type for verification operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error other than not-found or conflict
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A required object is absent from the store
    #[error("{kind} {name} not found")]
    NotFound {
        /// Kind of the missing object (e.g. "Secret", "Service")
        kind: String,
        /// Namespaced name of the missing object
        name: String,
    },

    /// A secret exists but lacks the requested key
    #[error("secret {secret} has no key {key}")]
    KeyMissing {
        /// Namespaced name of the secret
        secret: String,
        /// The missing data key
        key: String,
    },

    /// An observed value disagrees with the expected one
    #[error("{subject}: expected {expected}, got {actual}")]
    Mismatch {
        /// What was compared
        subject: String,
        /// Value derived from the desired spec
        expected: String,
        /// Value observed in the store
        actual: String,
    },

    /// A pod exists but does not report Ready
    #[error("pod {instance} is not Ready.\nStatus:{status}")]
    InstanceNotReady {
        /// Pod name
        instance: String,
        /// Pretty-printed pod status at the time of the check
        status: String,
    },

    /// A pod is still stamped with the fingerprint of a previous spec
    #[error(
        "pod {instance} was not upgraded (yet?) to match the expected specification: \
         fingerprint {actual}, expected {expected}"
    )]
    StaleInstance {
        /// Pod name
        instance: String,
        /// Fingerprint of the current spec
        expected: String,
        /// Fingerprint found on the pod
        actual: String,
    },

    /// A write lost a race with a concurrent writer
    #[error("conflict updating {kind} {name}: {message}")]
    Conflict {
        /// Kind of the object being written
        kind: String,
        /// Namespaced name of the object
        name: String,
        /// Message returned by the API server
        message: String,
    },

    /// Certificate or key material could not be loaded
    #[error("pki error: {source}")]
    Pki {
        /// The underlying PKI error
        #[from]
        source: PkiError,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },

    /// The desired spec itself is invalid
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
    },

    /// A checklist step did not converge before its deadline
    #[error("{step}: {source}")]
    Step {
        /// Human-readable step name
        step: String,
        /// Last error observed before the deadline
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not-found error for an object of the given kind
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a missing-key error for a secret
    pub fn key_missing(secret: impl Into<String>, key: impl Into<String>) -> Self {
        Self::KeyMissing {
            secret: secret.into(),
            key: key.into(),
        }
    }

    /// Create a mismatch error carrying both values
    pub fn mismatch(
        subject: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::Mismatch {
            subject: subject.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a not-ready error with the pod's serialized status
    pub fn instance_not_ready(instance: impl Into<String>, status: impl Into<String>) -> Self {
        Self::InstanceNotReady {
            instance: instance.into(),
            status: status.into(),
        }
    }

    /// Create a stale-fingerprint error
    pub fn stale_instance(
        instance: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::StaleInstance {
            instance: instance.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a write-conflict error
    pub fn conflict(
        kind: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            kind: kind.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Attach the name of the step that failed
    pub fn in_step(self, step: impl Into<String>) -> Self {
        Self::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, looking through step wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error means the object is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NotFound { .. })
    }

    /// Whether this error is a lost write race
    pub fn is_conflict(&self) -> bool {
        matches!(self.root(), Error::Conflict { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}
