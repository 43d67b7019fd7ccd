//! Lattice Verify - convergence checks for SearchCluster resources
//!
//! The operator reconciling a `SearchCluster` applies changes in the background,
//! so a freshly mutated cluster passes through many partial states before it
//! matches its spec. This crate provides the checks that tell "not converged
//! yet" apart from "converged to the wrong thing".
//!
//! # Modules
//!
//! - [`crd`] - The SearchCluster custom resource (the desired state)
//! - [`naming`] - Resource names and label selectors derived from a cluster
//! - [`fingerprint`] - Spec fingerprints used to detect unfinished rollouts
//! - [`pki`] - Loading of CA and transport certificates
//! - [`reader`] - Read/update facade over the Kubernetes API
//! - [`checks`] - Single-attempt predicates comparing observed and desired state
//! - [`retry`] - Polling driver turning predicates into "wait until true" steps
//! - [`steps`] - Ordered, fail-fast checklists of named steps
//! - [`annotate`] - Stamping pods with their current spec fingerprint
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod annotate;
pub mod checks;
pub mod crd;
pub mod error;
pub mod fingerprint;
pub mod kube_utils;
pub mod naming;
pub mod pki;
pub mod reader;
pub mod retry;
pub mod steps;

#[cfg(test)]
pub(crate) mod testing;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Annotation holding the spec fingerprint a pod was last stamped with
///
/// Written by the annotator and compared by the expected-pods check. A pod
/// carrying a different non-empty value still runs a previous spec.
pub const FINGERPRINT_ANNOTATION: &str = "search.lattice.dev/spec-fingerprint";

/// Label carrying the owning cluster name on every managed resource
pub const CLUSTER_NAME_LABEL: &str = "search.lattice.dev/cluster-name";

/// Label carrying the owning StatefulSet name on every pod
pub const STATEFULSET_NAME_LABEL: &str = "search.lattice.dev/statefulset-name";

/// Label carrying the search engine version a pod runs
pub const VERSION_LABEL: &str = "search.lattice.dev/version";
