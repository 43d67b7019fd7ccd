//! Spec fingerprints for rollout detection
//!
//! A fingerprint summarizes everything about a node set that forces its pods to
//! be replaced when it changes: the node set itself, the cluster version, and the
//! HTTP exposure config. Pods are stamped with it (see [`crate::annotate`]) and a
//! pod stamped with a different value has not been replaced yet.
//!
//! The node set count is zeroed before hashing. Scaling does not cycle existing
//! pods, so including the count would make untouched pods look stale.
//!
//! Anything outside the hashed fields is invisible here. A rollout triggered by,
//! for example, a rotated secret keeps the same fingerprint and will not be
//! reported as incomplete.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::crd::{NodeSet, SearchClusterSpec};
use crate::Result;

/// Number of hex characters kept from each SHA-256 digest
const DIGEST_HEX_LEN: usize = 16;

/// Compute the fingerprint of a node set within a cluster spec
///
/// The zeroed node set, the version, and the HTTP config are hashed
/// independently and the fixed-width digests are hashed once more, so no two
/// different inputs can serialize to the same concatenation.
pub fn node_set_fingerprint(spec: &SearchClusterSpec, node_set: &NodeSet) -> Result<String> {
    let mut shape = node_set.clone();
    shape.count = 0;

    let spec_hash = hash_object(&shape)?;
    let version_hash = hash_object(&spec.version)?;
    let http_hash = hash_object(&spec.http)?;

    hash_object(&format!("{spec_hash}{version_hash}{http_hash}"))
}

/// Hash the canonical JSON form of a value
///
/// Struct fields serialize in declaration order and every map in the CRD is a
/// `BTreeMap`, so the output is stable across processes and toolchains.
pub fn hash_object<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(truncated_hex(&Sha256::digest(&bytes)))
}

fn truncated_hex(digest: &[u8]) -> String {
    use std::fmt::Write;

    digest[..DIGEST_HEX_LEN / 2]
        .iter()
        .fold(String::with_capacity(DIGEST_HEX_LEN), |mut s, b| {
            let _ = write!(s, "{:02x}", b);
            s
        })
}
