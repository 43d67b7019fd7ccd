//! Shared Kubernetes helpers for the checks and the kube-backed reader

use k8s_openapi::api::core::v1::{Pod, PodCondition};
use kube::ResourceExt;

use crate::Error;

/// The "Ready" condition type for pods
pub const CONDITION_READY: &str = "Ready";
/// The "True" status value for conditions
pub const STATUS_TRUE: &str = "True";

/// Check if a Kubernetes condition of the given type has status "True"
///
/// # Returns
/// `true` if a condition with the given type exists and has status "True"
pub fn has_condition<T>(conditions: Option<&[T]>, condition_type: &str) -> bool
where
    T: HasConditionFields,
{
    conditions
        .map(|conds| {
            conds
                .iter()
                .any(|c| c.type_field() == condition_type && c.status_field() == STATUS_TRUE)
        })
        .unwrap_or(false)
}

/// Trait for types that have condition-like fields (type and status)
pub trait HasConditionFields {
    /// Get the condition type field value
    fn type_field(&self) -> &str;
    /// Get the condition status field value
    fn status_field(&self) -> &str;
}

impl HasConditionFields for PodCondition {
    fn type_field(&self) -> &str {
        &self.type_
    }
    fn status_field(&self) -> &str {
        &self.status
    }
}

/// Whether a pod reports the Ready condition
pub fn is_pod_ready(pod: &Pod) -> bool {
    let conditions = pod.status.as_ref().and_then(|s| s.conditions.as_deref());
    has_condition(conditions, CONDITION_READY)
}

/// Lifecycle phase of a pod, empty when not reported
pub fn pod_phase(pod: &Pod) -> &str {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or("")
}

/// Value of an annotation, empty when absent
pub fn annotation<'a>(pod: &'a Pod, key: &str) -> &'a str {
    pod.annotations().get(key).map(String::as_str).unwrap_or("")
}

/// Value of a label, empty when absent
pub fn label<'a>(pod: &'a Pod, key: &str) -> &'a str {
    pod.labels().get(key).map(String::as_str).unwrap_or("")
}

/// Pretty-printed pod status for diagnostics
pub fn status_json(pod: &Pod) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(&pod.status)?)
}

/// Sorted names of the given pods
pub fn sorted_names(pods: &[Pod]) -> Vec<String> {
    let mut names: Vec<String> = pods.iter().map(|p| p.name_any()).collect();
    names.sort();
    names
}

/// Translate a kube error into the checks' error taxonomy
///
/// 404 becomes [`Error::NotFound`] and 409 becomes [`Error::Conflict`]; every
/// other failure stays a [`Error::Kube`].
pub fn classify_api_error(err: kube::Error, kind: &str, name: &str) -> Error {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => Error::not_found(kind, name),
        kube::Error::Api(ae) if ae.code == 409 => Error::conflict(kind, name, ae.message),
        other => Error::from(other),
    }
}
