//! Ordered, fail-fast checklists
//!
//! A [`Step`] pairs a human-readable name with a [`Check`]. A [`StepList`] runs
//! its steps strictly in order, each under [`eventually`], and stops at the
//! first step that does not converge. The error returned names that step and
//! carries its last failure.

use tracing::info;

use crate::checks::Check;
use crate::crd::SearchCluster;
use crate::reader::StateReader;
use crate::retry::{eventually, ConvergenceConfig};
use crate::Result;

/// A named check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// Name used in logs and in the error of a failed run
    pub name: String,
    /// Predicate polled until it passes
    pub check: Check,
}

impl Step {
    /// Create a step
    pub fn new(name: impl Into<String>, check: Check) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

/// An ordered list of steps
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepList {
    steps: Vec<Step>,
}

impl StepList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard post-mutation checklist
    ///
    /// Certificates come first since pods cannot become Ready without them.
    /// Health is checked after the pod set is right so a transiently green
    /// cluster with missing pods does not pass.
    pub fn k8s_checks() -> Self {
        Self::from(vec![
            Step::new(
                "CA certificates should eventually be set correctly",
                Check::CertificateAuthorities,
            ),
            Step::new(
                "Pod certificates should eventually be set correctly",
                Check::InstanceCertificates,
            ),
            Step::new(
                "Expected pods should eventually be ready",
                Check::ExpectedInstancesReady,
            ),
            Step::new(
                "All pods should eventually run the expected version",
                Check::Version,
            ),
            Step::new("Services should be created", Check::Services),
            Step::new("Services should have endpoints", Check::ServiceEndpoints),
            Step::new(
                "Cluster health should eventually be green",
                Check::ClusterHealth,
            ),
            Step::new("Admin user password should be set", Check::AdminPassword),
            Step::new(
                "Data volumes should have the requested storage class",
                Check::DataVolumeType,
            ),
        ])
    }

    /// Stamp every pod with its fingerprint, then wait for the stamps to show
    pub fn annotate_with_fingerprint() -> Self {
        Self::from(vec![
            Step::new(
                "Annotate pods with the spec fingerprint",
                Check::AnnotateInstances,
            ),
            Step::new(
                "Pod annotations should be visible",
                Check::InstanceAnnotationsVisible,
            ),
        ])
    }

    /// Wait until the expected number of pods all report the given phase
    pub fn pods_in_phase(phase: impl Into<String>) -> Self {
        let phase = phase.into();
        Self::from(vec![Step::new(
            format!("All pods should eventually be {phase}"),
            Check::InstancesInPhase(phase),
        )])
    }

    /// Append a step
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Append every step of another list
    pub fn extend(&mut self, other: StepList) {
        self.steps.extend(other.steps);
    }

    /// Steps in run order
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the list has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in run order
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run every step in order until one fails to converge
    ///
    /// Each step gets its own full deadline from `config`. The error of the
    /// failing step is returned as [`crate::Error::Step`]; later steps never run.
    pub async fn run(
        &self,
        cluster: &SearchCluster,
        reader: &dyn StateReader,
        config: &ConvergenceConfig,
    ) -> Result<()> {
        let total = self.steps.len();
        for (index, step) in self.steps.iter().enumerate() {
            info!(step = %step.name, index = index + 1, total, "running step");
            eventually(config, &step.name, || step.check.evaluate(cluster, reader))
                .await
                .map_err(|e| e.in_step(&step.name))?;
            info!(step = %step.name, "step passed");
        }
        Ok(())
    }
}

impl From<Vec<Step>> for StepList {
    fn from(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

impl<'a> IntoIterator for &'a StepList {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
