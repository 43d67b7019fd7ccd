//! Stories about rolling out a spec change
//!
//! Before mutating a cluster, a test stamps every pod with the fingerprint of
//! the spec it runs. After the mutation the expected-pods check refuses any pod
//! still stamped with the old fingerprint, so a rollout that has not reached
//! every pod is not mistaken for a converged one.

use std::time::Duration;

use lattice_verify::annotate::{
    annotate_instances, check_annotations_visible, expected_fingerprints,
};
use lattice_verify::checks::Check;
use lattice_verify::crd::NodeSet;
use lattice_verify::retry::ConvergenceConfig;
use lattice_verify::steps::StepList;
use lattice_verify::Error;

use super::fake_store::{pod, stamp, FakeStore, Snapshot};
use super::search_cluster;

fn config() -> ConvergenceConfig {
    ConvergenceConfig::new(Duration::from_secs(60), Duration::from_secs(1))
}

/// Story: a version upgrade replaces pods one at a time; until the last one is
/// replaced the old-spec pods are reported as stale
#[tokio::test(start_paused = true)]
async fn version_upgrade_is_detected_until_every_pod_is_replaced() {
    let v1 = search_cluster("8.11.1", vec![NodeSet::new("data", 3)]);
    let store = FakeStore::new(Snapshot::converged(&v1), 2);

    StepList::annotate_with_fingerprint()
        .run(&v1, &store, &config())
        .await
        .expect("annotations land");
    let v1_fingerprint = expected_fingerprints(&v1).expect("fingerprint")["logs-sc-data"].clone();
    assert!(store.peek().pods.values().all(|p| stamp(p) == v1_fingerprint));

    let v2 = search_cluster("8.12.0", vec![NodeSet::new("data", 3)]);
    let err = Check::ExpectedInstancesReady
        .evaluate(&v2, &store)
        .await
        .expect_err("no pod upgraded yet");
    assert!(matches!(err, Error::StaleInstance { .. }));

    // the operator replaces the last ordinal first, the rest later
    store.after(3, |s| {
        s.pods.insert(
            "logs-sc-data-2".to_string(),
            pod("logs", "logs-sc-data", "logs-sc-data-2", "8.12.0"),
        );
    });
    let upgraded = Snapshot::converged(&v2);
    store.after(8, move |s| *s = upgraded);

    StepList::k8s_checks()
        .run(&v2, &store, &config())
        .await
        .expect("upgrade completes");
}

/// Story: the operator keeps updating pods while they are being stamped; lost
/// write races are retried until every pod carries its fingerprint
#[tokio::test(start_paused = true)]
async fn annotation_retries_through_write_conflicts() {
    let cluster = search_cluster(
        "8.11.1",
        vec![NodeSet::new("masters", 1), NodeSet::new("data", 2)],
    );
    let store = FakeStore::new(Snapshot::converged(&cluster), 1);
    store.fail_next_writes(2);

    StepList::annotate_with_fingerprint()
        .run(&cluster, &store, &config())
        .await
        .expect("conflicts are retried");

    assert_eq!(store.accepted_writes(), 3);
    let expected = expected_fingerprints(&cluster).expect("fingerprints");
    for pod in store.peek().pods.values() {
        let sset = &pod.metadata.labels.as_ref().expect("labels")
            [lattice_verify::STATEFULSET_NAME_LABEL];
        assert_eq!(stamp(pod), expected[sset]);
    }
}

/// Story: stamping an already stamped cluster writes nothing
#[tokio::test(start_paused = true)]
async fn reannotating_is_a_no_op() {
    let cluster = search_cluster("8.11.1", vec![NodeSet::new("data", 2)]);
    let store = FakeStore::new(Snapshot::converged(&cluster), 1);
    let steps = StepList::annotate_with_fingerprint();

    steps.run(&cluster, &store, &config()).await.expect("first stamp");
    assert_eq!(store.accepted_writes(), 2);

    steps.run(&cluster, &store, &config()).await.expect("second stamp");
    assert_eq!(store.accepted_writes(), 2);
}

/// Story: the write is accepted but the next read still comes from a cache
/// that has not seen it
#[tokio::test(start_paused = true)]
async fn written_annotations_show_up_after_the_cache_catches_up() {
    let cluster = search_cluster("8.11.1", vec![NodeSet::new("data", 2)]);
    let store = FakeStore::new(Snapshot::converged(&cluster), 3);

    annotate_instances(&cluster, &store).await.expect("writes accepted");
    let err = check_annotations_visible(&cluster, &store)
        .await
        .expect_err("cache is behind");
    assert!(err.to_string().contains("logs-sc-data-0"));

    let visible = ConvergenceConfig::new(Duration::from_secs(10), Duration::from_secs(1));
    lattice_verify::retry::eventually(&visible, "annotations visible", || {
        check_annotations_visible(&cluster, &store)
    })
    .await
    .expect("cache catches up");
}

/// Story: changing one node set leaves the other node sets' pods current
#[tokio::test(start_paused = true)]
async fn only_the_changed_node_set_goes_stale() {
    let before = search_cluster(
        "8.11.1",
        vec![NodeSet::new("masters", 1), NodeSet::new("data", 2)],
    );
    let store = FakeStore::new(Snapshot::converged(&before), 1);
    StepList::annotate_with_fingerprint()
        .run(&before, &store, &config())
        .await
        .expect("annotations land");

    let mut after = before.clone();
    after.spec.node_sets[1]
        .config
        .insert("node.attr.tier".to_string(), "hot".to_string());

    let old = expected_fingerprints(&before).expect("fingerprints");
    let new = expected_fingerprints(&after).expect("fingerprints");
    assert_eq!(old["logs-sc-masters"], new["logs-sc-masters"]);
    assert_ne!(old["logs-sc-data"], new["logs-sc-data"]);

    match Check::ExpectedInstancesReady.evaluate(&after, &store).await {
        Err(Error::StaleInstance { instance, .. }) => {
            assert!(instance.starts_with("logs-sc-data-"));
        }
        other => panic!("Expected StaleInstance, got {other:?}"),
    }
}
