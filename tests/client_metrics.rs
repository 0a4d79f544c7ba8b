use std::collections::HashSet;
use std::sync::Arc;

use metrics_util::debugging::DebuggingRecorder;
use serial_test::serial;
use vetrina::application::MutationExecutor;
use vetrina::cache::{CacheConfig, QueryClient, ResourceKey};
use vetrina::domain::forms::ProfileDraft;
use vetrina::domain::price::Price;
use vetrina::{ActorHandle, MemoryActor};

#[tokio::test]
#[serial]
async fn cache_and_mutation_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let actor = Arc::new(MemoryActor::new());
    actor.seed_watch("Calatrava", Price::from_minor_units(10_000));
    actor.set_latency(std::time::Duration::from_millis(30));
    let client = QueryClient::new(
        CacheConfig::default(),
        ActorHandle::connected(actor.clone()),
    );

    // Miss, coalesced wait, and hit.
    let a = client.clone();
    let b = client.clone();
    tokio::join!(a.watches(), b.watches());
    client.watches().await;
    actor.clear_latency();

    // Fetch error.
    client.invalidate(ResourceKey::Watches);
    actor.fail_next("get_watches");
    client.watches().await;

    // Mutation success and failure.
    let mutations = MutationExecutor::new(client.clone());
    mutations
        .save_profile(ProfileDraft::new("Ada").expect("valid"))
        .await
        .expect("save profile");
    actor.fail_next("save_caller_profile");
    assert!(
        mutations
            .save_profile(ProfileDraft::new("Ada").expect("valid"))
            .await
            .is_err()
    );

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "vetrina_query_hit_total",
        "vetrina_query_miss_total",
        "vetrina_query_coalesced_total",
        "vetrina_query_error_total",
        "vetrina_mutation_total",
        "vetrina_mutation_error_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
