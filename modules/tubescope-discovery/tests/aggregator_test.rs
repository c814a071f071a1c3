//! Keyword-search pipeline against an in-memory gateway.

use tubescope_common::MatchScore;
use tubescope_discovery::testing::{channel, hit, video, MockAnalyzer, MockGateway};
use tubescope_discovery::{
    CandidateAggregator, DiscoveryStatus, KeywordDiscovery, NoCandidatesReason, SubscriberBand,
    UnavailableReason,
};

const SEED: &str = "UCseedseedseedseedseedse";

fn seed_videos() -> Vec<tubescope_common::VideoSummary> {
    vec![
        video("v1", "Workbench build", &["woodworking"]),
        video("v2", "Restoring a hand plane", &["hand tools"]),
    ]
}

fn keywords(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

fn titles(report: &tubescope_discovery::DiscoveryReport) -> Vec<&str> {
    report.candidates.iter().map(|c| c.channel.title.as_str()).collect()
}

#[tokio::test]
async fn seed_excluded_and_band_applied() {
    let gateway = MockGateway::new()
        .on_top_videos(SEED, seed_videos())
        .on_search(
            "woodworking",
            vec![hit(SEED, "Seed"), hit("UCsmall", "Small"), hit("UCmid", "Mid"), hit("UChuge", "Huge")],
        )
        .on_search("hand tools", vec![hit("UCmid", "Mid"), hit(SEED, "Seed"), hit("UChuge", "Huge")])
        .on_channel(channel(SEED, "Seed", 80_000))
        .on_channel(channel("UCsmall", "Small", 5_000))
        .on_channel(channel("UCmid", "Mid", 50_000))
        .on_channel(channel("UChuge", "Huge", 600_000));
    let analyzer = MockAnalyzer::answering("woodworking, hand tools");

    let report = KeywordDiscovery::new(&gateway, Some(&analyzer))
        .discover(SEED)
        .await;

    assert_eq!(report.status, DiscoveryStatus::Found);
    assert_eq!(titles(&report), vec!["Mid"]);
    assert_eq!(report.candidates[0].match_score, MatchScore::Occurrences(2));
    assert!(report.candidates.iter().all(|c| c.channel.id != SEED));
    assert!(gateway.batches()[0].iter().all(|id| id != SEED));
}

#[tokio::test]
async fn ranked_by_occurrences_ties_in_discovery_order() {
    let gateway = MockGateway::new()
        .on_search("a", vec![hit("UC1", "One"), hit("UC2", "Two"), hit("UC3", "Three")])
        .on_search("b", vec![hit("UC3", "Three"), hit("UC2", "Two")])
        .on_search("c", vec![hit("UC3", "Three"), hit("UC4", "Four")])
        .on_channel(channel("UC1", "One", 20_000))
        .on_channel(channel("UC2", "Two", 20_000))
        .on_channel(channel("UC3", "Three", 20_000))
        .on_channel(channel("UC4", "Four", 20_000));

    let report = CandidateAggregator::new(&gateway)
        .aggregate(SEED, &keywords(&["a", "b", "c"]))
        .await;

    assert_eq!(titles(&report), vec!["Three", "Two", "One", "Four"]);
    let scores: Vec<f64> = report.candidates.iter().map(|c| c.match_score.value()).collect();
    assert_eq!(scores, vec![3.0, 2.0, 1.0, 1.0]);
}

#[tokio::test]
async fn identical_inputs_identical_output() {
    let build = || {
        MockGateway::new()
            .on_search("x", vec![hit("UC1", "One"), hit("UC2", "Two")])
            .on_search("y", vec![hit("UC2", "Two"), hit("UC1", "One"), hit("UC3", "Three")])
            .on_channel(channel("UC1", "One", 11_000))
            .on_channel(channel("UC2", "Two", 12_000))
            .on_channel(channel("UC3", "Three", 13_000))
    };
    let (g1, g2) = (build(), build());

    let first = CandidateAggregator::new(&g1)
        .with_concurrency(4)
        .aggregate(SEED, &keywords(&["x", "y"]))
        .await;
    let second = CandidateAggregator::new(&g2)
        .with_concurrency(1)
        .aggregate(SEED, &keywords(&["x", "y"]))
        .await;

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn custom_band_bounds_are_inclusive() {
    let gateway = MockGateway::new()
        .on_search("k", vec![hit("UC1", "One"), hit("UC2", "Two"), hit("UC3", "Three")])
        .on_channel(channel("UC1", "One", 99))
        .on_channel(channel("UC2", "Two", 100))
        .on_channel(channel("UC3", "Three", 200));

    let report = CandidateAggregator::new(&gateway)
        .with_band(SubscriberBand::new(100, 200))
        .aggregate(SEED, &keywords(&["k"]))
        .await;

    assert_eq!(titles(&report), vec!["Two", "Three"]);
}

#[tokio::test]
async fn everything_filtered_is_no_candidates() {
    let gateway = MockGateway::new()
        .on_search("k", vec![hit("UC1", "One")])
        .on_channel(channel("UC1", "One", 1_000_000));

    let report = CandidateAggregator::new(&gateway)
        .aggregate(SEED, &keywords(&["k"]))
        .await;

    assert_eq!(
        report.status,
        DiscoveryStatus::NoCandidates(NoCandidatesReason::FilteredOut)
    );
    assert!(report.candidates.is_empty());
}

#[tokio::test]
async fn no_seed_videos_is_no_candidates() {
    let gateway = MockGateway::new();

    let report = KeywordDiscovery::new(&gateway, None).discover(SEED).await;

    assert_eq!(
        report.status,
        DiscoveryStatus::NoCandidates(NoCandidatesReason::NoSeedVideos)
    );
    assert_eq!(gateway.calls("search_videos_by_keyword"), 0);
}

#[tokio::test]
async fn no_keywords_is_no_candidates() {
    // Short title words and no tags: the local fallback finds nothing.
    let gateway = MockGateway::new().on_top_videos(SEED, vec![video("v1", "A day out", &[])]);

    let report = KeywordDiscovery::new(&gateway, None).discover(SEED).await;

    assert_eq!(
        report.status,
        DiscoveryStatus::NoCandidates(NoCandidatesReason::NoKeywords)
    );
    assert_eq!(gateway.calls("search_videos_by_keyword"), 0);
}

#[tokio::test]
async fn only_seed_in_results_is_no_search_hits() {
    let gateway = MockGateway::new().on_search("k", vec![hit(SEED, "Seed")]);

    let report = CandidateAggregator::new(&gateway)
        .aggregate(SEED, &keywords(&["k"]))
        .await;

    assert_eq!(
        report.status,
        DiscoveryStatus::NoCandidates(NoCandidatesReason::NoSearchHits)
    );
    assert_eq!(gateway.calls("get_channels_batch"), 0);
}

#[tokio::test]
async fn partial_search_failure_still_ranks() {
    let gateway = MockGateway::new()
        .fail_search("broken")
        .on_search("fine", vec![hit("UC1", "One")])
        .on_channel(channel("UC1", "One", 20_000));

    let report = CandidateAggregator::new(&gateway)
        .aggregate(SEED, &keywords(&["broken", "fine"]))
        .await;

    assert_eq!(titles(&report), vec!["One"]);
}

#[tokio::test]
async fn all_searches_failing_is_unavailable() {
    let gateway = MockGateway::new().fail_search("a").fail_search("b");

    let report = CandidateAggregator::new(&gateway)
        .aggregate(SEED, &keywords(&["a", "b"]))
        .await;

    assert!(matches!(
        report.status,
        DiscoveryStatus::Unavailable(UnavailableReason::Upstream(_))
    ));
}

#[tokio::test]
async fn gateway_outage_is_unavailable_not_panic() {
    let gateway = MockGateway::new().failing();

    let report = KeywordDiscovery::new(&gateway, None).discover(SEED).await;

    assert!(matches!(report.status, DiscoveryStatus::Unavailable(_)));
    assert!(report.candidates.is_empty());
}

#[tokio::test]
async fn at_most_five_keywords_searched() {
    let gateway = MockGateway::new();

    CandidateAggregator::new(&gateway)
        .aggregate(SEED, &keywords(&["a", "b", "c", "d", "e", "f", "g"]))
        .await;

    assert_eq!(gateway.calls("search_videos_by_keyword"), 5);
}

#[tokio::test]
async fn at_most_twenty_candidates_looked_up() {
    let hits: Vec<_> = (0..25).map(|i| hit(&format!("UC{i:02}"), "Chan")).collect();
    // Each search returns at most ten hits, so spread them over three keywords.
    let mut gateway = MockGateway::new()
        .on_search("k1", hits[..10].to_vec())
        .on_search("k2", hits[10..20].to_vec())
        .on_search("k3", hits[20..].to_vec());
    for h in &hits {
        gateway = gateway.on_channel(channel(&h.channel_id, "Chan", 20_000));
    }

    let report = CandidateAggregator::new(&gateway)
        .aggregate(SEED, &keywords(&["k1", "k2", "k3"]))
        .await;

    assert_eq!(gateway.calls("get_channels_batch"), 1);
    assert_eq!(gateway.batches()[0].len(), 20);
    assert_eq!(report.candidates.len(), 20);
}

#[tokio::test]
async fn metadata_title_falls_back_to_search_title() {
    let gateway = MockGateway::new()
        .on_search("k", vec![hit("UC1", "From search")])
        .on_channel(channel("UC1", "", 20_000));

    let report = CandidateAggregator::new(&gateway)
        .aggregate(SEED, &keywords(&["k"]))
        .await;

    assert_eq!(titles(&report), vec!["From search"]);
}

#[tokio::test]
async fn keywords_come_from_top_videos() {
    let gateway = MockGateway::new().on_top_videos(SEED, seed_videos());

    let keywords = KeywordDiscovery::new(&gateway, None)
        .keywords(SEED)
        .await
        .unwrap();

    assert_eq!(
        keywords,
        vec!["woodworking", "workbench", "build", "hand tools", "restoring", "hand", "plane"]
    );
}
