//! Model-driven pipeline: demonstration fallback, name resolution and seed
//! loading.

use tubescope_common::MatchScore;
use tubescope_discovery::testing::{channel, video, MockAnalyzer, MockGateway};
use tubescope_discovery::{
    DiscoveryReport, DiscoveryStatus, NoCandidatesReason, SeedProfile, SimilarityRanker,
    UnavailableReason,
};

const SEED: &str = "UCseedseedseedseedseedse";

const ANSWER: &str = "\
Rank,Channel Name,Niche/Category,Similarity Score (0-10),Notes
1,Alpha,Woodworking,7.5,Close match
2,Beta,Woodworking,9.0,Lookup fails
3,Gamma,Carving,8.0,Unknown name
4,Seed Itself,Woodworking,9.9,Model suggested the seed
5,Delta,Furniture,8.8,\"Bigger builds, same tone\"
6,Alpha Again,Woodworking,6.0,Same channel twice
";

fn seed() -> SeedProfile {
    let mut profile = SeedProfile::new(
        "Woodshop Weekly",
        "https://www.youtube.com/channel/UCseedseedseedseedseedse",
        vec!["Workbench build".into()],
    );
    profile.channel_id = Some(SEED.to_string());
    profile
}

fn resolving_gateway() -> MockGateway {
    MockGateway::new()
        .on_channel(channel(SEED, "Woodshop Weekly", 40_000))
        .on_channel(channel("UCalpha", "Alpha Woodworks", 30_000))
        .on_channel(channel("UCdelta", "Delta Furniture", 90_000))
        .on_name("Alpha", "UCalpha")
        .on_name("Alpha Again", "UCalpha")
        .on_name("Delta", "UCdelta")
        .on_name("Seed Itself", SEED)
        .fail_name("Beta")
}

fn titles(report: &DiscoveryReport) -> Vec<&str> {
    report.candidates.iter().map(|c| c.channel.title.as_str()).collect()
}

#[tokio::test]
async fn no_analyzer_shows_demonstration() {
    let report = SimilarityRanker::new(None).rank(&seed()).await;

    assert_eq!(report.status, DiscoveryStatus::Demonstration);
    assert_eq!(report.candidates.len(), 4);
    assert_eq!(report.candidates[0].channel.title, "Gaming Enthusiast");
    assert!(report.raw_response.is_some());
}

#[tokio::test]
async fn analyzer_failure_shows_demonstration() {
    let analyzer = MockAnalyzer::failing("503 Service Unavailable");

    let report = SimilarityRanker::new(Some(&analyzer)).rank(&seed()).await;

    assert_eq!(report.status, DiscoveryStatus::Demonstration);
    assert_eq!(titles(&report)[3], "Digital Marketing Mastery");
    assert_eq!(analyzer.prompts().len(), 1);
}

#[tokio::test]
async fn resolution_drops_failures_seed_and_duplicates() {
    let analyzer = MockAnalyzer::answering(ANSWER);
    let gateway = resolving_gateway();

    let report = SimilarityRanker::new(Some(&analyzer))
        .with_gateway(&gateway)
        .rank(&seed())
        .await;

    assert_eq!(report.status, DiscoveryStatus::Found);
    assert_eq!(titles(&report), vec!["Delta Furniture", "Alpha Woodworks"]);
    assert_eq!(report.candidates[0].match_score, MatchScore::Similarity(8.8));
    assert_eq!(report.candidates[0].notes.as_deref(), Some("Bigger builds, same tone"));
    // First resolution of a channel wins.
    assert_eq!(report.candidates[1].match_score, MatchScore::Similarity(7.5));
    assert_eq!(report.records.len(), 6);
    assert_eq!(gateway.calls("find_channel_by_name"), 6);
}

#[tokio::test]
async fn without_resolution_names_ranked_by_score() {
    let analyzer = MockAnalyzer::answering("1,A,x,5\n2,B,x,7\n3,C,x,5\n4,D,x,42");
    let gateway = resolving_gateway();

    let report = SimilarityRanker::new(Some(&analyzer))
        .with_gateway(&gateway)
        .without_resolution()
        .rank(&seed())
        .await;

    assert_eq!(titles(&report), vec!["B", "A", "C", "D"]);
    assert_eq!(report.candidates[3].match_score, MatchScore::Similarity(0.0));
    assert!(report.candidates.iter().all(|c| !c.channel.is_resolved()));
    assert_eq!(gateway.calls("find_channel_by_name"), 0);
}

#[tokio::test]
async fn unreadable_answer_is_empty_analysis() {
    let analyzer = MockAnalyzer::answering("I'm sorry, I couldn't find similar channels.");

    let report = SimilarityRanker::new(Some(&analyzer)).rank(&seed()).await;

    assert_eq!(
        report.status,
        DiscoveryStatus::NoCandidates(NoCandidatesReason::EmptyAnalysis)
    );
    assert_eq!(
        report.raw_response.as_deref(),
        Some("I'm sorry, I couldn't find similar channels.")
    );
}

#[tokio::test]
async fn nothing_resolved_keeps_records() {
    let analyzer = MockAnalyzer::answering("1,Nobody,x,5\n2,Nobody Else,x,4");
    let gateway = MockGateway::new();

    let report = SimilarityRanker::new(Some(&analyzer))
        .with_gateway(&gateway)
        .rank(&seed())
        .await;

    assert_eq!(
        report.status,
        DiscoveryStatus::NoCandidates(NoCandidatesReason::NothingResolved)
    );
    assert_eq!(report.records.len(), 2);
}

#[tokio::test]
async fn discover_builds_profile_from_gateway() {
    let analyzer = MockAnalyzer::answering(ANSWER);
    let gateway = resolving_gateway().on_recent_videos(
        SEED,
        vec![video("v1", "Dovetails by hand", &[]), video("v2", "Shop tour 2024", &[])],
    );

    let report = SimilarityRanker::new(Some(&analyzer))
        .with_gateway(&gateway)
        .discover(SEED)
        .await;

    assert!(report.is_found());
    assert!(report.candidates.iter().all(|c| c.channel.id != SEED));
    let prompt = &analyzer.prompts()[0];
    assert!(prompt.contains("Woodshop Weekly"));
    assert!(prompt.contains("https://www.youtube.com/channel/UCseedseedseedseedseedse"));
    assert!(prompt.contains("- Dovetails by hand"));
}

#[tokio::test]
async fn discover_by_handle() {
    let analyzer = MockAnalyzer::answering("1,Alpha,x,5");
    let gateway = resolving_gateway().on_alias("@woodshop", SEED);

    let report = SimilarityRanker::new(Some(&analyzer))
        .with_gateway(&gateway)
        .discover("@woodshop")
        .await;

    assert_eq!(titles(&report), vec!["Alpha Woodworks"]);
}

#[tokio::test]
async fn discover_unknown_seed() {
    let analyzer = MockAnalyzer::answering(ANSWER);
    let gateway = MockGateway::new();

    let report = SimilarityRanker::new(Some(&analyzer))
        .with_gateway(&gateway)
        .discover(SEED)
        .await;

    assert_eq!(
        report.status,
        DiscoveryStatus::NoCandidates(NoCandidatesReason::UnknownSeed)
    );
    assert!(analyzer.prompts().is_empty());
}

#[tokio::test]
async fn discover_without_gateway_is_configuration_missing() {
    let analyzer = MockAnalyzer::answering(ANSWER);

    let report = SimilarityRanker::new(Some(&analyzer)).discover(SEED).await;

    assert!(matches!(
        report.status,
        DiscoveryStatus::Unavailable(UnavailableReason::ConfigurationMissing(_))
    ));
}

#[tokio::test]
async fn discover_gateway_outage_is_unavailable() {
    let analyzer = MockAnalyzer::answering(ANSWER);
    let gateway = MockGateway::new().failing();

    let report = SimilarityRanker::new(Some(&analyzer))
        .with_gateway(&gateway)
        .discover(SEED)
        .await;

    assert!(matches!(
        report.status,
        DiscoveryStatus::Unavailable(UnavailableReason::Upstream(_))
    ));
}

#[tokio::test]
async fn every_lookup_failing_is_unavailable() {
    let analyzer = MockAnalyzer::answering(ANSWER);
    let gateway = MockGateway::new().failing();

    let report = SimilarityRanker::new(Some(&analyzer))
        .with_gateway(&gateway)
        .rank(&seed())
        .await;

    assert!(matches!(
        report.status,
        DiscoveryStatus::Unavailable(UnavailableReason::Upstream(_))
    ));
    assert_eq!(report.records.len(), 6);
    assert!(report.raw_response.is_some());
}

#[tokio::test]
async fn some_lookups_failing_is_nothing_resolved() {
    let analyzer = MockAnalyzer::answering("1,Beta,x,5\n2,Nobody,x,4");
    let gateway = MockGateway::new().fail_name("Beta");

    let report = SimilarityRanker::new(Some(&analyzer))
        .with_gateway(&gateway)
        .rank(&seed())
        .await;

    assert_eq!(
        report.status,
        DiscoveryStatus::NoCandidates(NoCandidatesReason::NothingResolved)
    );
    assert_eq!(report.records.len(), 2);
}
