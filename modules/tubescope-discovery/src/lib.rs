pub mod aggregator;
pub mod decoder;
pub mod gateway;
pub mod ideas;
pub mod keywords;
pub mod record_parser;
pub mod report;
pub mod similarity;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use aggregator::{CandidateAggregator, KeywordDiscovery, SubscriberBand};
pub use decoder::{decode, DecodedTable, ParsedRecord};
pub use ideas::{ContentIdea, ContentPlanner};
pub use keywords::KeywordExtractor;
pub use report::{DiscoveryReport, DiscoveryStatus, NoCandidatesReason, UnavailableReason};
pub use similarity::{SeedProfile, SimilarityRanker};
pub use traits::ChannelGateway;
