//! Decode a similarity table out of free-form model output.
//!
//! Best effort by construction: bad lines are skipped and reported, good ones
//! kept. Pure function of the input text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ai_client::util::fenced_or_whole;
use tubescope_common::DiscoveryError;

use crate::record_parser::parse_record_line;

/// Most data lines read from one response. Nobody needs more than ten
/// similar channels.
pub const MAX_RECORDS: usize = 10;

const HEADER_MARKERS: &[&str] = &["rank", "channel name", "similarity score"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub rank: u32,
    pub name: String,
    pub category: String,
    pub score: f64,
    #[serde(default)]
    pub notes: String,
}

/// Decoder output: records in source order plus the lines that were skipped.
#[derive(Debug, Default)]
pub struct DecodedTable {
    pub records: Vec<ParsedRecord>,
    pub rejected: Vec<DiscoveryError>,
}

static RE_LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").unwrap());
static RE_LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").unwrap()
});

/// Leading integer of a field (`"3."`, `"#"`-free ranks). Non-positive or
/// missing values are `None`.
fn leading_rank(field: &str) -> Option<u32> {
    let m = RE_LEADING_INT.find(field.trim())?;
    m.as_str().parse::<u32>().ok().filter(|&n| n > 0)
}

/// Leading float of a field, so `"8.5/10"` reads as 8.5.
fn leading_float(field: &str) -> Option<f64> {
    let m = RE_LEADING_FLOAT.find(field.trim())?;
    m.as_str().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    HEADER_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Decode a raw response into at most [`MAX_RECORDS`] records, keeping
/// track of lines that could not be parsed.
pub fn decode_table(raw: &str) -> DecodedTable {
    let body = fenced_or_whole(raw);
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let start = match lines.first() {
        Some(first) if is_header(first) => 1,
        _ => 0,
    };

    let mut table = DecodedTable::default();
    for (offset, line) in lines.iter().skip(start).take(MAX_RECORDS).enumerate() {
        let position = offset + 1;

        let Some(fields) = parse_record_line(line) else {
            let rejected = DiscoveryError::UnparseableRecord {
                line: position,
                text: line.to_string(),
            };
            warn!(line = position, text = *line, "Skipping unparseable table row");
            table.rejected.push(rejected);
            continue;
        };

        let record = ParsedRecord {
            rank: leading_rank(&fields[0]).unwrap_or(position as u32),
            name: fields[1].clone(),
            category: fields[2].clone(),
            score: leading_float(&fields[3]).unwrap_or(0.0),
            notes: fields.get(4).cloned().unwrap_or_default(),
        };
        debug!(name = record.name.as_str(), score = record.score, "Decoded table row");
        table.records.push(record);
    }

    table
}

/// Records only; see [`decode_table`] for the skipped lines.
pub fn decode(raw: &str) -> Vec<ParsedRecord> {
    decode_table(raw).records
}
