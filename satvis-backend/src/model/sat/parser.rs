///! Parser for CelesTrak-style three-line element text
use regex::Regex;
use std::sync::LazyLock;

use satvis_common::SatelliteCategory;

use super::types::SatelliteRecord;

const UNKNOWN_NAME: &str = "Unknown Satellite";

static LINE1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1 +(\d{1,5})([A-Z ])").expect("valid line 1 pattern"));
static LINE2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^2 +(\d{1,5}) ").expect("valid line 2 pattern"));

/// Extract element sets from TLE text.
///
/// A line-1/line-2 pair forms an entry; the line before it is the name
/// when it is not itself an element line. The id is the first field of
/// line 1 (`25544U`). Pairs whose catalog numbers disagree are dropped.
pub fn parse_tle_text(text: &str, category: SatelliteCategory) -> Vec<SatelliteRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();

    let mut records = Vec::new();
    let mut i = 0;
    while i + 1 < lines.len() {
        let (line1, line2) = (lines[i], lines[i + 1]);
        let (Some(first), Some(second)) = (LINE1_RE.captures(line1), LINE2_RE.captures(line2))
        else {
            i += 1;
            continue;
        };

        let (number, number2) = (&first[1], &second[1]);
        if number != number2 {
            tracing::warn!(
                "Skipping TLE pair with mismatched catalog numbers: {} / {}",
                number,
                number2
            );
            i += 2;
            continue;
        }
        // catalog number with its classification letter, e.g. "25544U"
        let id = format!("{}{}", number, first[2].trim());

        let name = i
            .checked_sub(1)
            .map(|prev| lines[prev])
            .filter(|prev| !LINE1_RE.is_match(prev) && !LINE2_RE.is_match(prev))
            .unwrap_or(UNKNOWN_NAME);

        records.push(SatelliteRecord::new(id, name, category, line1, line2));
        i += 2;
    }

    tracing::debug!("Parsed {} element sets ({})", records.len(), category);
    records
}
