// Per-row normalisation shared by the readers.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::pipeline::*;
use council_seats::calendar::parse_date_code;
use council_seats::locality::remove_whitespace;

/// The election days known for each election name, most recent first.
pub type SummaryIndex = BTreeMap<String, Vec<NaiveDate>>;

/// A row of the election summary, as read.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawElection {
    pub election_name: String,
    pub notice_date: String,
    pub election_day: String,
    pub seats: String,
    pub candidate_count: String,
    pub registered_voters: String,
    pub note: String,
}

/// A row of the candidate details, as read.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCandidate {
    pub candidate_id: String,
    pub name: String,
    pub kana: String,
    pub age: String,
    pub gender: String,
    pub incumbent_status: String,
    pub profession: String,
    pub party: String,
    pub votes: String,
    pub outcome: String,
    pub image_file: String,
    pub source_file: String,
}

/// Files ending in `.gz` are gzip-compressed.
pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

pub fn normalise_string(value: &str) -> String {
    value.trim().to_string()
}

/// Parses a number that may contain thousands separators.
pub fn clean_number(value: &str) -> Option<f64> {
    let text = value.trim().replace(',', "");
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Parses an integer count. Non-integral numbers are truncated.
pub fn clean_numeric(value: &str) -> Option<i64> {
    let number = clean_number(value)?;
    if (number - number.round()).abs() < 1e-6 {
        Some(number.round() as i64)
    } else {
        Some(number.trunc() as i64)
    }
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日"];

/// Parses a calendar day. A time part after the day is ignored.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let text = value.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(d) = parse_date_code(text) {
        return Some(d);
    }
    let day_part = text
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(text);
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(day_part, f).ok())
}

/// Splits a source file name such as `東京都新宿区議会議員選挙_20190421.html` into the election
/// key and the date code. Without a trailing date code, the whole name is the key.
pub fn split_source_file(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim();
    let cut = raw.len().saturating_sub(".html".len());
    let cleaned = match (raw.get(..cut), raw.get(cut..)) {
        (Some(stem), Some(ext)) if ext.eq_ignore_ascii_case(".html") => stem,
        _ => raw,
    };
    if let Some((key, code)) = cleaned.rsplit_once('_') {
        if code.len() == 8 && code.chars().all(|c| c.is_ascii_digit()) {
            return (normalise_string(key), Some(code.to_string()));
        }
    }
    (cleaned.to_string(), None)
}

pub fn normalize_election(raw: &RawElection) -> ElectionRecord {
    ElectionRecord {
        election_name: normalise_string(&raw.election_name),
        notice_date: parse_date(&raw.notice_date),
        election_day: parse_date(&raw.election_day),
        seats: clean_numeric(&raw.seats),
        candidate_count: clean_numeric(&raw.candidate_count),
        registered_voters: clean_numeric(&raw.registered_voters),
        note: normalise_string(&raw.note),
    }
}

/// Builds the compensation reference from the rows of the reference table, header excluded.
///
/// Rows without a monthly amount, a prefecture or a municipality are skipped. The first row of a
/// municipality wins.
pub fn compensation_table(rows: &[Vec<String>], columns: &ColumnLayout) -> CompensationTable {
    let cell = |row: &Vec<String>, idx: usize| -> String {
        row.get(idx).map(|s| s.to_string()).unwrap_or_default()
    };
    let mut table = CompensationTable::new();
    let mut skipped: usize = 0;
    for row in rows.iter() {
        let prefecture = remove_whitespace(&cell(row, columns.prefecture));
        let municipality = remove_whitespace(&cell(row, columns.municipality));
        let monthly = match clean_number(&cell(row, columns.monthly)) {
            Some(m) if !prefecture.is_empty() && !municipality.is_empty() => m,
            _ => {
                skipped += 1;
                continue;
            }
        };
        let bonus_rates = BonusRates {
            march: clean_number(&cell(row, columns.bonus.march)).unwrap_or(0.0),
            june: clean_number(&cell(row, columns.bonus.june)).unwrap_or(0.0),
            december: clean_number(&cell(row, columns.bonus.december)).unwrap_or(0.0),
        };
        let rate = CompensationRate {
            monthly,
            bonus_rates,
        };
        if !table.insert(&prefecture, &municipality, rate) {
            debug!(
                "compensation_table: duplicate entry for {} {}",
                prefecture, municipality
            );
        }
    }
    info!(
        "compensation_table: {} municipalities, {} rows skipped",
        table.len(),
        skipped
    );
    table
}

pub fn build_summary_index(elections: &[ElectionRecord]) -> SummaryIndex {
    let mut index: SummaryIndex = BTreeMap::new();
    for e in elections.iter() {
        if e.election_name.is_empty() {
            continue;
        }
        if let Some(day) = e.election_day {
            index.entry(e.election_name.clone()).or_default().push(day);
        }
    }
    for days in index.values_mut() {
        days.sort_by(|a, b| b.cmp(a));
    }
    debug!("build_summary_index: {} election names", index.len());
    index
}

/// Cleans a candidate row. The election date comes from the source file name, or else from the
/// most recent election of the same name in the summary.
pub fn normalize_candidate(raw: &RawCandidate, index: &SummaryIndex) -> CandidateRecord {
    let source_file = normalise_string(&raw.source_file);
    let (source_key, source_date_code) = split_source_file(&source_file);
    let election_date = source_date_code
        .as_deref()
        .and_then(parse_date_code)
        .or_else(|| index.get(&source_key).and_then(|days| days.first().cloned()));
    CandidateRecord {
        candidate_id: normalise_string(&raw.candidate_id),
        name: normalise_string(&raw.name),
        kana: normalise_string(&raw.kana),
        age: clean_numeric(&raw.age),
        gender: normalise_string(&raw.gender),
        incumbent_status: normalise_string(&raw.incumbent_status),
        profession: normalise_string(&raw.profession),
        party: canonical_party(&raw.party),
        votes: clean_numeric(&raw.votes),
        outcome: normalise_string(&raw.outcome),
        image_file: normalise_string(&raw.image_file),
        source_file,
        source_key,
        source_date_code,
        election_date,
    }
}
