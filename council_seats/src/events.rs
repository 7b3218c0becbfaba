use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use log::{debug, info};

use crate::calendar::date_code;
use crate::config::CandidateRecord;
use crate::parties::{canonical_party, is_winning_outcome};

/// The seats won in one municipality on one election day.
///
/// Invariant: `winners` is never empty and all the counts are positive.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionEvent {
    pub municipality_key: String,
    pub date: NaiveDate,
    pub winners: BTreeMap<String, u32>,
}

impl ElectionEvent {
    pub fn date_code(&self) -> String {
        date_code(self.date)
    }

    pub fn total_seats(&self) -> u32 {
        self.winners.values().sum()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct EventExtraction {
    /// Sorted by date, then by municipality key.
    pub events: Vec<ElectionEvent>,
    /// The number of municipalities with at least one winner.
    pub municipality_count: usize,
}

/// Groups the winning candidates by municipality and election day.
///
/// Candidates that did not win, that have no election date or no municipality key
/// are skipped.
pub fn extract_election_events(candidates: &[CandidateRecord]) -> EventExtraction {
    let mut groups: BTreeMap<(String, NaiveDate), BTreeMap<String, u32>> = BTreeMap::new();
    let mut municipalities: BTreeSet<String> = BTreeSet::new();
    let mut skipped_no_date: usize = 0;

    for c in candidates.iter() {
        if !is_winning_outcome(&c.outcome) {
            continue;
        }
        let date = match c.election_date {
            Some(d) => d,
            None => {
                skipped_no_date += 1;
                continue;
            }
        };
        let key = c.source_key.trim();
        if key.is_empty() {
            debug!(
                "extract_election_events: candidate {:?} has no municipality key",
                c.candidate_id
            );
            continue;
        }
        municipalities.insert(key.to_string());
        let winners = groups.entry((key.to_string(), date)).or_default();
        *winners.entry(canonical_party(&c.party)).or_insert(0) += 1;
    }

    if skipped_no_date > 0 {
        debug!(
            "extract_election_events: skipped {} winners without election date",
            skipped_no_date
        );
    }

    let mut events: Vec<ElectionEvent> = groups
        .into_iter()
        .filter(|(_, winners)| !winners.is_empty())
        .map(|((municipality_key, date), winners)| ElectionEvent {
            municipality_key,
            date,
            winners,
        })
        .collect();
    // The groups come out sorted by key: the stable sort keeps that order for equal dates.
    events.sort_by_key(|e| e.date);

    info!(
        "extract_election_events: {} events in {} municipalities",
        events.len(),
        municipalities.len()
    );
    EventExtraction {
        events,
        municipality_count: municipalities.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winner(key: &str, date: Option<NaiveDate>, party: &str, outcome: &str) -> CandidateRecord {
        CandidateRecord {
            party: party.to_string(),
            outcome: outcome.to_string(),
            source_key: key.to_string(),
            election_date: date,
            ..Default::default()
        }
    }

    #[test]
    fn groups_winners_by_municipality_and_date() {
        let d1 = NaiveDate::from_ymd_opt(2019, 4, 21);
        let d2 = NaiveDate::from_ymd_opt(2015, 4, 26);
        let candidates = vec![
            winner("B市議会議員選挙", d1, "公明党", "当選"),
            winner("B市議会議員選挙", d1, "公明党", "当選"),
            winner("B市議会議員選挙", d1, "", "当選"),
            winner("B市議会議員選挙", d1, "自由民主党", "落選"),
            winner("A町議会議員選挙", d1, "自由民主党", "補欠当選"),
            winner("A町議会議員選挙", d2, "-", "当選"),
            winner("A町議会議員選挙", None, "公明党", "当選"),
            winner("  ", d2, "公明党", "当選"),
        ];
        let res = extract_election_events(&candidates);
        assert_eq!(res.municipality_count, 2);
        assert_eq!(res.events.len(), 3);

        assert_eq!(res.events[0].municipality_key, "A町議会議員選挙");
        assert_eq!(res.events[0].date, d2.unwrap());
        assert_eq!(res.events[0].winners.get("無所属"), Some(&1));

        // Same date: ordered by municipality key.
        assert_eq!(res.events[1].municipality_key, "A町議会議員選挙");
        assert_eq!(res.events[2].municipality_key, "B市議会議員選挙");
        assert_eq!(res.events[2].winners.get("公明党"), Some(&2));
        assert_eq!(res.events[2].winners.get("無所属"), Some(&1));
        assert_eq!(res.events[2].winners.get("自由民主党"), None);
        assert_eq!(res.events[2].total_seats(), 3);
        assert_eq!(res.events[2].date_code(), "20190421");
    }

    #[test]
    fn no_winners_no_events() {
        let res = extract_election_events(&[]);
        assert!(res.events.is_empty());
        assert_eq!(res.municipality_count, 0);
    }
}
