use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use log::{debug, info};

use crate::config::CandidateRecord;
use crate::parties::{canonical_party, is_winning_outcome};

/// Candidates and winners over some slice of the candidates.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct WinCount {
    pub candidates: u32,
    pub winners: u32,
}

impl WinCount {
    fn record(&mut self, won: bool) {
        self.candidates += 1;
        if won {
            self.winners += 1;
        }
    }

    fn add(&mut self, other: &WinCount) {
        self.candidates += other.candidates;
        self.winners += other.winners;
    }

    /// None when there are no candidates.
    pub fn ratio(&self) -> Option<f64> {
        if self.candidates == 0 {
            None
        } else {
            Some(self.winners as f64 / self.candidates as f64)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyWinRate {
    pub party: String,
    pub count: WinCount,
}

/// The monthly counts of a party, aligned with [`WinRateReport::months`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WinRateSeries {
    pub party: String,
    pub counts: Vec<Option<WinCount>>,
}

/// The result of a party in one election.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionWinRate {
    pub party: String,
    pub election_key: String,
    pub date: NaiveDate,
    pub count: WinCount,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct WinRateReport {
    /// The retained parties, in display order.
    pub parties: Vec<PartyWinRate>,
    /// Over the retained parties only.
    pub totals: WinCount,
    /// `YYYY-MM`, sorted.
    pub months: Vec<String>,
    pub series: Vec<WinRateSeries>,
    /// Sorted by date.
    pub events: Vec<ElectionWinRate>,
}

fn election_key(c: &CandidateRecord) -> &str {
    let key = c.source_key.trim();
    if key.is_empty() {
        c.source_file.trim()
    } else {
        key
    }
}

/// Computes how often the candidates of each party win.
///
/// The parties listed in `preferred_order` come first (if they have candidates), then the
/// others by decreasing number of winners. Only the first `max_parties` are kept, unless
/// `max_parties` is 0.
pub fn build_win_rate(
    candidates: &[CandidateRecord],
    preferred_order: &[String],
    max_parties: usize,
) -> WinRateReport {
    // Parties in order of first appearance.
    let mut seen_order: Vec<String> = Vec::new();
    let mut by_party: BTreeMap<String, WinCount> = BTreeMap::new();
    let mut by_month: BTreeMap<String, BTreeMap<String, WinCount>> = BTreeMap::new();
    let mut point_index: BTreeMap<(String, String, NaiveDate), usize> = BTreeMap::new();
    let mut points: Vec<ElectionWinRate> = Vec::new();
    let mut skipped_no_date: usize = 0;

    for c in candidates.iter() {
        let date = match c.election_date {
            Some(d) => d,
            None => {
                skipped_no_date += 1;
                continue;
            }
        };
        let party = canonical_party(&c.party);
        let won = is_winning_outcome(&c.outcome);

        if !by_party.contains_key(&party) {
            seen_order.push(party.clone());
        }
        by_party.entry(party.clone()).or_default().record(won);
        by_month
            .entry(date.format("%Y-%m").to_string())
            .or_default()
            .entry(party.clone())
            .or_default()
            .record(won);

        let key = election_key(c);
        if key.is_empty() {
            continue;
        }
        let idx = *point_index
            .entry((party.clone(), key.to_string(), date))
            .or_insert_with(|| {
                points.push(ElectionWinRate {
                    party: party.clone(),
                    election_key: key.to_string(),
                    date,
                    count: WinCount::default(),
                });
                points.len() - 1
            });
        points[idx].count.record(won);
    }
    if skipped_no_date > 0 {
        debug!(
            "build_win_rate: skipped {} candidates without election date",
            skipped_no_date
        );
    }

    let mut ordered: Vec<String> = Vec::new();
    let mut placed: BTreeSet<String> = BTreeSet::new();
    for party in preferred_order.iter() {
        if by_party.contains_key(party) && placed.insert(party.clone()) {
            ordered.push(party.clone());
        }
    }
    let mut remaining: Vec<String> = seen_order
        .into_iter()
        .filter(|p| !placed.contains(p))
        .collect();
    remaining.sort_by_key(|p| std::cmp::Reverse(by_party.get(p).map(|c| c.winners).unwrap_or(0)));
    ordered.extend(remaining);
    if max_parties > 0 {
        ordered.truncate(max_parties);
    }
    let retained: BTreeSet<&str> = ordered.iter().map(|p| p.as_str()).collect();

    let mut totals = WinCount::default();
    let mut parties: Vec<PartyWinRate> = Vec::new();
    for party in ordered.iter() {
        if let Some(count) = by_party.get(party) {
            totals.add(count);
            parties.push(PartyWinRate {
                party: party.clone(),
                count: *count,
            });
        }
    }

    let months: Vec<String> = by_month.keys().cloned().collect();
    let series: Vec<WinRateSeries> = ordered
        .iter()
        .filter_map(|party| {
            let counts: Vec<Option<WinCount>> = by_month
                .values()
                .map(|m| m.get(party).filter(|c| c.candidates > 0).cloned())
                .collect();
            if counts.iter().any(|c| c.is_some()) {
                Some(WinRateSeries {
                    party: party.clone(),
                    counts,
                })
            } else {
                None
            }
        })
        .collect();

    let mut events: Vec<ElectionWinRate> = points
        .into_iter()
        .filter(|p| retained.contains(p.party.as_str()))
        .collect();
    events.sort_by_key(|p| p.date);

    info!(
        "build_win_rate: {} parties, {} months, {} election points",
        parties.len(),
        months.len(),
        events.len()
    );
    WinRateReport {
        parties,
        totals,
        months,
        series,
        events,
    }
}
