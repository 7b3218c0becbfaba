use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, info};

use crate::calendar::add_years_safe;
use crate::events::ElectionEvent;

/// The interval during which the winners of one election hold their seats.
///
/// Invariants: `end_date > start_date`, and the terms of a municipality never overlap.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Term {
    pub municipality_key: String,
    pub term_id: String,
    pub start_date: NaiveDate,
    /// Exclusive
    pub end_date: NaiveDate,
    pub seats: BTreeMap<String, u32>,
}

impl Term {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date < self.end_date
    }

    pub fn seat_count(&self) -> u32 {
        self.seats.values().sum()
    }
}

pub fn term_id(municipality_key: &str, start_date: NaiveDate) -> String {
    format!("{}-{}", municipality_key, start_date.format("%Y-%m-%d"))
}

/// Turns the election events into terms.
///
/// A term ends on the date of the next election in the same municipality, or after
/// `term_years` years if no later election is known. Events of the same municipality on
/// the same date are merged.
///
/// The result is ordered by municipality key, then by start date.
pub fn build_terms(events: &[ElectionEvent], term_years: u32) -> Vec<Term> {
    let mut by_municipality: BTreeMap<&str, BTreeMap<NaiveDate, BTreeMap<String, u32>>> =
        BTreeMap::new();
    for e in events.iter() {
        let seats = by_municipality
            .entry(e.municipality_key.as_str())
            .or_default()
            .entry(e.date)
            .or_default();
        for (party, count) in e.winners.iter() {
            *seats.entry(party.clone()).or_insert(0) += count;
        }
    }

    let mut res: Vec<Term> = Vec::new();
    for (key, elections) in by_municipality.into_iter() {
        let dates: Vec<NaiveDate> = elections.keys().cloned().collect();
        for (idx, (start_date, seats)) in elections.into_iter().enumerate() {
            let end_date = match dates.get(idx + 1) {
                Some(next) => *next,
                None => add_years_safe(start_date, term_years),
            };
            debug!(
                "build_terms: {}: {} -> {} {:?}",
                key, start_date, end_date, seats
            );
            res.push(Term {
                municipality_key: key.to_string(),
                term_id: term_id(key, start_date),
                start_date,
                end_date,
                seats,
            });
        }
    }
    info!("build_terms: {} terms", res.len());
    res
}

/// Groups terms by municipality, keeping their order.
pub fn terms_by_municipality(terms: &[Term]) -> BTreeMap<&str, Vec<&Term>> {
    let mut res: BTreeMap<&str, Vec<&Term>> = BTreeMap::new();
    for t in terms.iter() {
        res.entry(t.municipality_key.as_str()).or_default().push(t);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(key: &str, date: NaiveDate, winners: &[(&str, u32)]) -> ElectionEvent {
        ElectionEvent {
            municipality_key: key.to_string(),
            date,
            winners: winners.iter().map(|(p, c)| (p.to_string(), *c)).collect(),
        }
    }

    #[test]
    fn terms_end_at_next_election_or_after_term_length() {
        let events = vec![
            event("A", d(2011, 4, 24), &[("P", 3)]),
            event("B", d(2012, 2, 29), &[("Q", 1)]),
            event("A", d(2013, 6, 2), &[("P", 2), ("R", 1)]),
        ];
        let terms = build_terms(&events, 4);
        assert_eq!(terms.len(), 3);

        assert_eq!(terms[0].term_id, "A-2011-04-24");
        assert_eq!(terms[0].end_date, d(2013, 6, 2));
        assert_eq!(terms[1].start_date, d(2013, 6, 2));
        assert_eq!(terms[1].end_date, d(2017, 6, 2));
        assert_eq!(terms[1].seat_count(), 3);
        // Leap day start, leap year end.
        assert_eq!(terms[2].end_date, d(2016, 2, 29));
        assert!(terms[2].contains(d(2016, 2, 28)));
        assert!(!terms[2].contains(d(2016, 2, 29)));
    }

    #[test]
    fn same_day_events_are_merged() {
        let events = vec![
            event("A", d(2019, 4, 21), &[("P", 1)]),
            event("A", d(2019, 4, 21), &[("P", 1), ("Q", 2)]),
        ];
        let terms = build_terms(&events, 4);
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].seats.get("P"), Some(&2));
        assert_eq!(terms[0].seats.get("Q"), Some(&2));
    }

    #[test]
    fn terms_do_not_overlap() {
        let events = vec![
            event("A", d(2003, 4, 27), &[("P", 1)]),
            event("A", d(2005, 1, 9), &[("P", 1)]),
            event("A", d(2009, 1, 11), &[("P", 1)]),
            event("B", d(2003, 4, 27), &[("P", 1)]),
        ];
        let terms = build_terms(&events, 4);
        for (_, ts) in terms_by_municipality(&terms) {
            for t in ts.iter() {
                assert!(t.end_date > t.start_date);
            }
            for w in ts.windows(2) {
                assert!(w[0].start_date < w[1].start_date);
                assert!(w[0].end_date <= w[1].start_date);
            }
        }
    }
}
