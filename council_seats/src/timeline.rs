// Seat timeline: replays the start and the end of every term in time order and
// accumulates the number of seats held by each party.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use log::{debug, info};

use crate::calendar::date_code;
use crate::parties::PartyFoundations;
use crate::terms::Term;

// Accumulated deltas closer to zero than this are considered cancelled.
const DELTA_EPSILON: f64 = 1e-9;

// **** Private structures ****

// The order of the variants is the processing order for entries on the same day:
// a term that ends releases its seats before the next term takes them.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
enum TimelineEventKind {
    Expiration,
    Election,
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct TimelineEvent<'a> {
    kind: TimelineEventKind,
    date: NaiveDate,
    municipality_key: &'a str,
    winners: &'a BTreeMap<String, u32>,
    term_id: &'a str,
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct ActiveTerm<'a> {
    term_id: &'a str,
    seats: BTreeMap<String, u32>,
}

/// The net seat changes of all the parties on one day.
#[derive(PartialEq, Debug, Clone)]
pub struct SeatDeltaBucket {
    /// The earliest date seen for this date code.
    pub date: NaiveDate,
    pub deltas: BTreeMap<String, f64>,
}

// The state threaded through the replay.
#[derive(Debug, Default)]
struct ReplayState<'a> {
    active_terms: HashMap<&'a str, ActiveTerm<'a>>,
    change_map: BTreeMap<String, SeatDeltaBucket>,
}

impl<'a> ReplayState<'a> {
    fn apply_change(
        &mut self,
        date: NaiveDate,
        party: &str,
        delta: f64,
        foundations: &PartyFoundations,
    ) {
        if foundations.predates(party, date) {
            return;
        }
        let bucket = self
            .change_map
            .entry(date_code(date))
            .or_insert_with(|| SeatDeltaBucket {
                date,
                deltas: BTreeMap::new(),
            });
        if date < bucket.date {
            bucket.date = date;
        }
        let next_value = bucket.deltas.get(party).cloned().unwrap_or(0.0) + delta;
        if next_value.abs() < DELTA_EPSILON {
            bucket.deltas.remove(party);
        } else {
            bucket.deltas.insert(party.to_string(), next_value);
        }
    }

    fn release(&mut self, date: NaiveDate, term: &ActiveTerm<'a>, foundations: &PartyFoundations) {
        for (party, count) in term.seats.iter() {
            self.apply_change(date, party, -(*count as f64), foundations);
        }
    }

    fn apply(mut self, event: &TimelineEvent<'a>, foundations: &PartyFoundations) -> Self {
        match event.kind {
            TimelineEventKind::Expiration => {
                let is_current = matches!(
                    self.active_terms.get(event.municipality_key),
                    Some(current) if current.term_id == event.term_id
                );
                if !is_current {
                    // Already replaced by a later election.
                    debug!("replay: stale expiration of {}", event.term_id);
                    return self;
                }
                if let Some(current) = self.active_terms.remove(event.municipality_key) {
                    self.release(event.date, &current, foundations);
                }
            }
            TimelineEventKind::Election => {
                // A new election always ends the previous term.
                if let Some(previous) = self.active_terms.remove(event.municipality_key) {
                    self.release(event.date, &previous, foundations);
                }
                let mut seats: BTreeMap<String, u32> = BTreeMap::new();
                for (party, count) in event.winners.iter() {
                    if foundations.predates(party, event.date) {
                        debug!(
                            "replay: {} seats for {} before its founding ({})",
                            count, party, event.term_id
                        );
                        continue;
                    }
                    self.apply_change(event.date, party, *count as f64, foundations);
                    seats.insert(party.clone(), *count);
                }
                if !seats.is_empty() {
                    self.active_terms.insert(
                        event.municipality_key,
                        ActiveTerm {
                            term_id: event.term_id,
                            seats,
                        },
                    );
                }
            }
        }
        self
    }
}

fn timeline_events(terms: &[Term]) -> Vec<TimelineEvent<'_>> {
    let mut res: Vec<TimelineEvent> = Vec::with_capacity(terms.len() * 2);
    for t in terms.iter() {
        res.push(TimelineEvent {
            kind: TimelineEventKind::Election,
            date: t.start_date,
            municipality_key: &t.municipality_key,
            winners: &t.seats,
            term_id: &t.term_id,
        });
        res.push(TimelineEvent {
            kind: TimelineEventKind::Expiration,
            date: t.end_date,
            municipality_key: &t.municipality_key,
            winners: &t.seats,
            term_id: &t.term_id,
        });
    }
    res.sort_by_key(|e| (e.date, e.kind));
    res
}

/// Replays all the terms and returns the non-empty seat changes, in time order.
pub fn seat_changes(terms: &[Term], foundations: &PartyFoundations) -> Vec<SeatDeltaBucket> {
    let events = timeline_events(terms);
    debug!("seat_changes: replaying {} timeline events", events.len());
    let state = events
        .iter()
        .fold(ReplayState::default(), |state, e| state.apply(e, foundations));
    let mut res: Vec<SeatDeltaBucket> = state
        .change_map
        .into_values()
        .filter(|b| !b.deltas.is_empty())
        .collect();
    res.sort_by_key(|b| b.date);
    res
}

// ******** Output data structures *********

/// One party plotted in the chart.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TimelineSeries {
    pub name: String,
    /// One value per date label. None before the party was founded.
    pub data: Vec<Option<u32>>,
}

/// The number of seats held by each party over time, across all municipalities.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PartyTimeline {
    /// `YYYY-MM-DD`, one per seat change.
    pub date_labels: Vec<String>,
    pub label_dates: Vec<NaiveDate>,
    /// The top parties, by decreasing number of current seats.
    pub series: Vec<TimelineSeries>,
    /// All the parties holding seats at the end of the timeline, by decreasing number of seats.
    pub parties: Vec<String>,
    pub totals: BTreeMap<String, u32>,
    /// The values of the parties listed in `parties`.
    pub sparkline_values: BTreeMap<String, Vec<Option<u32>>>,
    /// The values of every party seen in the timeline, including those without seats at the end.
    pub history: BTreeMap<String, Vec<Option<u32>>>,
    pub total_seats: u32,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// Builds the seat timeline of all the terms.
///
/// Arguments:
/// * `terms` the terms of all the municipalities
/// * `foundations` the founding dates used to discard seats attributed too early
/// * `today` changes dated after this day are left out, unless nothing would remain
/// * `top_n` the number of parties to keep as chart series
pub fn build_party_timeline(
    terms: &[Term],
    foundations: &PartyFoundations,
    today: NaiveDate,
    top_n: usize,
) -> PartyTimeline {
    let sorted_changes = seat_changes(terms, foundations);
    if sorted_changes.is_empty() {
        info!("build_party_timeline: no seat change");
        return PartyTimeline::default();
    }

    let num_changes = sorted_changes.len();
    let mut effective_changes: Vec<SeatDeltaBucket> = sorted_changes
        .iter()
        .filter(|b| b.date <= today)
        .cloned()
        .collect();
    if effective_changes.is_empty() {
        debug!("build_party_timeline: all the changes are after {}", today);
        effective_changes = sorted_changes;
    }
    info!(
        "build_party_timeline: {} effective changes out of {}",
        effective_changes.len(),
        num_changes
    );

    // Parties in order of first appearance.
    let mut parties_seen: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for b in effective_changes.iter() {
        for party in b.deltas.keys() {
            if seen.insert(party.as_str()) {
                parties_seen.push(party.clone());
            }
        }
    }

    let mut running_totals: HashMap<&str, u32> = HashMap::new();
    let mut values: BTreeMap<String, Vec<Option<u32>>> = BTreeMap::new();
    let mut label_dates: Vec<NaiveDate> = Vec::new();
    for b in effective_changes.iter() {
        for (party, delta) in b.deltas.iter() {
            let current = running_totals.get(party.as_str()).cloned().unwrap_or(0);
            let next = (current as f64 + delta).round().max(0.0) as u32;
            running_totals.insert(party.as_str(), next);
        }
        for party in parties_seen.iter() {
            let current = running_totals.get(party.as_str()).cloned().unwrap_or(0);
            values.entry(party.clone()).or_default().push(Some(current));
        }
        label_dates.push(b.date);
    }

    for (party, vals) in values.iter_mut() {
        if let Some(founded) = foundations.founded(party) {
            for (v, date) in vals.iter_mut().zip(label_dates.iter()) {
                if *date < founded {
                    *v = None;
                } else {
                    break;
                }
            }
        }
    }

    let mut ranked: Vec<(String, u32)> = Vec::new();
    for party in parties_seen.iter() {
        let last_value = values
            .get(party)
            .and_then(|vals| vals.iter().rev().find_map(|v| *v))
            .unwrap_or(0);
        if last_value > 0 {
            ranked.push((party.clone(), last_value));
        }
    }
    // Stable: equal totals keep the order of first appearance.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let totals: BTreeMap<String, u32> = ranked.iter().cloned().collect();
    let parties: Vec<String> = ranked.iter().map(|(p, _)| p.clone()).collect();
    let sparkline_values: BTreeMap<String, Vec<Option<u32>>> = parties
        .iter()
        .filter_map(|p| values.get(p).map(|v| (p.clone(), v.clone())))
        .collect();
    let series: Vec<TimelineSeries> = parties
        .iter()
        .take(top_n)
        .map(|p| TimelineSeries {
            name: p.clone(),
            data: sparkline_values.get(p).cloned().unwrap_or_default(),
        })
        .collect();

    let total_seats = totals.values().sum();
    info!(
        "build_party_timeline: {} parties holding {} seats",
        parties.len(),
        total_seats
    );
    PartyTimeline {
        date_labels: label_dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect(),
        min_date: label_dates.first().cloned(),
        max_date: label_dates.last().cloned(),
        label_dates,
        series,
        parties,
        totals,
        sparkline_values,
        history: values,
        total_seats,
    }
}
