// Compensation accrual: prorates the monthly pay and the bonuses of every seat over
// the months of its term.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use log::{debug, info};

use crate::calendar::iterate_months;
use crate::config::{
    BonusCounts, BonusMonth, BonusRates, CompensationRate, CompensationTable, PerBonusMonth,
};
use crate::locality::{split_municipality_key, Locality};
use crate::parties::PartyFoundations;
use crate::terms::Term;

// ******** Output data structures *********

/// The compensation of the seats of one party for a whole term in one municipality.
#[derive(PartialEq, Debug, Clone)]
pub struct CompensationTerm {
    pub party: String,
    pub prefecture: String,
    pub municipality: String,
    pub term_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub seat_count: u32,
    pub months_in_term: u32,
    pub bonus_counts: BonusCounts,
    pub rate: CompensationRate,
    pub per_seat_compensation: f64,
    pub total_compensation: f64,
}

/// The part of a [`CompensationTerm`] that falls in one calendar year.
#[derive(PartialEq, Debug, Clone)]
pub struct MunicipalityYearCompensation {
    pub party: String,
    pub year: i32,
    pub prefecture: String,
    pub municipality: String,
    pub term_id: String,
    pub seat_count: u32,
    pub monthly_compensation: f64,
    /// Per seat, for the months of this year.
    pub annual_compensation: f64,
    /// Per seat, the bonus part of `annual_compensation`.
    pub bonus_compensation: f64,
    pub total_compensation: f64,
    pub months_in_term: u32,
    pub bonus_counts: BonusCounts,
    pub bonus_rates: BonusRates,
    /// The amount of one bonus payment.
    pub bonus_amounts: PerBonusMonth<f64>,
    pub term_start: NaiveDate,
    pub term_end: NaiveDate,
    pub election_year: i32,
}

/// All the compensation of one party in one year, across municipalities.
#[derive(PartialEq, Debug, Clone)]
pub struct PartyYearCompensation {
    pub party: String,
    pub year: i32,
    pub seat_count: u32,
    pub municipality_count: usize,
    pub total_compensation: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PartyCompensationSummary {
    pub party: String,
    pub total_compensation: f64,
    /// Summed over the yearly rows: a seat held over 5 calendar years counts 5 times.
    pub seat_count: u32,
    pub municipality_count: usize,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct CompensationReport {
    /// In term order.
    pub terms: Vec<CompensationTerm>,
    /// Sorted by party, then year.
    pub rows: Vec<PartyYearCompensation>,
    /// Sorted by decreasing total compensation.
    pub party_summary: Vec<PartyCompensationSummary>,
    /// Sorted by prefecture, municipality, party, year.
    pub municipality_breakdown: Vec<MunicipalityYearCompensation>,
}

// **** Accrual rules ****

fn bonus_multiplier(rates: &BonusRates, counts: &BonusCounts) -> f64 {
    BonusMonth::ALL
        .iter()
        .filter(|m| counts.get(**m) > 0 && rates.get(**m) != 0.0)
        .map(|m| rates.get(*m) / 100.0 * counts.get(*m) as f64)
        .sum()
}

/// The compensation of one seat over the given number of months and bonus payments.
pub fn per_seat_compensation(rate: &CompensationRate, months: u32, counts: &BonusCounts) -> f64 {
    rate.monthly * (months as f64 + bonus_multiplier(&rate.bonus_rates, counts))
}

#[derive(PartialEq, Debug, Clone, Copy, Default)]
struct YearSlice {
    months: u32,
    bonus_counts: BonusCounts,
}

fn count_bonuses(start: NaiveDate, end: NaiveDate) -> BonusCounts {
    let mut counts = BonusCounts::default();
    for ym in iterate_months(start, end) {
        if let Some(m) = BonusMonth::from_month(ym.month) {
            *counts.get_mut(m) += 1;
        }
    }
    counts
}

// Invariant: the months of the slices add up to the months of the term.
fn split_by_year(start: NaiveDate, end: NaiveDate) -> BTreeMap<i32, YearSlice> {
    let mut res: BTreeMap<i32, YearSlice> = BTreeMap::new();
    for ym in iterate_months(start, end) {
        let slice = res.entry(ym.year).or_default();
        slice.months += 1;
        if let Some(m) = BonusMonth::from_month(ym.month) {
            *slice.bonus_counts.get_mut(m) += 1;
        }
    }
    if res.is_empty() {
        // A term shorter than a calendar month is paid one month.
        res.insert(
            start.year(),
            YearSlice {
                months: 1,
                bonus_counts: BonusCounts::default(),
            },
        );
    }
    res
}

fn accrue_term(
    term: &Term,
    party: &str,
    seat_count: u32,
    locality: &Locality,
    rate: &CompensationRate,
) -> CompensationTerm {
    let walked = iterate_months(term.start_date, term.end_date).count() as u32;
    let months_in_term = walked.max(1);
    let bonus_counts = count_bonuses(term.start_date, term.end_date);
    let per_seat = per_seat_compensation(rate, months_in_term, &bonus_counts);
    CompensationTerm {
        party: party.to_string(),
        prefecture: locality.prefecture.clone(),
        municipality: locality.municipality.clone(),
        term_id: term.term_id.clone(),
        start_date: term.start_date,
        end_date: term.end_date,
        seat_count,
        months_in_term,
        bonus_counts,
        rate: *rate,
        per_seat_compensation: per_seat,
        total_compensation: per_seat * seat_count as f64,
    }
}

fn split_term(ct: &CompensationTerm) -> Vec<MunicipalityYearCompensation> {
    let rates = ct.rate.bonus_rates;
    let bonus_amounts = PerBonusMonth {
        march: ct.rate.monthly * rates.march / 100.0,
        june: ct.rate.monthly * rates.june / 100.0,
        december: ct.rate.monthly * rates.december / 100.0,
    };
    split_by_year(ct.start_date, ct.end_date)
        .into_iter()
        .map(|(year, slice)| {
            let annual = per_seat_compensation(&ct.rate, slice.months, &slice.bonus_counts);
            let bonus_compensation: f64 = BonusMonth::ALL
                .iter()
                .map(|m| bonus_amounts.get(*m) * slice.bonus_counts.get(*m) as f64)
                .sum();
            MunicipalityYearCompensation {
                party: ct.party.clone(),
                year,
                prefecture: ct.prefecture.clone(),
                municipality: ct.municipality.clone(),
                term_id: ct.term_id.clone(),
                seat_count: ct.seat_count,
                monthly_compensation: ct.rate.monthly,
                annual_compensation: annual,
                bonus_compensation,
                total_compensation: annual * ct.seat_count as f64,
                months_in_term: slice.months,
                bonus_counts: slice.bonus_counts,
                bonus_rates: rates,
                bonus_amounts,
                term_start: ct.start_date,
                term_end: ct.end_date,
                election_year: ct.start_date.year(),
            }
        })
        .collect()
}

/// Computes the compensation of every seat of every term.
///
/// Terms whose municipality cannot be located, or has no compensation reference, are
/// left out. Seats attributed to a party before its founding date are left out as well.
pub fn build_party_compensation(
    terms: &[Term],
    reference: &CompensationTable,
    foundations: &PartyFoundations,
) -> CompensationReport {
    let mut unreferenced: BTreeSet<&str> = BTreeSet::new();
    let mut term_rows: Vec<CompensationTerm> = Vec::new();
    for t in terms.iter() {
        let located = split_municipality_key(&t.municipality_key).and_then(|loc| {
            reference
                .get(&loc.prefecture, &loc.municipality)
                .map(|rate| (loc.clone(), *rate))
        });
        let (locality, rate) = match located {
            Some(x) => x,
            None => {
                unreferenced.insert(t.municipality_key.as_str());
                continue;
            }
        };
        for (party, seat_count) in t.seats.iter() {
            if foundations.predates(party, t.start_date) {
                debug!(
                    "build_party_compensation: {} in {} predates the party",
                    party, t.term_id
                );
                continue;
            }
            term_rows.push(accrue_term(t, party, *seat_count, &locality, &rate));
        }
    }
    if !unreferenced.is_empty() {
        info!(
            "build_party_compensation: {} municipalities without compensation reference",
            unreferenced.len()
        );
        debug!("build_party_compensation: unreferenced: {:?}", unreferenced);
    }

    let mut breakdown: Vec<MunicipalityYearCompensation> =
        term_rows.iter().flat_map(split_term).collect();

    // Per party and year.
    let mut by_party_year: BTreeMap<(String, i32), (u32, BTreeSet<(String, String)>, f64)> =
        BTreeMap::new();
    // Per party.
    let mut by_party: BTreeMap<String, (f64, u32, BTreeSet<(String, String)>)> = BTreeMap::new();
    for r in breakdown.iter() {
        let place = (r.prefecture.clone(), r.municipality.clone());
        let e = by_party_year
            .entry((r.party.clone(), r.year))
            .or_insert((0, BTreeSet::new(), 0.0));
        e.0 += r.seat_count;
        e.1.insert(place.clone());
        e.2 += r.total_compensation;

        let p = by_party
            .entry(r.party.clone())
            .or_insert((0.0, 0, BTreeSet::new()));
        p.0 += r.total_compensation;
        p.1 += r.seat_count;
        p.2.insert(place);
    }

    let rows: Vec<PartyYearCompensation> = by_party_year
        .into_iter()
        .map(|((party, year), (seat_count, places, total))| PartyYearCompensation {
            party,
            year,
            seat_count,
            municipality_count: places.len(),
            total_compensation: total,
        })
        .collect();

    let mut party_summary: Vec<PartyCompensationSummary> = by_party
        .into_iter()
        .map(|(party, (total, seat_count, places))| PartyCompensationSummary {
            party,
            total_compensation: total,
            seat_count,
            municipality_count: places.len(),
        })
        .collect();
    party_summary.sort_by(|a, b| {
        b.total_compensation
            .partial_cmp(&a.total_compensation)
            .unwrap_or(Ordering::Equal)
    });

    breakdown.sort_by(|a, b| {
        (&a.prefecture, &a.municipality, &a.party, a.year, a.term_start).cmp(&(
            &b.prefecture,
            &b.municipality,
            &b.party,
            b.year,
            b.term_start,
        ))
    });

    info!(
        "build_party_compensation: {} term rows, {} party-year rows, {} parties",
        term_rows.len(),
        rows.len(),
        party_summary.len()
    );
    CompensationReport {
        terms: term_rows,
        rows,
        party_summary,
        municipality_breakdown: breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::term_id;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn term(key: &str, start: NaiveDate, end: NaiveDate, seats: &[(&str, u32)]) -> Term {
        Term {
            municipality_key: key.to_string(),
            term_id: term_id(key, start),
            start_date: start,
            end_date: end,
            seats: seats.iter().map(|(p, c)| (p.to_string(), *c)).collect(),
        }
    }

    fn rate(monthly: f64, march: f64, june: f64, december: f64) -> CompensationRate {
        CompensationRate {
            monthly,
            bonus_rates: BonusRates {
                march,
                june,
                december,
            },
        }
    }

    fn table() -> CompensationTable {
        let mut t = CompensationTable::new();
        t.insert("東京都", "新宿区", rate(400000.0, 0.0, 200.0, 250.0));
        t
    }

    #[test]
    fn four_year_term() {
        let terms = vec![term(
            "東京都新宿区議会議員選挙",
            d(2019, 4, 21),
            d(2023, 4, 23),
            &[("P", 3)],
        )];
        let rep = build_party_compensation(&terms, &table(), &PartyFoundations::empty());
        assert_eq!(rep.terms.len(), 1);
        let ct = &rep.terms[0];
        assert_eq!(ct.prefecture, "東京都");
        assert_eq!(ct.municipality, "新宿区");
        assert_eq!(ct.months_in_term, 48);
        assert_eq!(ct.bonus_counts.june, 4);
        assert_eq!(ct.bonus_counts.december, 4);
        // 48 months + 4 * 2.0 + 4 * 2.5
        assert_eq!(ct.per_seat_compensation, 400000.0 * 66.0);
        assert_eq!(ct.total_compensation, 400000.0 * 66.0 * 3.0);

        // 2019: Apr-Dec, 2020-2022: full years, 2023: Jan-Mar
        let years: Vec<(i32, u32)> = rep
            .municipality_breakdown
            .iter()
            .map(|r| (r.year, r.months_in_term))
            .collect();
        assert_eq!(
            years,
            vec![(2019, 9), (2020, 12), (2021, 12), (2022, 12), (2023, 3)]
        );
        let split_total: f64 = rep
            .municipality_breakdown
            .iter()
            .map(|r| r.total_compensation)
            .sum();
        assert!((split_total - ct.total_compensation).abs() < 1e-6);

        let y2023 = &rep.municipality_breakdown[4];
        assert_eq!(y2023.bonus_counts.june, 0);
        assert_eq!(y2023.bonus_compensation, 0.0);
        let y2020 = &rep.municipality_breakdown[1];
        assert_eq!(y2020.bonus_amounts.june, 800000.0);
        assert_eq!(y2020.bonus_amounts.december, 1000000.0);
        assert_eq!(y2020.bonus_compensation, 1800000.0);
        assert_eq!(y2020.annual_compensation, 400000.0 * 12.0 + 1800000.0);
        assert_eq!(y2020.election_year, 2019);

        assert_eq!(rep.rows.len(), 5);
        assert_eq!(rep.party_summary.len(), 1);
        assert_eq!(rep.party_summary[0].seat_count, 15);
        assert_eq!(rep.party_summary[0].municipality_count, 1);
    }

    #[test]
    fn missing_reference_is_not_reported() {
        let terms = vec![
            term("東京都中野区議会議員選挙", d(2019, 4, 21), d(2023, 4, 23), &[("P", 3)]),
            term("衆議院議員総選挙", d(2021, 10, 31), d(2024, 10, 27), &[("P", 3)]),
        ];
        let rep = build_party_compensation(&terms, &table(), &PartyFoundations::empty());
        assert_eq!(rep, CompensationReport::default());
    }

    #[test]
    fn short_term_is_paid_one_month() {
        let terms = vec![term(
            "東京都新宿区議会議員補欠選挙",
            d(2020, 6, 7),
            d(2020, 6, 28),
            &[("P", 1)],
        )];
        let rep = build_party_compensation(&terms, &table(), &PartyFoundations::empty());
        assert_eq!(rep.terms[0].months_in_term, 1);
        assert_eq!(rep.terms[0].bonus_counts.june, 0);
        assert_eq!(rep.terms[0].total_compensation, 400000.0);
        assert_eq!(rep.municipality_breakdown.len(), 1);
        assert_eq!(rep.municipality_breakdown[0].total_compensation, 400000.0);
    }

    #[test]
    fn seats_before_founding_are_not_paid() {
        let mut foundations = PartyFoundations::empty();
        foundations.insert("New", d(2020, 1, 1));
        let terms = vec![term(
            "東京都新宿区議会議員選挙",
            d(2019, 4, 21),
            d(2023, 4, 23),
            &[("New", 1), ("Old", 2)],
        )];
        let rep = build_party_compensation(&terms, &table(), &foundations);
        let parties: Vec<&str> = rep.terms.iter().map(|t| t.party.as_str()).collect();
        assert_eq!(parties, vec!["Old"]);
    }

    #[test]
    fn party_summary_is_sorted_by_total() {
        let terms = vec![term(
            "東京都新宿区議会議員選挙",
            d(2019, 4, 21),
            d(2023, 4, 23),
            &[("A", 1), ("B", 4), ("C", 2)],
        )];
        let rep = build_party_compensation(&terms, &table(), &PartyFoundations::empty());
        let parties: Vec<&str> = rep.party_summary.iter().map(|p| p.party.as_str()).collect();
        assert_eq!(parties, vec!["B", "C", "A"]);
        assert_eq!(rep.rows[0].party, "A");
        assert_eq!(rep.rows[0].year, 2019);
    }
}
