// The JSON documents read by the dashboard front-end.

use serde_json::{json, Map};

use crate::pipeline::*;
use council_seats::compensation::{
    MunicipalityYearCompensation, PartyCompensationSummary, PartyYearCompensation,
};
use council_seats::timeline::TimelineSeries;
use council_seats::vote_efficiency::{
    ElectionVoteEfficiency, PartyEfficiencySummary, PartyVoteEfficiency,
};
use council_seats::win_rate::{WinCount, WinRateSeries};

const SCHEMA_VERSION: u32 = 1;
const CURRENCY: &str = "JPY";
const COMPENSATION_FORMULA: &str = "Prorated using monthly amount and bonus rates.";
const SOURCE_COMPENSATION_YEAR: i32 = 2020;

// Amounts are rounded to whole currency units.
fn money(amount: f64) -> JSValue {
    json!(amount.round() as i64)
}

fn day(date: &NaiveDate) -> JSValue {
    json!(date.format("%Y-%m-%d").to_string())
}

fn opt_day(date: &Option<NaiveDate>) -> JSValue {
    match date {
        Some(d) => day(d),
        None => JSValue::Null,
    }
}

// The front-end reads range bounds and win-rate points as midnight timestamps.
fn timestamp(date: &NaiveDate) -> JSValue {
    json!(date.format("%Y-%m-%dT00:00:00").to_string())
}

fn opt_timestamp(date: &Option<NaiveDate>) -> JSValue {
    match date {
        Some(d) => timestamp(d),
        None => JSValue::Null,
    }
}

// ******** Records *********

fn election_record(e: &ElectionRecord) -> JSValue {
    json!({
        "election_name": e.election_name,
        "notice_date": opt_day(&e.notice_date),
        "election_day": opt_day(&e.election_day),
        "seats": e.seats,
        "candidate_count": e.candidate_count,
        "registered_voters": e.registered_voters,
        "note": e.note,
    })
}

fn candidate_record(c: &CandidateRecord) -> JSValue {
    json!({
        "candidate_id": c.candidate_id,
        "name": c.name,
        "kana": c.kana,
        "age": c.age,
        "gender": c.gender,
        "incumbent_status": c.incumbent_status,
        "profession": c.profession,
        "party": c.party,
        "votes": c.votes,
        "outcome": c.outcome,
        "image_file": c.image_file,
        "source_file": c.source_file,
        "source_key": c.source_key,
        "source_date_code": c.source_date_code,
        "election_date": opt_day(&c.election_date),
    })
}

pub fn election_summary(elections: &[ElectionRecord], generated_at: &str) -> JSValue {
    let records: Vec<JSValue> = elections.iter().map(election_record).collect();
    json!({
        "generated_at": generated_at,
        "schema_version": SCHEMA_VERSION,
        "records": records,
    })
}

pub fn candidate_details(candidates: &[CandidateRecord], generated_at: &str) -> JSValue {
    let records: Vec<JSValue> = candidates.iter().map(candidate_record).collect();
    json!({
        "generated_at": generated_at,
        "schema_version": SCHEMA_VERSION,
        "records": records,
    })
}

// ******** Compensation *********

fn party_year(r: &PartyYearCompensation) -> JSValue {
    json!({
        "party": r.party,
        "year": r.year,
        "seat_count": r.seat_count,
        "municipality_count": r.municipality_count,
        "total_compensation": money(r.total_compensation),
    })
}

fn party_total(r: &PartyCompensationSummary) -> JSValue {
    json!({
        "party": r.party,
        "total_compensation": money(r.total_compensation),
        "seat_count": r.seat_count,
        "municipality_count": r.municipality_count,
    })
}

fn municipality_year(r: &MunicipalityYearCompensation) -> JSValue {
    json!({
        "party": r.party,
        "year": r.year,
        "prefecture": r.prefecture,
        "municipality": r.municipality,
        "term_id": r.term_id,
        "seat_count": r.seat_count,
        "annual_compensation": money(r.annual_compensation),
        "monthly_compensation": money(r.monthly_compensation),
        "bonus_compensation": money(r.bonus_compensation),
        "total_compensation": money(r.total_compensation),
        "months_in_term": r.months_in_term,
        "bonus_count_march": r.bonus_counts.march,
        "bonus_count_june": r.bonus_counts.june,
        "bonus_count_december": r.bonus_counts.december,
        "bonus_rate_march": r.bonus_rates.march,
        "bonus_rate_june": r.bonus_rates.june,
        "bonus_rate_december": r.bonus_rates.december,
        "bonus_amount_march": money(r.bonus_amounts.march),
        "bonus_amount_june": money(r.bonus_amounts.june),
        "bonus_amount_december": money(r.bonus_amounts.december),
        "term_start": day(&r.term_start),
        "term_end": day(&r.term_end),
        "election_date": day(&r.term_start),
        "election_year": r.election_year,
    })
}

pub fn compensation(report: &CompensationReport, generated_at: &str) -> JSValue {
    let rows: Vec<JSValue> = report.rows.iter().map(party_year).collect();
    let party_summary: Vec<JSValue> = report.party_summary.iter().map(party_total).collect();
    let breakdown: Vec<JSValue> = report
        .municipality_breakdown
        .iter()
        .map(municipality_year)
        .collect();
    json!({
        "generated_at": generated_at,
        "currency": CURRENCY,
        "formula": COMPENSATION_FORMULA,
        "source_compensation_year": SOURCE_COMPENSATION_YEAR,
        "rows": rows,
        "party_summary": party_summary,
        "municipality_breakdown": breakdown,
    })
}

// ******** Seat timeline *********

fn chart_series(s: &TimelineSeries) -> JSValue {
    json!({
        "name": s.name,
        "type": "line",
        "smooth": true,
        "showSymbol": false,
        "emphasis": {"focus": "series"},
        "data": s.data,
    })
}

pub fn top_dashboard(data: &DashboardData, generated_at: &str) -> JSValue {
    let timeline = &data.timeline;
    let summary = &data.summary;
    let series: Vec<JSValue> = timeline.series.iter().map(chart_series).collect();
    json!({
        "generated_at": generated_at,
        "summary": {
            "municipality_count": summary.municipality_count,
            "total_seats": summary.total_seats,
            "party_count": summary.party_count,
            "min_date": opt_timestamp(&summary.min_date),
            "max_date": opt_timestamp(&summary.max_date),
        },
        "timeline": {
            "date_labels": timeline.date_labels,
            "series": series,
            "parties": timeline.parties,
            "totals": timeline.totals,
            "sparkline_values": timeline.sparkline_values,
            "total_seats": timeline.total_seats,
            "min_date": opt_timestamp(&timeline.min_date),
            "max_date": opt_timestamp(&timeline.max_date),
        },
    })
}

// ******** Win rate *********

fn win_count(count: &WinCount) -> Map<String, JSValue> {
    let mut m = Map::new();
    m.insert("candidates".to_string(), json!(count.candidates));
    m.insert("winners".to_string(), json!(count.winners));
    m.insert("ratio".to_string(), json!(count.ratio()));
    m
}

fn with_count(mut fields: Map<String, JSValue>, count: &WinCount) -> JSValue {
    fields.extend(win_count(count));
    JSValue::Object(fields)
}

fn win_rate_series(s: &WinRateSeries) -> JSValue {
    let ratios: Vec<Option<f64>> = s.counts.iter().map(|c| c.and_then(|x| x.ratio())).collect();
    let winners: Vec<Option<u32>> = s.counts.iter().map(|c| c.map(|x| x.winners)).collect();
    let candidates: Vec<Option<u32>> = s.counts.iter().map(|c| c.map(|x| x.candidates)).collect();
    json!({
        "party": s.party,
        "ratios": ratios,
        "winners": winners,
        "candidates": candidates,
    })
}

pub fn win_rate(report: &WinRateReport, generated_at: &str) -> JSValue {
    let parties: Vec<JSValue> = report
        .parties
        .iter()
        .map(|p| {
            let mut fields = Map::new();
            fields.insert("party".to_string(), json!(p.party));
            with_count(fields, &p.count)
        })
        .collect();
    let events: Vec<JSValue> = report
        .events
        .iter()
        .map(|e| {
            let mut fields = Map::new();
            fields.insert("party".to_string(), json!(e.party));
            fields.insert("election_key".to_string(), json!(e.election_key));
            fields.insert("date".to_string(), timestamp(&e.date));
            with_count(fields, &e.count)
        })
        .collect();
    let series: Vec<JSValue> = report.series.iter().map(win_rate_series).collect();
    json!({
        "generated_at": generated_at,
        "summary": {
            "parties": parties,
            "totals": JSValue::Object(win_count(&report.totals)),
        },
        "timeline": {
            "months": report.months,
            "series": series,
        },
        "events": events,
    })
}

// ******** Vote efficiency *********

fn party_efficiency(p: &PartyVoteEfficiency) -> JSValue {
    json!({
        "party": p.party,
        "total_votes": p.total_votes,
        "candidates": p.candidates,
        "actual_winners": p.actual_winners,
        "potential_winners": p.potential_winners,
        "gap": p.gap,
    })
}

fn election_efficiency(e: &ElectionVoteEfficiency) -> JSValue {
    let party_results: Vec<JSValue> = e.party_results.iter().map(party_efficiency).collect();
    json!({
        "election_key": e.election_key,
        "election_date": day(&e.election_date),
        "min_winning_vote": e.min_winning_vote,
        "total_candidates": e.total_candidates,
        "winner_count": e.winner_count,
        "total_votes": e.total_votes,
        "total_gap": e.total_gap,
        "party_results": party_results,
    })
}

fn party_efficiency_summary(p: &PartyEfficiencySummary) -> JSValue {
    json!({
        "party": p.party,
        "elections": p.elections,
        "total_votes": p.total_votes,
        "candidates": p.candidates,
        "actual_winners": p.actual_winners,
        "potential_winners": p.potential_winners,
        "gap": p.gap,
    })
}

pub fn vote_optimization(report: &VoteEfficiencyReport, generated_at: &str) -> JSValue {
    let excluded = &report.excluded;
    let elections: Vec<JSValue> = report.elections.iter().map(election_efficiency).collect();
    let parties: Vec<JSValue> = report
        .parties
        .iter()
        .map(party_efficiency_summary)
        .collect();
    json!({
        "generated_at": generated_at,
        "summary": {
            "elections_analyzed": report.elections.len(),
            "excluded_elections": excluded.total(),
            "excluded_breakdown": {
                "no_winners": excluded.no_winners,
                "missing_winner_votes": excluded.missing_winner_votes,
                "invalid_min_vote": excluded.invalid_min_vote,
                "no_party_data": excluded.no_party_data,
            },
            "min_date": opt_timestamp(&report.min_date),
            "max_date": opt_timestamp(&report.max_date),
        },
        "parties": parties,
        "elections": elections,
    })
}
