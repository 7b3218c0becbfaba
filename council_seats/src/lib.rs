mod config;
use chrono::NaiveDate;
use log::{debug, info};

pub mod builder;
pub mod calendar;
pub mod compensation;
pub mod events;
pub mod locality;
pub mod manual;
pub mod parties;
pub mod terms;
pub mod timeline;
pub mod vote_efficiency;
pub mod win_rate;

pub use crate::compensation::{build_party_compensation, CompensationReport};
pub use crate::config::*;
pub use crate::events::{extract_election_events, ElectionEvent};
pub use crate::parties::{canonical_party, is_winning_outcome, PartyFoundations};
pub use crate::terms::{build_terms, Term};
pub use crate::timeline::{build_party_timeline, PartyTimeline};
pub use crate::vote_efficiency::{build_vote_efficiency, VoteEfficiencyReport};
pub use crate::win_rate::{build_win_rate, WinRateReport};

// ******** Output data structures *********

/// The headline figures of the seat timeline.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DashboardSummary {
    pub municipality_count: usize,
    pub total_seats: u32,
    pub party_count: usize,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// Everything derived from one set of candidates.
#[derive(PartialEq, Debug, Clone)]
pub struct DashboardData {
    pub events: Vec<ElectionEvent>,
    pub terms: Vec<Term>,
    pub timeline: PartyTimeline,
    pub summary: DashboardSummary,
    pub compensation: CompensationReport,
    pub win_rate: WinRateReport,
    pub vote_efficiency: VoteEfficiencyReport,
}

/// Derives all the datasets from the candidates.
///
/// Arguments:
/// * `candidates` the candidates of all the elections, with canonical party names
/// * `compensation` the compensation reference. Terms in municipalities that it does not
/// list get no compensation.
/// * `rules` the rules that govern the derivation
pub fn build_dashboard(
    candidates: &[CandidateRecord],
    compensation: &CompensationTable,
    rules: &DashboardRules,
) -> Result<DashboardData, DashboardErrors> {
    rules.validate()?;
    info!(
        "Processing {} candidates, {} compensation references, today: {}",
        candidates.len(),
        compensation.len(),
        rules.today
    );
    debug!("build_dashboard: rules: {:?}", rules);

    let extraction = extract_election_events(candidates);
    let terms = build_terms(&extraction.events, rules.term_years);
    let timeline = build_party_timeline(
        &terms,
        &rules.party_foundations,
        rules.today,
        rules.top_parties,
    );
    let summary = DashboardSummary {
        municipality_count: extraction.municipality_count,
        total_seats: timeline.total_seats,
        party_count: timeline.parties.len(),
        min_date: timeline.min_date,
        max_date: timeline.max_date,
    };
    info!("build_dashboard: summary: {:?}", summary);

    let compensation = build_party_compensation(&terms, compensation, &rules.party_foundations);
    let win_rate = build_win_rate(candidates, &timeline.parties, rules.max_win_rate_parties);
    let vote_efficiency = build_vote_efficiency(candidates);

    Ok(DashboardData {
        events: extraction.events,
        terms,
        timeline,
        summary,
        compensation,
        win_rate,
        vote_efficiency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cand(key: &str, date: NaiveDate, party: &str, votes: i64, outcome: &str) -> CandidateRecord {
        CandidateRecord {
            party: party.to_string(),
            votes: Some(votes),
            outcome: outcome.to_string(),
            source_key: key.to_string(),
            election_date: Some(date),
            ..Default::default()
        }
    }

    #[test]
    fn all_stages_are_connected() {
        init();
        let key = "東京都新宿区議会議員選挙";
        let candidates = vec![
            cand(key, d(2019, 4, 21), "自由民主党", 3000, "当選"),
            cand(key, d(2019, 4, 21), "自由民主党", 2000, "当選"),
            cand(key, d(2019, 4, 21), "公明党", 2500, "当選"),
            cand(key, d(2019, 4, 21), "無所属", 900, "落選"),
        ];
        let mut table = CompensationTable::new();
        table.insert(
            "東京都",
            "新宿区",
            CompensationRate {
                monthly: 500000.0,
                bonus_rates: BonusRates::default(),
            },
        );
        let rules = DashboardRules::as_of(d(2021, 1, 1));
        let data = build_dashboard(&candidates, &table, &rules).unwrap();

        assert_eq!(data.events.len(), 1);
        assert_eq!(data.terms.len(), 1);
        assert_eq!(
            data.summary,
            DashboardSummary {
                municipality_count: 1,
                total_seats: 3,
                party_count: 2,
                min_date: Some(d(2019, 4, 21)),
                max_date: Some(d(2019, 4, 21)),
            }
        );
        assert_eq!(data.timeline.parties, vec!["自由民主党", "公明党"]);
        assert_eq!(data.compensation.terms.len(), 2);
        // The timeline ranking drives the win-rate order.
        assert_eq!(data.win_rate.parties[0].party, "自由民主党");
        assert_eq!(data.win_rate.parties[2].party, "無所属");
        assert_eq!(data.vote_efficiency.elections[0].min_winning_vote, 2000);
    }

    #[test]
    fn invalid_rules() {
        let mut rules = DashboardRules::as_of(d(2021, 1, 1));
        rules.top_parties = 0;
        let res = build_dashboard(&[], &CompensationTable::new(), &rules);
        assert_eq!(res, Err(DashboardErrors::InvalidTopParties));
    }
}
