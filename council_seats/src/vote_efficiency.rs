// How many more seats each party could have won with its votes, if they had been
// spread evenly over its candidates.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, info};

use crate::config::CandidateRecord;
use crate::parties::{canonical_party, is_winning_outcome};

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyVoteEfficiency {
    pub party: String,
    pub total_votes: i64,
    pub candidates: u32,
    pub actual_winners: u32,
    /// The number of seats the votes of the party are worth at the lowest winning score.
    pub potential_winners: i64,
    /// `potential_winners - actual_winners`, may be negative.
    pub gap: i64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionVoteEfficiency {
    pub election_key: String,
    pub election_date: NaiveDate,
    pub min_winning_vote: i64,
    pub total_candidates: u32,
    pub winner_count: u32,
    pub total_votes: i64,
    /// The sum of the positive gaps.
    pub total_gap: i64,
    /// Sorted by decreasing gap, then potential winners.
    pub party_results: Vec<PartyVoteEfficiency>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyEfficiencySummary {
    pub party: String,
    pub elections: u32,
    pub total_votes: i64,
    pub candidates: u32,
    pub actual_winners: u32,
    pub potential_winners: i64,
    pub gap: i64,
}

/// The number of elections left out, by reason.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ExclusionCounts {
    pub no_winners: u32,
    /// A winner has no vote count.
    pub missing_winner_votes: u32,
    /// The lowest winning score is not positive.
    pub invalid_min_vote: u32,
    /// No party received any vote.
    pub no_party_data: u32,
}

impl ExclusionCounts {
    pub fn total(&self) -> u32 {
        self.no_winners + self.missing_winner_votes + self.invalid_min_vote + self.no_party_data
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoteEfficiencyReport {
    /// Most recent first.
    pub elections: Vec<ElectionVoteEfficiency>,
    pub parties: Vec<PartyEfficiencySummary>,
    pub excluded: ExclusionCounts,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

#[derive(Default)]
struct PartyTally {
    votes: i64,
    winners_with_votes: u32,
    candidates: u32,
}

#[derive(Default)]
struct ElectionTally {
    candidates: u32,
    winners: u32,
    votes: i64,
    min_win_vote: Option<i64>,
    missing_winner_votes: bool,
    parties: BTreeMap<String, PartyTally>,
}

impl ElectionTally {
    fn record(&mut self, c: &CandidateRecord) {
        let party = self.parties.entry(canonical_party(&c.party)).or_default();
        self.candidates += 1;
        party.candidates += 1;
        if let Some(v) = c.votes {
            self.votes += v;
            party.votes += v;
        }
        if is_winning_outcome(&c.outcome) {
            self.winners += 1;
            match c.votes {
                Some(v) => {
                    self.min_win_vote = Some(self.min_win_vote.map_or(v, |m| m.min(v)));
                    party.winners_with_votes += 1;
                }
                None => self.missing_winner_votes = true,
            }
        }
    }
}

fn by_gap_then_potential(gap: i64, potential: i64) -> Reverse<(i64, i64)> {
    Reverse((gap, potential))
}

/// Compares, in each election, the seats won by every party with the seats its votes
/// would buy at the lowest winning score.
pub fn build_vote_efficiency(candidates: &[CandidateRecord]) -> VoteEfficiencyReport {
    let mut tallies: BTreeMap<(String, NaiveDate), ElectionTally> = BTreeMap::new();
    for c in candidates.iter() {
        let key = {
            let k = c.source_key.trim();
            if k.is_empty() {
                c.source_file.trim()
            } else {
                k
            }
        };
        let date = match (key.is_empty(), c.election_date) {
            (false, Some(d)) => d,
            _ => continue,
        };
        tallies
            .entry((key.to_string(), date))
            .or_default()
            .record(c);
    }

    let mut excluded = ExclusionCounts::default();
    let mut elections: Vec<ElectionVoteEfficiency> = Vec::new();
    let mut summaries: BTreeMap<String, PartyEfficiencySummary> = BTreeMap::new();

    for ((election_key, election_date), tally) in tallies.into_iter() {
        if tally.winners == 0 {
            excluded.no_winners += 1;
            continue;
        }
        if tally.missing_winner_votes {
            excluded.missing_winner_votes += 1;
            continue;
        }
        let min_win_vote = match tally.min_win_vote {
            Some(m) if m > 0 => m,
            _ => {
                excluded.invalid_min_vote += 1;
                continue;
            }
        };

        let mut party_results: Vec<PartyVoteEfficiency> = tally
            .parties
            .into_iter()
            .filter(|(_, p)| p.votes > 0)
            .map(|(party, p)| {
                let potential_winners = p.votes / min_win_vote;
                PartyVoteEfficiency {
                    party,
                    total_votes: p.votes,
                    candidates: p.candidates,
                    actual_winners: p.winners_with_votes,
                    potential_winners,
                    gap: potential_winners - p.winners_with_votes as i64,
                }
            })
            .collect();
        if party_results.is_empty() {
            excluded.no_party_data += 1;
            continue;
        }
        party_results.sort_by_key(|r| by_gap_then_potential(r.gap, r.potential_winners));

        for r in party_results.iter() {
            let s = summaries
                .entry(r.party.clone())
                .or_insert_with(|| PartyEfficiencySummary {
                    party: r.party.clone(),
                    elections: 0,
                    total_votes: 0,
                    candidates: 0,
                    actual_winners: 0,
                    potential_winners: 0,
                    gap: 0,
                });
            s.elections += 1;
            s.total_votes += r.total_votes;
            s.candidates += r.candidates;
            s.actual_winners += r.actual_winners;
            s.potential_winners += r.potential_winners;
            s.gap = s.potential_winners - s.actual_winners as i64;
        }

        let total_gap = party_results.iter().map(|r| r.gap.max(0)).sum();
        debug!(
            "build_vote_efficiency: {} {}: min vote {}, gap {}",
            election_key, election_date, min_win_vote, total_gap
        );
        elections.push(ElectionVoteEfficiency {
            election_key,
            election_date,
            min_winning_vote: min_win_vote,
            total_candidates: tally.candidates,
            winner_count: tally.winners,
            total_votes: tally.votes,
            total_gap,
            party_results,
        });
    }

    let min_date = elections.iter().map(|e| e.election_date).min();
    let max_date = elections.iter().map(|e| e.election_date).max();
    elections.sort_by_key(|e| Reverse(e.election_date));

    let mut parties: Vec<PartyEfficiencySummary> = summaries.into_values().collect();
    parties.sort_by_key(|s| by_gap_then_potential(s.gap, s.potential_winners));

    info!(
        "build_vote_efficiency: {} elections analyzed, {} excluded",
        elections.len(),
        excluded.total()
    );
    VoteEfficiencyReport {
        elections,
        parties,
        excluded,
        min_date,
        max_date,
    }
}
