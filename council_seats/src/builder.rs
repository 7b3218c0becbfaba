use chrono::NaiveDate;

use crate::config::*;
use crate::parties::canonical_party;
use crate::{build_dashboard, DashboardData};

/// A builder for adding candidates one at a time.
///
/// The pipeline that reads whole files calls [`crate::build_dashboard`] directly. The builder
/// is convenient for tests and for smaller programs.
///
/// ```
/// use chrono::NaiveDate;
/// use council_seats::builder::Builder;
/// use council_seats::DashboardRules;
/// # use council_seats::DashboardErrors;
///
/// let today = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
/// let election_day = NaiveDate::from_ymd_opt(2019, 4, 21).unwrap();
/// let mut builder = Builder::new(&DashboardRules::as_of(today))?;
///
/// builder.add_candidate_simple("東京都新宿区議会議員選挙", election_day, "", "当選")?;
/// builder.add_candidate_simple("東京都新宿区議会議員選挙", election_day, "公明党", "落選")?;
///
/// let data = builder.build()?;
/// assert_eq!(data.timeline.parties, vec!["無所属".to_string()]);
/// # Ok::<(), DashboardErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: DashboardRules,
    pub(crate) _compensation: CompensationTable,
    pub(crate) _candidates: Vec<CandidateRecord>,
}

impl Builder {
    pub fn new(rules: &DashboardRules) -> Result<Builder, DashboardErrors> {
        rules.validate()?;
        Ok(Builder {
            _rules: rules.clone(),
            _compensation: CompensationTable::new(),
            _candidates: Vec::new(),
        })
    }

    /// Sets the compensation reference. Without one, no compensation is computed.
    pub fn compensation(self, table: CompensationTable) -> Builder {
        Builder {
            _compensation: table,
            ..self
        }
    }

    /// Adds a candidate from the few fields that the seat timeline needs.
    pub fn add_candidate_simple(
        &mut self,
        municipality_key: &str,
        election_date: NaiveDate,
        party: &str,
        outcome: &str,
    ) -> Result<(), DashboardErrors> {
        self.add_candidate(&CandidateRecord {
            party: party.to_string(),
            outcome: outcome.to_string(),
            source_key: municipality_key.to_string(),
            election_date: Some(election_date),
            ..Default::default()
        })
    }

    /// Adds a candidate.
    ///
    /// The party name is canonicalised. The candidate must be attached to a municipality,
    /// through its source key or its source file.
    pub fn add_candidate(&mut self, candidate: &CandidateRecord) -> Result<(), DashboardErrors> {
        if candidate.source_key.trim().is_empty() && candidate.source_file.trim().is_empty() {
            return Err(DashboardErrors::MissingMunicipality(
                candidate.candidate_id.clone(),
            ));
        }
        let mut c = candidate.clone();
        c.party = canonical_party(&c.party);
        self._candidates.push(c);
        Ok(())
    }

    pub fn build(&self) -> Result<DashboardData, DashboardErrors> {
        build_dashboard(&self._candidates, &self._compensation, &self._rules)
    }
}
