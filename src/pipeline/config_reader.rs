use crate::pipeline::*;

use std::fs;

use serde::{Deserialize, Serialize};

// 0-based column indices of the compensation reference.
pub const DEFAULT_PREFECTURE_COLUMN: usize = 1;
pub const DEFAULT_MUNICIPALITY_COLUMN: usize = 2;
pub const DEFAULT_MONTHLY_COLUMN: usize = 11;
pub const DEFAULT_BONUS_COLUMNS: PerBonusMonth<usize> = PerBonusMonth {
    march: 12,
    june: 13,
    december: 14,
};

/// Where to find each field in the rows of the compensation reference.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ColumnLayout {
    pub prefecture: usize,
    pub municipality: usize,
    pub monthly: usize,
    pub bonus: PerBonusMonth<usize>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout {
            prefecture: DEFAULT_PREFECTURE_COLUMN,
            municipality: DEFAULT_MUNICIPALITY_COLUMN,
            monthly: DEFAULT_MONTHLY_COLUMN,
            bonus: DEFAULT_BONUS_COLUMNS,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompensationColumns {
    #[serde(rename = "prefecture")]
    _prefecture: Option<JSValue>,
    #[serde(rename = "municipality")]
    _municipality: Option<JSValue>,
    #[serde(rename = "monthly")]
    _monthly: Option<JSValue>,
    #[serde(rename = "bonusMarch")]
    _bonus_march: Option<JSValue>,
    #[serde(rename = "bonusJune")]
    _bonus_june: Option<JSValue>,
    #[serde(rename = "bonusDecember")]
    _bonus_december: Option<JSValue>,
}

impl CompensationColumns {
    pub fn layout(&self) -> PipelineResult<ColumnLayout> {
        Ok(ColumnLayout {
            prefecture: read_column_index(&self._prefecture, DEFAULT_PREFECTURE_COLUMN)?,
            municipality: read_column_index(&self._municipality, DEFAULT_MUNICIPALITY_COLUMN)?,
            monthly: read_column_index(&self._monthly, DEFAULT_MONTHLY_COLUMN)?,
            bonus: PerBonusMonth {
                march: read_column_index(&self._bonus_march, DEFAULT_BONUS_COLUMNS.march)?,
                june: read_column_index(&self._bonus_june, DEFAULT_BONUS_COLUMNS.june)?,
                december: read_column_index(
                    &self._bonus_december,
                    DEFAULT_BONUS_COLUMNS.december,
                )?,
            },
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InputSettings {
    #[serde(rename = "electionSummary")]
    pub election_summary: Option<String>,
    #[serde(rename = "candidateDetails")]
    pub candidate_details: Option<String>,
    #[serde(rename = "compensationReference")]
    pub compensation_reference: Option<String>,
    #[serde(rename = "compensationColumns")]
    pub compensation_columns: Option<CompensationColumns>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: Option<String>,
    pub reference: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuleSettings {
    #[serde(rename = "termYears")]
    pub term_years: Option<u32>,
    #[serde(rename = "topParties")]
    pub top_parties: Option<usize>,
    #[serde(rename = "maxWinRateParties")]
    pub max_win_rate_parties: Option<usize>,
    pub today: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PartyFoundationSetting {
    pub name: String,
    pub founded: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub inputs: InputSettings,
    pub output: OutputSettings,
    pub rules: RuleSettings,
    /// Replaces the default founding dates when present.
    #[serde(rename = "partyFoundations")]
    pub party_foundations: Option<Vec<PartyFoundationSetting>>,
}

impl DashboardConfig {
    pub fn to_rules(&self, today: NaiveDate) -> PipelineResult<DashboardRules> {
        let mut rules = DashboardRules::as_of(today);
        if let Some(years) = self.rules.term_years {
            rules.term_years = years;
        }
        if let Some(n) = self.rules.top_parties {
            rules.top_parties = n;
        }
        if let Some(n) = self.rules.max_win_rate_parties {
            rules.max_win_rate_parties = n;
        }
        if let Some(settings) = &self.party_foundations {
            let mut foundations = PartyFoundations::empty();
            for s in settings.iter() {
                let founded = io_common::parse_date(&s.founded).context(InvalidDateSnafu {
                    value: s.founded.clone(),
                })?;
                foundations.insert(&s.name, founded);
            }
            rules.party_foundations = foundations;
        }
        Ok(rules)
    }
}

pub fn read_config(path: &Path) -> BPipelineResult<DashboardConfig> {
    let p = path.display().to_string();
    ensure!(path.exists(), MissingInputSnafu { path: p.clone() });
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p.clone() })?;
    let config: DashboardConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: p.clone() })?;
    info!("read_config: read configuration {}", p);
    Ok(config)
}

// Numbers and numeric strings are 0-based. Letters follow the spreadsheet convention: A is the
// first column, AA the 27th.
fn read_column_index(x: &Option<JSValue>, default: usize) -> PipelineResult<usize> {
    match x {
        None | Some(JSValue::Null) => Ok(default),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .and_then(|x| usize::try_from(x).ok())
            .context(ParsingColumnIndexSnafu {
                value: n.to_string(),
            }),
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            let idx = s
                .to_ascii_uppercase()
                .chars()
                .try_fold(0usize, |acc, c| {
                    acc.checked_mul(26)?
                        .checked_add(c as usize - 'A' as usize + 1)
                })
                .context(ParsingColumnIndexSnafu { value: s.clone() })?;
            // At least one letter, so idx >= 1.
            Ok(idx - 1)
        }
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingColumnIndexSnafu { value: s.clone() }),
        Some(other) => whatever!("unsupported column index: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_indices() {
        assert_eq!(read_column_index(&None, 4).unwrap(), 4);
        assert_eq!(read_column_index(&Some(json!(3)), 4).unwrap(), 3);
        assert_eq!(read_column_index(&Some(json!("12")), 4).unwrap(), 12);
        assert_eq!(read_column_index(&Some(json!("A")), 4).unwrap(), 0);
        assert_eq!(read_column_index(&Some(json!("l")), 4).unwrap(), 11);
        assert_eq!(read_column_index(&Some(json!("AA")), 4).unwrap(), 26);
        assert!(read_column_index(&Some(json!(-1)), 4).is_err());
        assert!(read_column_index(&Some(json!("1a")), 4).is_err());
        assert!(read_column_index(&Some(json!([1])), 4).is_err());
        assert_eq!(read_column_index(&Some(json!("XFD")), 4).unwrap(), 16383);
        assert!(read_column_index(&Some(json!("A".repeat(40))), 4).is_err());
        assert!(read_column_index(&Some(json!("z".repeat(64))), 4).is_err());
    }

    #[test]
    fn full_configuration() {
        let config: DashboardConfig = serde_json::from_value(json!({
            "inputs": {
                "electionSummary": "summary.csv",
                "candidateDetails": "candidates.csv",
                "compensationReference": "pay.xlsx",
                "compensationColumns": {"monthly": "L", "bonusJune": 20}
            },
            "output": {"directory": "out", "reference": "expected.json"},
            "rules": {"termYears": 2, "maxWinRateParties": 0},
            "partyFoundations": [{"name": "New", "founded": "2020-02-02"}]
        }))
        .unwrap();
        let layout = config.inputs.compensation_columns.as_ref().unwrap().layout().unwrap();
        assert_eq!(layout.monthly, 11);
        assert_eq!(layout.bonus.june, 20);
        assert_eq!(layout.bonus.march, 12);
        assert_eq!(layout.prefecture, 1);

        let today = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let rules = config.to_rules(today).unwrap();
        assert_eq!(rules.term_years, 2);
        assert_eq!(rules.top_parties, DEFAULT_TOP_PARTIES);
        assert_eq!(rules.max_win_rate_parties, 0);
        assert_eq!(rules.party_foundations.len(), 1);
        assert_eq!(
            rules.party_foundations.founded("New"),
            NaiveDate::from_ymd_opt(2020, 2, 2)
        );
    }

    #[test]
    fn empty_configuration_uses_defaults() {
        let config: DashboardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        let rules = config
            .to_rules(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
            .unwrap();
        assert_eq!(rules.party_foundations, PartyFoundations::default());
    }

    #[test]
    fn invalid_founding_date() {
        let config: DashboardConfig = serde_json::from_value(json!({
            "partyFoundations": [{"name": "New", "founded": "someday"}]
        }))
        .unwrap();
        let err = config
            .to_rules(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDate { .. }));
    }
}
