use std::collections::BTreeMap;

use chrono::NaiveDate;

/// The single label used for candidates without a party.
pub const NO_AFFILIATION: &str = "無所属";

/// Outcome labels that mean the candidate took a seat: elected, elected in a by-election,
/// elected by promotion (two spellings), elected (kana spelling) and re-elected.
pub const WINNING_KEYWORDS: [&str; 6] = [
    "当選",
    "補欠当選",
    "繰上当選",
    "繰り上げ当選",
    "当せん",
    "再選",
];

/// Returns true if the outcome label describes a won seat.
pub fn is_winning_outcome(outcome: &str) -> bool {
    let text = outcome.trim();
    if text.is_empty() {
        return false;
    }
    WINNING_KEYWORDS.iter().any(|kw| text.contains(kw))
}

/// Maps every spelling of "no affiliation" (blank, dash, any label containing 無所属)
/// to [`NO_AFFILIATION`]. Other names are only trimmed.
pub fn canonical_party(name: &str) -> String {
    let text = name.trim();
    if text.is_empty() || text == "-" || text.contains(NO_AFFILIATION) {
        NO_AFFILIATION.to_string()
    } else {
        text.to_string()
    }
}

const DEFAULT_FOUNDATIONS: [(&str, i32, u32, u32); 11] = [
    ("自由民主党", 1955, 11, 15),
    ("公明党", 1964, 11, 17),
    ("日本共産党", 1922, 7, 15),
    ("民主党", 1998, 4, 27),
    ("民進党", 2016, 3, 27),
    ("立憲民主党", 2017, 10, 3),
    ("国民民主党", 2018, 5, 7),
    ("社会民主党", 1996, 1, 19),
    ("日本維新の会", 2012, 9, 12),
    ("大阪維新の会", 2010, 4, 19),
    ("希望の党", 2017, 9, 25),
];

/// Founding dates of the parties.
///
/// Historical results sometimes carry the name of a party that did not exist yet
/// (a later party reusing an older name). Seats attributed to a party before its
/// founding date are discarded.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyFoundations {
    dates: BTreeMap<String, NaiveDate>,
}

impl PartyFoundations {
    /// A table without any founding date: nothing is filtered.
    pub fn empty() -> PartyFoundations {
        PartyFoundations {
            dates: BTreeMap::new(),
        }
    }

    /// Sets (or replaces) the founding date of a party.
    pub fn insert(&mut self, party: &str, founded: NaiveDate) {
        self.dates.insert(party.to_string(), founded);
    }

    pub fn founded(&self, party: &str) -> Option<NaiveDate> {
        self.dates.get(party).cloned()
    }

    /// True if the party is known to be founded strictly after the given date.
    pub fn predates(&self, party: &str, date: NaiveDate) -> bool {
        matches!(self.dates.get(party), Some(founded) if date < *founded)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl Default for PartyFoundations {
    fn default() -> PartyFoundations {
        let mut res = PartyFoundations::empty();
        for (name, y, m, d) in DEFAULT_FOUNDATIONS {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                res.insert(name, date);
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winning_outcomes() {
        assert!(is_winning_outcome("当選"));
        assert!(is_winning_outcome(" 補欠当選 "));
        assert!(is_winning_outcome("繰り上げ当選"));
        assert!(is_winning_outcome("再選"));
        assert!(is_winning_outcome("当せん"));
        assert!(!is_winning_outcome("落選"));
        assert!(!is_winning_outcome(""));
        assert!(!is_winning_outcome("   "));
    }

    #[test]
    fn no_affiliation_variants_collapse() {
        assert_eq!(canonical_party(""), NO_AFFILIATION);
        assert_eq!(canonical_party(" - "), NO_AFFILIATION);
        assert_eq!(canonical_party("無所属（推薦）"), NO_AFFILIATION);
        assert_eq!(canonical_party(" 公明党 "), "公明党");
        assert_eq!(canonical_party(&canonical_party("-")), NO_AFFILIATION);
    }

    #[test]
    fn founding_dates() {
        let f = PartyFoundations::default();
        assert_eq!(f.len(), 11);
        let founded = NaiveDate::from_ymd_opt(2017, 10, 3).unwrap();
        assert_eq!(f.founded("立憲民主党"), Some(founded));
        assert!(f.predates("立憲民主党", founded.pred_opt().unwrap()));
        assert!(!f.predates("立憲民主党", founded));
        assert!(!f.predates("unknown party", founded));
        assert!(!PartyFoundations::empty().predates("立憲民主党", founded.pred_opt().unwrap()));
    }
}
