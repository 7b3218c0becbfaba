// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;

use crate::parties::PartyFoundations;

/// One row of the election summary table, after normalisation.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ElectionRecord {
    pub election_name: String,
    pub notice_date: Option<NaiveDate>,
    pub election_day: Option<NaiveDate>,
    pub seats: Option<i64>,
    pub candidate_count: Option<i64>,
    pub registered_voters: Option<i64>,
    pub note: String,
}

/// One candidate in one election, after normalisation.
///
/// The party is expected to be already canonical (see [`crate::canonical_party`]).
/// `source_key` identifies the municipality and the kind of election, and
/// `election_date` is absent when neither the source file nor the election
/// summary could provide one.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CandidateRecord {
    pub candidate_id: String,
    pub name: String,
    pub kana: String,
    pub age: Option<i64>,
    pub gender: String,
    pub incumbent_status: String,
    pub profession: String,
    pub party: String,
    pub votes: Option<i64>,
    pub outcome: String,
    pub image_file: String,
    pub source_file: String,
    pub source_key: String,
    pub source_date_code: Option<String>,
    pub election_date: Option<NaiveDate>,
}

/// The calendar months in which a bonus is paid on top of the monthly compensation.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum BonusMonth {
    March,
    June,
    December,
}

impl BonusMonth {
    pub const ALL: [BonusMonth; 3] = [BonusMonth::March, BonusMonth::June, BonusMonth::December];

    /// The calendar month number (1-based).
    pub fn month(&self) -> u32 {
        match self {
            BonusMonth::March => 3,
            BonusMonth::June => 6,
            BonusMonth::December => 12,
        }
    }

    pub fn from_month(month: u32) -> Option<BonusMonth> {
        match month {
            3 => Some(BonusMonth::March),
            6 => Some(BonusMonth::June),
            12 => Some(BonusMonth::December),
            _ => None,
        }
    }
}

/// A value attached to each bonus month: rates, amounts or occurrence counts.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct PerBonusMonth<T> {
    pub march: T,
    pub june: T,
    pub december: T,
}

impl<T: Copy> PerBonusMonth<T> {
    pub fn get(&self, month: BonusMonth) -> T {
        match month {
            BonusMonth::March => self.march,
            BonusMonth::June => self.june,
            BonusMonth::December => self.december,
        }
    }

    pub fn get_mut(&mut self, month: BonusMonth) -> &mut T {
        match month {
            BonusMonth::March => &mut self.march,
            BonusMonth::June => &mut self.june,
            BonusMonth::December => &mut self.december,
        }
    }
}

/// Bonus rates in percent of the monthly compensation (200.0 means twice the monthly amount).
pub type BonusRates = PerBonusMonth<f64>;

/// Number of times each bonus month occurs in a span.
pub type BonusCounts = PerBonusMonth<u32>;

/// The compensation paid to one seat holder of a municipal assembly.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct CompensationRate {
    pub monthly: f64,
    pub bonus_rates: BonusRates,
}

/// The compensation reference, keyed by (prefecture, municipality).
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CompensationTable {
    entries: BTreeMap<(String, String), CompensationRate>,
}

impl CompensationTable {
    pub fn new() -> CompensationTable {
        CompensationTable::default()
    }

    /// Registers the rate of a municipality. The first entry for a key wins: returns false
    /// if the key was already present.
    pub fn insert(&mut self, prefecture: &str, municipality: &str, rate: CompensationRate) -> bool {
        let key = (prefecture.to_string(), municipality.to_string());
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, rate);
        true
    }

    pub fn get(&self, prefecture: &str, municipality: &str) -> Option<&CompensationRate> {
        self.entries
            .get(&(prefecture.to_string(), municipality.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ******** Errors *********

/// Errors that prevent the datasets from being built.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DashboardErrors {
    /// The term length must be between one year and [`MAX_TERM_YEARS`].
    InvalidTermLength(u32),
    /// At least one party must be kept in the chart series.
    InvalidTopParties,
    /// A candidate was added without a municipality key.
    MissingMunicipality(String),
}

impl Error for DashboardErrors {}

impl Display for DashboardErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardErrors::InvalidTermLength(years) => {
                write!(f, "invalid term length: {} years", years)
            }
            DashboardErrors::InvalidTopParties => {
                write!(f, "the number of charted parties must be positive")
            }
            DashboardErrors::MissingMunicipality(candidate) => {
                write!(f, "candidate {:?} has no municipality key", candidate)
            }
        }
    }
}

// ********* Configuration **********

/// Length of a legislative term for municipal assemblies and mayors.
pub const DEFAULT_TERM_YEARS: u32 = 4;
/// Longest accepted term length.
pub const MAX_TERM_YEARS: u32 = 100;
/// Number of parties plotted as series in the seat timeline.
pub const DEFAULT_TOP_PARTIES: usize = 8;
/// Number of parties kept in the win-rate dataset.
pub const DEFAULT_WIN_RATE_PARTIES: usize = 12;

/// The rules that govern how the datasets are derived.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DashboardRules {
    pub term_years: u32,
    pub top_parties: usize,
    /// 0 keeps every party.
    pub max_win_rate_parties: usize,
    /// Seat changes dated after this day are not part of the current view.
    pub today: NaiveDate,
    pub party_foundations: PartyFoundations,
}

impl DashboardRules {
    /// The default rules, evaluated as of the given day.
    pub fn as_of(today: NaiveDate) -> DashboardRules {
        DashboardRules {
            term_years: DEFAULT_TERM_YEARS,
            top_parties: DEFAULT_TOP_PARTIES,
            max_win_rate_parties: DEFAULT_WIN_RATE_PARTIES,
            today,
            party_foundations: PartyFoundations::default(),
        }
    }

    pub fn validate(&self) -> Result<(), DashboardErrors> {
        if self.term_years == 0 || self.term_years > MAX_TERM_YEARS {
            return Err(DashboardErrors::InvalidTermLength(self.term_years));
        }
        if self.top_parties == 0 {
            return Err(DashboardErrors::InvalidTopParties);
        }
        Ok(())
    }
}
