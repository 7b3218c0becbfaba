use chrono::NaiveDate;
use council_seats::builder::Builder;
use council_seats::terms::terms_by_municipality;
use council_seats::timeline::seat_changes;
use council_seats::*;

const SHINJUKU: &str = "東京都新宿区議会議員選挙";
const NAKANO: &str = "東京都中野区議会議員選挙";

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn builder(today: NaiveDate) -> Builder {
    Builder::new(&DashboardRules::as_of(today)).unwrap()
}

fn add_winners(b: &mut Builder, key: &str, date: NaiveDate, party: &str, count: u32) {
    for _ in 0..count {
        b.add_candidate_simple(key, date, party, "当選").unwrap();
    }
}

fn shinjuku_rate(monthly: f64, bonus_rates: BonusRates) -> CompensationTable {
    let mut table = CompensationTable::new();
    table.insert(
        "東京都",
        "新宿区",
        CompensationRate {
            monthly,
            bonus_rates,
        },
    );
    table
}

#[test]
fn consecutive_terms_leave_no_gap() {
    init();
    let mut b = builder(d(2020, 1, 1));
    add_winners(&mut b, SHINJUKU, d(2011, 4, 24), "P", 3);
    add_winners(&mut b, SHINJUKU, d(2017, 4, 23), "P", 3);
    let data = b.build().unwrap();

    assert_eq!(data.terms.len(), 2);
    // The second election comes after the default length, but still closes the first term.
    assert_eq!(data.terms[0].start_date, d(2011, 4, 24));
    assert_eq!(data.terms[0].end_date, d(2017, 4, 23));
    assert_eq!(data.terms[1].start_date, d(2017, 4, 23));
    assert_eq!(data.terms[1].end_date, d(2021, 4, 23));

    // The hand-over nets to zero: P keeps its 3 seats without interruption.
    assert_eq!(data.timeline.date_labels, vec!["2011-04-24"]);
    assert_eq!(data.timeline.history.get("P"), Some(&vec![Some(3)]));
    assert_eq!(data.timeline.totals.get("P"), Some(&3));
}

#[test]
fn expired_term_drops_to_zero() {
    init();
    let mut b = builder(d(2020, 4, 26));
    add_winners(&mut b, SHINJUKU, d(2015, 4, 26), "Q", 2);
    let data = b.build().unwrap();

    assert_eq!(data.timeline.date_labels, vec!["2015-04-26", "2019-04-26"]);
    assert_eq!(data.timeline.history.get("Q"), Some(&vec![Some(2), Some(0)]));
    assert!(data.timeline.parties.is_empty());
    assert!(data.timeline.series.is_empty());
    assert_eq!(data.summary.total_seats, 0);
    assert_eq!(data.summary.party_count, 0);
}

#[test]
fn june_bonus_is_paid_once() {
    init();
    let rates = BonusRates {
        march: 0.0,
        june: 200.0,
        december: 0.0,
    };
    let mut b = builder(d(2021, 1, 1)).compensation(shinjuku_rate(400000.0, rates));
    add_winners(&mut b, SHINJUKU, d(2019, 4, 21), "P", 1);
    add_winners(&mut b, SHINJUKU, d(2020, 4, 19), "P", 1);
    let data = b.build().unwrap();

    let first = data
        .compensation
        .terms
        .iter()
        .find(|t| t.start_date == d(2019, 4, 21))
        .unwrap();
    // April 2019 to March 2020.
    assert_eq!(first.months_in_term, 12);
    assert_eq!(first.bonus_counts.june, 1);
    assert_eq!(first.per_seat_compensation, 400000.0 * 12.0 + 2.0 * 400000.0);
    assert_eq!(first.total_compensation, first.per_seat_compensation);
}

#[test]
fn expirations_are_applied_before_elections() {
    init();
    let mut b = builder(d(2030, 1, 1));
    // Expires on 2019-04-26, the day the other municipality votes.
    add_winners(&mut b, NAKANO, d(2015, 4, 26), "P", 2);
    add_winners(&mut b, SHINJUKU, d(2019, 4, 26), "P", 3);
    let data = b.build().unwrap();

    let changes = seat_changes(&data.terms, &PartyFoundations::default());
    let dates: Vec<NaiveDate> = changes.iter().map(|c| c.date).collect();
    assert_eq!(dates, vec![d(2015, 4, 26), d(2019, 4, 26), d(2023, 4, 26)]);
    assert_eq!(changes[1].deltas.get("P"), Some(&1.0));

    // Never 5 seats at once.
    assert_eq!(
        data.timeline.history.get("P"),
        Some(&vec![Some(2), Some(3), Some(0)])
    );
}

#[test]
fn building_twice_gives_the_same_result() {
    init();
    let mut b = builder(d(2021, 1, 1)).compensation(shinjuku_rate(500000.0, BonusRates::default()));
    add_winners(&mut b, SHINJUKU, d(2019, 4, 21), "自由民主党", 2);
    add_winners(&mut b, NAKANO, d(2019, 4, 21), "公明党", 1);
    b.add_candidate_simple(SHINJUKU, d(2019, 4, 21), "", "落選")
        .unwrap();
    assert_eq!(b.build().unwrap(), b.build().unwrap());
}

#[test]
fn terms_never_overlap() {
    init();
    let mut b = builder(d(2021, 1, 1));
    for (year, month, day) in [(2011, 4, 24), (2013, 7, 1), (2015, 4, 26), (2019, 4, 21)] {
        add_winners(&mut b, SHINJUKU, d(year, month, day), "P", 1);
    }
    add_winners(&mut b, NAKANO, d(2015, 4, 26), "P", 1);
    let data = b.build().unwrap();

    for (_, terms) in terms_by_municipality(&data.terms) {
        for t in terms.iter() {
            assert!(t.start_date < t.end_date);
        }
        for pair in terms.windows(2) {
            assert!(pair[0].end_date <= pair[1].start_date);
        }
    }
}

#[test]
fn seats_before_founding_are_ignored() {
    init();
    let mut b = builder(d(2016, 1, 1)).compensation(shinjuku_rate(500000.0, BonusRates::default()));
    // Founded in 2017.
    add_winners(&mut b, SHINJUKU, d(2015, 4, 26), "立憲民主党", 2);
    add_winners(&mut b, SHINJUKU, d(2015, 4, 26), "P", 1);
    let data = b.build().unwrap();

    assert_eq!(data.timeline.parties, vec!["P"]);
    assert!(!data.timeline.history.contains_key("立憲民主党"));
    assert!(data
        .compensation
        .terms
        .iter()
        .all(|t| t.party != "立憲民主党"));
    assert_eq!(data.compensation.party_summary.len(), 1);
}

#[test]
fn compensation_within_a_year_is_conserved() {
    init();
    let rates = BonusRates {
        march: 0.0,
        june: 167.5,
        december: 172.5,
    };
    let mut b = builder(d(2021, 1, 1)).compensation(shinjuku_rate(600000.0, rates));
    add_winners(&mut b, SHINJUKU, d(2019, 1, 10), "P", 2);
    add_winners(&mut b, SHINJUKU, d(2019, 11, 10), "P", 2);
    let data = b.build().unwrap();

    let first = data
        .compensation
        .terms
        .iter()
        .find(|t| t.start_date == d(2019, 1, 10))
        .unwrap();
    let rows: Vec<_> = data
        .compensation
        .municipality_breakdown
        .iter()
        .filter(|r| r.term_id == first.term_id)
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].year, 2019);
    assert_eq!(rows[0].months_in_term, first.months_in_term);
    assert!((rows[0].total_compensation - first.total_compensation).abs() < 1e-6);
}

#[test]
fn running_totals_match_the_seats_in_office() {
    init();
    let mut b = builder(d(2030, 1, 1));
    // 立憲民主党 wins once before its founding and once after.
    add_winners(&mut b, SHINJUKU, d(2015, 4, 26), "立憲民主党", 3);
    add_winners(&mut b, SHINJUKU, d(2015, 4, 26), "公明党", 2);
    add_winners(&mut b, SHINJUKU, d(2019, 4, 21), "立憲民主党", 2);
    add_winners(&mut b, SHINJUKU, d(2019, 4, 21), "無所属", 1);
    add_winners(&mut b, NAKANO, d(2013, 6, 2), "公明党", 4);
    add_winners(&mut b, NAKANO, d(2017, 6, 4), "立憲民主党", 1);
    add_winners(&mut b, NAKANO, d(2017, 6, 4), "無所属", 2);
    add_winners(&mut b, NAKANO, d(2019, 4, 21), "公明党", 1);
    let data = b.build().unwrap();

    let foundations = PartyFoundations::default();
    assert!(!data.timeline.history.is_empty());
    for (party, values) in data.timeline.history.iter() {
        assert_eq!(values.len(), data.timeline.label_dates.len());
        for (value, date) in values.iter().zip(data.timeline.label_dates.iter()) {
            if foundations.predates(party, *date) {
                assert_eq!(*value, None, "{} on {}", party, date);
                continue;
            }
            let in_office: u32 = data
                .terms
                .iter()
                .filter(|t| t.contains(*date) && !foundations.predates(party, t.start_date))
                .filter_map(|t| t.seats.get(party))
                .sum();
            assert_eq!(*value, Some(in_office), "{} on {}", party, date);
        }
    }
}
