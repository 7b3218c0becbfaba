/*!

This is the long-form manual for `council_seats` and `councildash`.

## Input files

`councildash` reads three files. By default it looks for them in the `data` directory
(see the `--data-dir` option), under the names given below.

### `election_summary.csv`

One row per election, with the headers:

```text
election_name,notice_date,election_day,seats,candidate_count,registered_voters,note
東京都新宿区議会議員選挙,2019-04-14,2019-04-21,38,55,"280,000",
```

Dates may be written `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD` or `YYYY年MM月DD日`. Numbers may
contain thousands separators. Missing values are allowed. This file only serves to date the
candidates whose source file does not carry a date.

### `candidate_details.csv.gz`

One row per candidate, with the headers:

```text
candidate_id,name,kana,age,gender,incumbent_status,profession,party,votes,outcome,image_file,source_file
```

The file may be compressed (when its name ends in `.gz`) or not.

- `source_file` identifies the election, for example `東京都新宿区議会議員選挙_20190421.html`. The
  part before the last `_` is the municipality key, the 8 digits after it the election day.
  When the date is missing, the most recent election of the same name in the election summary
  is used. Candidates without any date are ignored.
- `outcome` marks a winner when it contains `当選`, `当せん` or `再選` (which covers
  `補欠当選`, `繰上当選` and the like).
- `party`: empty values, `-` and anything containing `無所属` are counted as independents
  (`無所属`).

### `SeatsAndCompensation.csv`

The compensation reference, in CSV or Excel (`.xlsx`, first worksheet) format. The first row is
a header. The following rows give, per municipality, the prefecture, the municipality name, the
monthly compensation of a council member and the bonus rates paid in March, June and December
(in percent of the monthly amount). The default 0-based column indices are 1, 2, 11, 12, 13 and
14. They can be changed in the configuration file.

Municipalities that are not in the reference get no compensation.

## Configuration

`councildash` comes with sensible defaults. A configuration file in JSON can change the inputs,
the outputs and the rules. All the fields are optional. Relative paths are relative to the
directory of the configuration file.

```json
{
  "inputs": {
    "electionSummary": "data/election_summary.csv",
    "candidateDetails": "data/candidate_details.csv.gz",
    "compensationReference": "data/SeatsAndCompensation.xlsx",
    "compensationColumns": {
      "prefecture": 1, "municipality": 2, "monthly": "L",
      "bonusMarch": 12, "bonusJune": 13, "bonusDecember": 14
    }
  },
  "output": { "directory": "public/data", "reference": "expected/top_dashboard.json" },
  "rules": { "termYears": 4, "topParties": 8, "maxWinRateParties": 12, "today": "2025-01-01" },
  "partyFoundations": [ { "name": "参政党", "founded": "2020-04-11" } ]
}
```

- `compensationColumns`: numbers (or strings of digits) are 0-based indices. Letters follow the
  spreadsheet convention (`A` is the first column).
- `termYears`: the length of a term. A term ends earlier if another election of the same
  municipality happens before.
- `topParties`: the number of parties plotted in the seat timeline.
- `maxWinRateParties`: the number of parties kept in the win-rate dataset, 0 for all.
- `today`: seat changes after this day are left out of the timeline.
- `partyFoundations`: when present, replaces the built-in list of founding dates. Seats won by
  a party before its founding date are ignored.

The command line options take precedence over the configuration file.

## Outputs

The datasets are written as compact JSON, compressed with gzip:

- `election_summary.json.gz`, `candidate_details.json.gz`: the cleaned input records
- `top_dashboard.json.gz`: the seat timeline of each party
- `compensation.json.gz`: the compensation received by each party, by year and by municipality
- `win_rate.json.gz`: the share of winners among the candidates of each party, by month and by
  election
- `vote_optimization.json.gz`: for each election, how many seats each party could have won with
  its votes, given the smallest winning score

Calendar days are written `YYYY-MM-DD`, except the `min_date`/`max_date` bounds and the
win-rate `events` dates, which are midnight timestamps such as `2019-04-21T00:00:00`.

Uncompressed copies of these files left by earlier runs are removed.

With `--reference`, the computed `top_dashboard` dataset is compared with a reference file (the
`generated_at` field is ignored). The differences are printed and the program fails if there
are any.

 */
