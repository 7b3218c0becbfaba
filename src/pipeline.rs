use log::{debug, info, warn};

use council_seats::*;
use snafu::{prelude::*, Snafu};

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::pipeline::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_json;
mod payloads;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PipelineError {
    #[snafu(display("Input file {path} was not found"))]
    MissingInput { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading the header of {path}"))]
    CsvHeader { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Error reading JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Could not read the column index {value}"))]
    ParsingColumnIndex { value: String },
    #[snafu(display("Invalid date {value:?}: expected YYYY-MM-DD"))]
    InvalidDate { value: String },
    #[snafu(display("Invalid rules"))]
    InvalidRules { source: DashboardErrors },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing {path}"))]
    SerializingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("The dashboard differs from the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
pub type BPipelineResult<T> = Result<T, Box<PipelineError>>;

const DEFAULT_DATA_DIR: &str = "data";
const ELECTION_SUMMARY_FILE: &str = "election_summary.csv";
const CANDIDATE_DETAILS_FILE: &str = "candidate_details.csv.gz";
const COMPENSATION_FILE: &str = "SeatsAndCompensation.csv";

const ELECTION_OUTPUT: &str = "election_summary.json.gz";
const CANDIDATE_OUTPUT: &str = "candidate_details.json.gz";
const COMPENSATION_OUTPUT: &str = "compensation.json.gz";
const TOP_DASHBOARD_OUTPUT: &str = "top_dashboard.json.gz";
const WIN_RATE_OUTPUT: &str = "win_rate.json.gz";
const VOTE_OPTIMIZATION_OUTPUT: &str = "vote_optimization.json.gz";

const ALL_OUTPUTS: [&str; 6] = [
    ELECTION_OUTPUT,
    CANDIDATE_OUTPUT,
    COMPENSATION_OUTPUT,
    TOP_DASHBOARD_OUTPUT,
    WIN_RATE_OUTPUT,
    VOTE_OPTIMIZATION_OUTPUT,
];

/// The inputs, outputs and rules of one run, after merging the command line with the
/// configuration file.
#[derive(PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub election_summary: PathBuf,
    pub candidate_details: PathBuf,
    pub compensation_reference: PathBuf,
    pub columns: ColumnLayout,
    pub output_directory: PathBuf,
    pub reference: Option<PathBuf>,
    pub rules: DashboardRules,
}

// Relative paths in a configuration file are relative to the directory of that file.
fn config_path(
    root: &Path,
    configured: &Option<String>,
    data_dir: &Path,
    default: &str,
) -> PathBuf {
    match configured {
        Some(p) => root.join(p),
        None => data_dir.join(default),
    }
}

fn parse_day(value: &str) -> PipelineResult<NaiveDate> {
    io_common::parse_date(value).context(InvalidDateSnafu { value })
}

pub fn resolve_settings(
    args: &Args,
    config: &DashboardConfig,
    root: &Path,
) -> BPipelineResult<RunSettings> {
    let data_dir: PathBuf = match &args.data_dir {
        Some(d) => PathBuf::from(d),
        None => root.join(DEFAULT_DATA_DIR),
    };

    let today = match args.today.as_ref().or(config.rules.today.as_ref()) {
        Some(t) => parse_day(t)?,
        None => Local::now().date_naive(),
    };
    let mut rules = config.to_rules(today)?;
    if let Some(n) = args.top_parties {
        rules.top_parties = n;
    }
    rules.validate().context(InvalidRulesSnafu {})?;

    let output_directory = match (&args.out, &config.output.directory) {
        (Some(o), _) => PathBuf::from(o),
        (None, Some(o)) => root.join(o),
        (None, None) => data_dir.clone(),
    };
    let reference = match (&args.reference, &config.output.reference) {
        (Some(r), _) => Some(PathBuf::from(r)),
        (None, Some(r)) => Some(root.join(r)),
        (None, None) => None,
    };
    let columns = match &config.inputs.compensation_columns {
        Some(c) => c.layout()?,
        None => ColumnLayout::default(),
    };

    Ok(RunSettings {
        election_summary: config_path(
            root,
            &config.inputs.election_summary,
            &data_dir,
            ELECTION_SUMMARY_FILE,
        ),
        candidate_details: config_path(
            root,
            &config.inputs.candidate_details,
            &data_dir,
            CANDIDATE_DETAILS_FILE,
        ),
        compensation_reference: config_path(
            root,
            &config.inputs.compensation_reference,
            &data_dir,
            COMPENSATION_FILE,
        ),
        columns,
        output_directory,
        reference,
        rules,
    })
}

fn read_compensation(path: &Path, columns: &ColumnLayout) -> BPipelineResult<CompensationTable> {
    let is_excel = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    if is_excel {
        io_excel::read_compensation_excel(path, columns)
    } else {
        io_csv::read_compensation_csv(path, columns)
    }
}

// Returns an error if the dashboard does not match the reference. generated_at is not compared.
fn check_reference(top_dashboard: &JSValue, reference_path: &Path) -> BPipelineResult<()> {
    let mut reference = io_json::read_json(reference_path)?;
    let mut computed = top_dashboard.clone();
    for js in [&mut reference, &mut computed] {
        if let Some(obj) = js.as_object_mut() {
            obj.remove("generated_at");
        }
    }
    let path = reference_path.display().to_string();
    let pretty_reference =
        serde_json::to_string_pretty(&reference).context(SerializingJsonSnafu { path: path.clone() })?;
    let pretty_computed =
        serde_json::to_string_pretty(&computed).context(SerializingJsonSnafu { path: path.clone() })?;
    if pretty_reference != pretty_computed {
        warn!("Found differences with the reference {}", path);
        print_diff(pretty_reference.as_str(), pretty_computed.as_str(), "\n");
        return Err(ReferenceMismatchSnafu { path }.build().into());
    }
    info!("check_reference: the dashboard matches {}", path);
    Ok(())
}

pub fn run_pipeline(args: &Args) -> BPipelineResult<()> {
    let (config, root) = match &args.config {
        Some(p) => {
            let config = read_config(Path::new(p))?;
            let root = Path::new(p)
                .parent()
                .map(|d| d.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (DashboardConfig::default(), PathBuf::new()),
    };
    debug!("run_pipeline: config: {:?}", config);
    let settings = resolve_settings(args, &config, &root)?;
    info!("run_pipeline: settings: {:?}", settings);

    let elections = io_csv::read_election_summary(&settings.election_summary)?;
    let summary_index = io_common::build_summary_index(&elections);
    let candidates = io_csv::read_candidate_details(&settings.candidate_details, &summary_index)?;
    let compensation = read_compensation(&settings.compensation_reference, &settings.columns)?;

    let data = build_dashboard(&candidates, &compensation, &settings.rules)
        .context(InvalidRulesSnafu {})?;

    let generated_at = Utc::now().to_rfc3339();
    let top_dashboard = payloads::top_dashboard(&data, &generated_at);
    let outputs: Vec<(&str, JSValue)> = vec![
        (
            ELECTION_OUTPUT,
            payloads::election_summary(&elections, &generated_at),
        ),
        (
            CANDIDATE_OUTPUT,
            payloads::candidate_details(&candidates, &generated_at),
        ),
        (
            COMPENSATION_OUTPUT,
            payloads::compensation(&data.compensation, &generated_at),
        ),
        (TOP_DASHBOARD_OUTPUT, top_dashboard.clone()),
        (
            WIN_RATE_OUTPUT,
            payloads::win_rate(&data.win_rate, &generated_at),
        ),
        (
            VOTE_OPTIMIZATION_OUTPUT,
            payloads::vote_optimization(&data.vote_efficiency, &generated_at),
        ),
    ];

    io_json::remove_stale_outputs(&settings.output_directory, &ALL_OUTPUTS)?;
    for (name, payload) in outputs.iter() {
        io_json::write_json(&settings.output_directory.join(name), payload)?;
    }
    info!(
        "Generated dashboard data in {}: {}",
        settings.output_directory.display(),
        ALL_OUTPUTS.join(", ")
    );

    if let Some(reference) = &settings.reference {
        check_reference(&top_dashboard, reference)?;
    }
    Ok(())
}
