// Primitives for reading CSV files, compressed or not.

use std::fs::File;
use std::io::Read;

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;

use crate::pipeline::io_common::*;
use crate::pipeline::*;

fn open_input(path: &Path) -> BPipelineResult<Box<dyn Read>> {
    let p = path.display().to_string();
    ensure!(path.exists(), MissingInputSnafu { path: p.clone() });
    let file = File::open(path).context(OpeningFileSnafu { path: p })?;
    if is_gzip(path) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn get_reader(path: &Path) -> BPipelineResult<csv::Reader<Box<dyn Read>>> {
    let input = open_input(path)?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input))
}

// Rows are matched to the fields by the names in the header.
fn read_rows<T: DeserializeOwned>(path: &Path) -> BPipelineResult<Vec<T>> {
    let p = path.display().to_string();
    let mut rdr = get_reader(path)?;
    let headers = rdr
        .headers()
        .context(CsvHeaderSnafu { path: p.clone() })?
        .clone();
    debug!("read_rows: {}: header: {:?}", p, headers);
    let mut res: Vec<T> = Vec::new();
    for (idx, line_r) in rdr.deserialize::<T>().enumerate() {
        // The header is on line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path: p.clone(),
            lineno,
        })?;
        res.push(line);
    }
    Ok(res)
}

pub fn read_election_summary(path: &Path) -> BPipelineResult<Vec<ElectionRecord>> {
    let raws: Vec<RawElection> = read_rows(path)?;
    let res: Vec<ElectionRecord> = raws.iter().map(normalize_election).collect();
    info!(
        "read_election_summary: {} elections in {}",
        res.len(),
        path.display()
    );
    Ok(res)
}

pub fn read_candidate_details(
    path: &Path,
    index: &SummaryIndex,
) -> BPipelineResult<Vec<CandidateRecord>> {
    let raws: Vec<RawCandidate> = read_rows(path)?;
    let res: Vec<CandidateRecord> = raws
        .iter()
        .map(|raw| normalize_candidate(raw, index))
        .collect();
    let undated = res.iter().filter(|c| c.election_date.is_none()).count();
    if undated > 0 {
        debug!(
            "read_candidate_details: {} candidates without election date",
            undated
        );
    }
    info!(
        "read_candidate_details: {} candidates in {}",
        res.len(),
        path.display()
    );
    Ok(res)
}

pub fn read_compensation_csv(
    path: &Path,
    columns: &ColumnLayout,
) -> BPipelineResult<CompensationTable> {
    let p = path.display().to_string();
    let mut rdr = get_reader(path)?;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let line = line_r.context(CsvLineParseSnafu {
            path: p.clone(),
            lineno: idx + 2,
        })?;
        rows.push(line.iter().map(|s| s.to_string()).collect());
    }
    debug!("read_compensation_csv: {} rows in {}", rows.len(), p);
    Ok(compensation_table(&rows, columns))
}
