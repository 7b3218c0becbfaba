// Reading and writing the JSON documents, compressed when the file name ends in .gz.

use std::fs::{self, File};
use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::pipeline::io_common::is_gzip;
use crate::pipeline::*;

pub fn read_json(path: &Path) -> BPipelineResult<JSValue> {
    let p = path.display().to_string();
    ensure!(path.exists(), MissingInputSnafu { path: p.clone() });
    let file = File::open(path).context(OpeningJsonSnafu { path: p.clone() })?;
    let mut contents = String::new();
    if is_gzip(path) {
        GzDecoder::new(file)
            .read_to_string(&mut contents)
            .context(OpeningJsonSnafu { path: p.clone() })?;
    } else {
        let mut file = file;
        file.read_to_string(&mut contents)
            .context(OpeningJsonSnafu { path: p.clone() })?;
    }
    let js: JSValue =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: p })?;
    Ok(js)
}

pub fn write_bytes(path: &Path, data: &[u8]) -> BPipelineResult<()> {
    let p = path.display().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(WritingOutputSnafu { path: p.clone() })?;
    }
    let file = File::create(path).context(WritingOutputSnafu { path: p.clone() })?;
    if is_gzip(path) {
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(data)
            .context(WritingOutputSnafu { path: p.clone() })?;
        enc.finish().context(WritingOutputSnafu { path: p.clone() })?;
    } else {
        let mut file = file;
        file.write_all(data)
            .context(WritingOutputSnafu { path: p.clone() })?;
    }
    debug!("write_bytes: {}: {} bytes", p, data.len());
    Ok(())
}

/// Writes the document as compact UTF-8 JSON.
pub fn write_json(path: &Path, js: &JSValue) -> BPipelineResult<()> {
    let p = path.display().to_string();
    let data = serde_json::to_vec(js).context(SerializingJsonSnafu { path: p })?;
    write_bytes(path, &data)
}

/// Creates the output directory and removes the uncompressed copies of the compressed outputs
/// that earlier runs may have left.
pub fn remove_stale_outputs(directory: &Path, names: &[&str]) -> BPipelineResult<()> {
    let p = directory.display().to_string();
    fs::create_dir_all(directory).context(WritingOutputSnafu { path: p })?;
    for name in names.iter() {
        if let Some(plain) = name.strip_suffix(".gz") {
            let stale = directory.join(plain);
            if stale.is_file() {
                info!("remove_stale_outputs: removing {}", stale.display());
                fs::remove_file(&stale).context(WritingOutputSnafu {
                    path: stale.display().to_string(),
                })?;
            }
        }
    }
    Ok(())
}
