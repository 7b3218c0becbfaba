use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::pipeline::io_common::compensation_table;
use crate::pipeline::*;

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Empty => "".to_string(),
        other => {
            debug!("cell_text: unexpected cell {:?}", other);
            other.to_string()
        }
    }
}

/// Reads the compensation reference from the first worksheet of a workbook. The first row is
/// the header.
pub fn read_compensation_excel(
    path: &Path,
    columns: &ColumnLayout,
) -> BPipelineResult<CompensationTable> {
    let p = path.display().to_string();
    ensure!(path.exists(), MissingInputSnafu { path: p.clone() });
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path: p.clone() })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu { path: p.clone() })?
        .context(OpeningExcelSnafu { path: p.clone() })?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu { path: p.clone() })?;
    debug!("read_compensation_excel: header: {:?}", header);

    let rows: Vec<Vec<String>> = iter
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    debug!("read_compensation_excel: {} rows in {}", rows.len(), p);
    Ok(compensation_table(&rows, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn cells() {
        assert_eq!(cell_text(&DataType::String("新宿区".to_string())), "新宿区");
        assert_eq!(cell_text(&DataType::Float(167.5)), "167.5");
        assert_eq!(cell_text(&DataType::Int(600000)), "600000");
        assert_eq!(cell_text(&DataType::Empty), "");
    }

    #[test]
    fn missing_workbook() {
        let dir = tempdir().unwrap();
        let err = read_compensation_excel(&dir.path().join("pay.xlsx"), &ColumnLayout::default())
            .unwrap_err();
        assert!(matches!(*err, PipelineError::MissingInput { .. }));
    }

    #[test]
    fn not_a_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pay.xlsx");
        fs::write(&path, "prefecture,municipality\n").unwrap();
        let err = read_compensation_excel(&path, &ColumnLayout::default()).unwrap_err();
        assert!(matches!(*err, PipelineError::OpeningExcel { .. }));
    }
}
