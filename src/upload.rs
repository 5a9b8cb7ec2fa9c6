use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::error::OpenHoursError;
use crate::generations::ScheduleRecord;

/// Decode a two-column, header-less delimited upload (`name,schedule` per row).
///
/// Any row without exactly two fields rejects the whole upload.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ScheduleRecord>, OpenHoursError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        if row.len() != 2 {
            return Err(OpenHoursError::InvalidRecord(format!(
                "row {}: expected 2 columns (name, schedule), found {}",
                index + 1,
                row.len()
            )));
        }
        records.push(ScheduleRecord::new(&row[0], &row[1]));
    }

    debug!("Decoded {} upload row(s)", records.len());
    Ok(records)
}

pub fn read_records_from_path(path: &Path) -> Result<Vec<ScheduleRecord>, OpenHoursError> {
    let file = File::open(path)?;
    read_records(file)
}
