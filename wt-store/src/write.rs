use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::record::WeightRecord;
use crate::result::{FormatError, ToWeightResult, WeightResult};

/// Write `records` as a container to the file at `path`, replacing it if it exists.
pub fn save_weights<'r>(path: impl AsRef<Path>, records: impl IntoIterator<Item = &'r WeightRecord>) -> WeightResult<()> {
    let path = path.as_ref();
    let file = File::create(path).to_weight_result(path)?;
    let mut writer = BufWriter::new(file);
    write_records(&mut writer, records, path)?;
    writer.flush().to_weight_result(path)
}

/// Write `records` as a container, in order.
///
/// There must be at least one record, and names must be unique, nonempty and free of whitespace.
pub fn write_weights<'r>(writer: &mut impl Write, records: impl IntoIterator<Item = &'r WeightRecord>) -> WeightResult<()> {
    write_records(writer, records, &PathBuf::from("<writer>"))
}

fn write_records<'r>(
    writer: &mut impl Write,
    records: impl IntoIterator<Item = &'r WeightRecord>,
    path: &Path,
) -> WeightResult<()> {
    let records = records.into_iter().collect_vec();
    if records.is_empty() {
        return Err(FormatError::InvalidCount("0".to_owned()).into());
    }

    let mut seen = HashSet::new();
    for record in &records {
        let name = record.name();
        if name.is_empty() || name.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(FormatError::InvalidToken("name", name.to_owned()).into());
        }
        if record.element_count() == 0 {
            return Err(FormatError::EmptyRecord(name.to_owned()).into());
        }
        if !seen.insert(name) {
            return Err(FormatError::DuplicateName(name.to_owned()).into());
        }
    }

    let count = records.len();
    writeln!(writer, "{}", count).to_weight_result(path)?;
    for record in records {
        write!(
            writer,
            "{} {} ({}) ",
            record.name(),
            record.tag(),
            record.shape().iter().join(",")
        )
        .to_weight_result(path)?;
        writer.write_all(record.bytes()).to_weight_result(path)?;
        writer.write_all(b"\n").to_weight_result(path)?;
    }

    log::debug!("Wrote {} records to {}", count, path.display());
    Ok(())
}
