use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Write all rows as JSONL, truncating `path`. Returns the row count.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> io::Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut out = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(rows.len())
}

/// Append one row to a JSONL file, creating it if needed
pub fn append_jsonl<T: Serialize>(path: &Path, row: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(row)?;
    writeln!(file, "{}", json)?;
    Ok(())
}

/// Parse every non-blank line independently. A line that fails to parse
/// yields `Err(message)` in its slot; only I/O errors abort.
pub fn read_jsonl_rows<T: DeserializeOwned>(path: &Path) -> io::Result<Vec<Result<T, String>>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line).map_err(|e| e.to_string()));
    }

    Ok(rows)
}

/// Strict variant for training data: the first bad line fails the read
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> io::Result<Vec<T>> {
    read_jsonl_rows(path)?
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("row {}: {}", i, e)))
        })
        .collect()
}
