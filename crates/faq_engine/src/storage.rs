use crate::catalog::{Catalog, FaqRecord};
use crate::error::{DataLoadError, Resource};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Reads one catalog resource: a JSON array of strings.
pub fn read_text_sequence(resource: Resource, path: &Path) -> Result<Vec<String>, DataLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => DataLoadError::Missing {
            resource,
            path: path.to_path_buf(),
        },
        _ => DataLoadError::Unreadable {
            resource,
            path: path.to_path_buf(),
            source,
        },
    })?;

    serde_json::from_str(&contents).map_err(|source| DataLoadError::Malformed {
        resource,
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_text_sequence(path: &Path, items: &[String]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, items).context("serialize text sequence")?;
    writer.write_all(b"\n").context("write newline")?;
    writer.flush().context("flush output")
}

/// Imports a CSV file with a `question,answer,intent,category` header.
pub fn read_csv_catalog(path: &Path) -> Result<Catalog, DataLoadError> {
    let csv_err = |source| DataLoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<FaqRecord>() {
        records.push(row.map_err(csv_err)?);
    }

    Ok(Catalog::from_records(records))
}
