use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct ReadOutcome<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct CommentStore {
    data_dir: PathBuf,
}

impl CommentStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn raw_path(&self, resource_id: &str) -> PathBuf {
        let safe: String = resource_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.data_dir.join(format!("{}_raw.jsonl", safe))
    }

    pub fn derived_path(input: &Path, suffix: &str) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        input.with_file_name(format!("{}{}.jsonl", stem, suffix))
    }

    pub fn read_records<T: DeserializeOwned>(&self, path: &Path) -> Result<ReadOutcome<T>> {
        let file = open_existing(path)?;
        let mut records = Vec::new();
        let mut skipped = 0;

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::debug!("Skipping malformed record at {}:{}: {}", path.display(), index + 1, e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::info!("Skipped {} malformed record(s) in {}", skipped, path.display());
        }

        Ok(ReadOutcome { records, skipped })
    }

    pub fn read_records_strict<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        let file = open_existing(path)?;
        let mut records = Vec::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| Error::MalformedRecord {
                line: index + 1,
                reason: e.to_string(),
            })?;
            records.push(record);
        }

        Ok(records)
    }

    // Records go to a temp file in the target directory that is renamed
    // over `path`, so readers never see a partial generation.
    pub fn write_records<T: Serialize>(&self, path: &Path, records: &[T]) -> Result<usize> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(&mut tmp);
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote {} record(s) to {}", records.len(), path.display());
        Ok(records.len())
    }
}

fn open_existing(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound(path.display().to_string()),
        _ => Error::Io(e),
    })
}
