use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::StorageConfig;
use crate::models::record::RECORD_COLUMNS;
use crate::models::{Block, PuzzleRecord};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistenceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn escape_csv_field(value: &str) -> String {
    // Prevent formula injection by prefixing dangerous characters with tab
    let sanitized = if value.starts_with(['=', '+', '@', '-', '\t', '\r', '\n']) {
        format!("\t{}", value)
    } else {
        value.to_string()
    };

    // Escape quotes and wrap in quotes if contains special characters
    if sanitized.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", sanitized.replace('"', "\"\""))
    } else {
        sanitized
    }
}

fn render_row<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = cells
        .into_iter()
        .map(|cell| escape_csv_field(cell.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Appends block results to per-block CSV files.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    data_dir: PathBuf,
    block_a_file: String,
    block_b_file: String,
}

impl ResultWriter {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            data_dir: PathBuf::from(&config.data_dir),
            block_a_file: config.block_a_file.clone(),
            block_b_file: config.block_b_file.clone(),
        }
    }

    pub fn destination(&self, block: Block) -> PathBuf {
        match block {
            Block::A => self.data_dir.join(&self.block_a_file),
            Block::B => self.data_dir.join(&self.block_b_file),
        }
    }

    pub async fn flush_block(
        &self,
        block: Block,
        records: &[PuzzleRecord],
    ) -> Result<PathBuf, PersistenceError> {
        let destination = self.destination(block);
        flush(records, &destination).await?;
        Ok(destination)
    }
}

/// Writes `records` to `destination` in one append. The header goes in when
/// the file is new or still empty.
pub async fn flush(records: &[PuzzleRecord], destination: &Path) -> Result<(), PersistenceError> {
    if records.is_empty() {
        return Ok(());
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistenceError::io(parent, e))?;
    }

    let rows: String = records.iter().map(|r| render_row(r.columns())).collect();
    let with_header = || format!("{}{}", render_row(RECORD_COLUMNS), rows);

    let (mut file, payload) = match OpenOptions::new()
        .append(true)
        .create_new(true)
        .open(destination)
        .await
    {
        Ok(file) => (file, with_header()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let file = OpenOptions::new()
                .append(true)
                .open(destination)
                .await
                .map_err(|e| PersistenceError::io(destination, e))?;
            // An earlier flush may have created the file and failed before writing.
            let empty = file
                .metadata()
                .await
                .map_err(|e| PersistenceError::io(destination, e))?
                .len()
                == 0;
            if empty {
                (file, with_header())
            } else {
                (file, rows.clone())
            }
        }
        Err(e) => return Err(PersistenceError::io(destination, e)),
    };

    file.write_all(payload.as_bytes())
        .await
        .map_err(|e| PersistenceError::io(destination, e))?;
    file.sync_all()
        .await
        .map_err(|e| PersistenceError::io(destination, e))?;

    tracing::info!(
        "Flushed {} records to {}",
        records.len(),
        destination.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgeBracket, AttemptOutcome, Gender, ParticipantInfo, SurveyResponse, Tone,
    };
    use uuid::Uuid;

    fn record(answer: &str, guesses: &[&str]) -> PuzzleRecord {
        PuzzleRecord {
            participant: ParticipantInfo::new("12", AgeBracket::From25To34, Gender::NonBinary),
            block: Block::A,
            tone: Tone::Enthusiastic,
            answer: answer.into(),
            outcome: AttemptOutcome::Solved,
            guesses: guesses.iter().map(|g| g.to_string()).collect(),
            hint_timestamps: vec![],
            elapsed_seconds: 4.2,
            survey: SurveyResponse::from_answers(&[3; 8]).unwrap(),
        }
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("results-{}", Uuid::new_v4()))
            .join("block.csv")
    }

    #[test]
    fn escaping_quotes_and_formulas() {
        assert_eq!(escape_csv_field("plain"), "plain");
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv_field("=SUM(A1)"), "\t=SUM(A1)");
    }

    #[tokio::test]
    async fn header_is_written_once_across_flushes() {
        let path = temp_path();
        flush(&[record("CRANE", &["APPLE", "CRANE"])], &path)
            .await
            .unwrap();
        flush(&[record("LEMON", &["LEMON"])], &path).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ParticipantID,Age,Gender,Tone,TargetAnswer,Solved"));
        assert!(lines[0].ends_with("Survey_Q8"));
        assert!(lines[1].contains("CRANE,True,2,4.20,APPLE;CRANE,0,,3,3"));
        assert!(lines[2].contains("LEMON"));
        assert_eq!(
            contents.matches("ParticipantID").count(),
            1,
            "header must appear exactly once"
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn empty_leftover_file_still_gets_header() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"").unwrap();

        flush(&[record("CRANE", &["CRANE"])], &path).await.unwrap();
        flush(&[record("LEMON", &["LEMON"])], &path).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ParticipantID,"));
        assert!(lines[1].contains("CRANE,True,1,"));
        assert_eq!(contents.matches("ParticipantID").count(), 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn empty_batch_creates_nothing() {
        let path = temp_path();
        flush(&[], &path).await.unwrap();
        assert!(!path.exists());
    }
}
