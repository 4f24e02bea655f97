use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Append-only text file of QIDs already exported, one per line.
pub struct QidStore {
    path: PathBuf,
}

impl QidStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing file is an empty store.
    pub fn load(&self) -> Result<HashSet<String>, AppError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No QID store at {}, starting fresh", self.path.display());
                return Ok(HashSet::new());
            }
            Err(e) => return Err(e.into()),
        };

        let qids: HashSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        tracing::info!("Loaded {} collected QIDs from {}", qids.len(), self.path.display());
        Ok(qids)
    }

    pub fn save(&self, new_qids: &[String]) -> Result<(), AppError> {
        if new_qids.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let needs_newline = ends_mid_line(&self.path)?;
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        if needs_newline {
            writeln!(writer)?;
        }
        for qid in new_qids {
            writeln!(writer, "{}", qid)?;
        }
        writer.flush()?;

        tracing::info!("Appended {} QIDs to {}", new_qids.len(), self.path.display());
        Ok(())
    }
}

/// True when the file exists and its last byte is not a line break.
fn ends_mid_line(path: &Path) -> io::Result<bool> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
