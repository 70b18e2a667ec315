//! JSON-lines progress store.

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use specter_defence_core::ProgressSnapshot;
use specter_defence_scheduler::{ProgressStore, StoreError};

/// Appends one JSON object per saved snapshot.
#[derive(Debug)]
pub(crate) struct JsonLinesStore {
    writer: BufWriter<File>,
}

impl JsonLinesStore {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open progress file {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl ProgressStore for JsonLinesStore {
    fn save(&mut self, progress: &ProgressSnapshot) -> Result<(), StoreError> {
        serde_json::to_writer(&mut self.writer, progress).map_err(StoreError::new)?;
        self.writer.write_all(b"\n").map_err(StoreError::new)?;
        self.writer.flush().map_err(StoreError::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specter_defence_core::{GuardianClass, SpecterKind};
    use std::fs;

    #[test]
    fn each_save_appends_one_line() {
        let path = std::env::temp_dir().join(format!(
            "specter-defence-progress-{}.jsonl",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        let mut store = JsonLinesStore::open(&path).expect("store opens");
        let progress = ProgressSnapshot {
            currency: 120,
            stage: 3,
            unlocked_classes: vec![GuardianClass::SUMMONED],
            encountered: vec![SpecterKind::Wisp],
        };

        store.save(&progress).expect("first save");
        store.save(&progress).expect("second save");

        let contents = fs::read_to_string(&path).expect("file readable");
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: ProgressSnapshot = serde_json::from_str(lines[1]).expect("line parses");
        assert_eq!(parsed, progress);
        let _ = fs::remove_file(&path);
    }
}
