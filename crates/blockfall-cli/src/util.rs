use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::Path,
};

use anyhow::Context;
use blockfall_engine::SessionSnapshot;

/// Reads and decodes a save record.
pub fn read_save_file<P>(path: P) -> anyhow::Result<SessionSnapshot>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open save file: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let snapshot = SessionSnapshot::read_from(&mut reader)
        .with_context(|| format!("Failed to decode save file: {}", path.display()))?;
    Ok(snapshot)
}

/// Encodes `snapshot` into a save record, replacing any existing file.
pub fn write_save_file<P>(path: P, snapshot: &SessionSnapshot) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create save file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    snapshot
        .write_to(&mut writer)
        .with_context(|| format!("Failed to write save file: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush save file: {}", path.display()))?;
    Ok(())
}
