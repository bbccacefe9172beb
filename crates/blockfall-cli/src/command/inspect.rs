use std::{
    io::{self, Write as _},
    path::PathBuf,
    time::Instant,
};

use anyhow::Context as _;
use blockfall_engine::{GameSession, SessionConfig};

use crate::{DEFAULT_SAVE_FILE, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    /// Save file to decode
    #[clap(default_value = DEFAULT_SAVE_FILE)]
    save_file: PathBuf,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    let InspectArg { save_file } = arg;

    let snapshot = util::read_save_file(save_file)?;
    // Decoding only checks field types; loading also checks that the game is playable.
    let mut session = GameSession::new(SessionConfig::default(), Instant::now());
    if let Err(err) = session.import_state(&snapshot) {
        eprintln!("warning: {} would be rejected on load: {err}", save_file.display());
    }

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &snapshot).context("Failed to write JSON to stdout")?;
    writeln!(stdout).context("Failed to write newline after JSON to stdout")?;
    Ok(())
}
