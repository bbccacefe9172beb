use std::{path::PathBuf, time::Instant};

use anyhow::Context as _;
use blockfall_engine::{PieceSeed, SessionConfig};
use ratatui_runtime::{Runtime, ScreenStack};

use crate::{DEFAULT_FRAME_RATE, DEFAULT_SAVE_FILE, view::screens::PlayScreen};

#[derive(Debug, Clone, PartialEq, clap::Args)]
pub(crate) struct PlayArg {
    /// Seed for the piece sequence, as 32 hexadecimal digits (random if omitted)
    #[clap(long)]
    seed: Option<PieceSeed>,
    /// Frames per second of the update loop
    #[clap(long, default_value_t = DEFAULT_FRAME_RATE)]
    frame_rate: f64,
    /// File written by the save key and read by the load key
    #[clap(long, default_value = DEFAULT_SAVE_FILE)]
    save_file: PathBuf,
    #[clap(flatten)]
    speed: SpeedArg,
}

impl Default for PlayArg {
    fn default() -> Self {
        Self {
            seed: None,
            frame_rate: DEFAULT_FRAME_RATE,
            save_file: PathBuf::from(DEFAULT_SAVE_FILE),
            speed: SpeedArg::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, clap::Args)]
struct SpeedArg {
    /// Rows per second the piece falls at the start of a game
    #[clap(long, default_value_t = SessionConfig::default().base_speed)]
    base_speed: f32,
    /// Added to the fall rate after every locked piece
    #[clap(long, default_value_t = SessionConfig::default().speed_increment)]
    speed_increment: f32,
    /// Rows per second while soft drop is held
    #[clap(long, default_value_t = SessionConfig::default().soft_drop_speed)]
    soft_drop_speed: f32,
}

impl Default for SpeedArg {
    fn default() -> Self {
        let config = SessionConfig::default();
        Self {
            base_speed: config.base_speed,
            speed_increment: config.speed_increment,
            soft_drop_speed: config.soft_drop_speed,
        }
    }
}

impl SpeedArg {
    fn to_config(&self) -> SessionConfig {
        SessionConfig {
            base_speed: self.base_speed,
            speed_increment: self.speed_increment,
            soft_drop_speed: self.soft_drop_speed,
            ..SessionConfig::default()
        }
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        seed,
        frame_rate,
        save_file,
        speed,
    } = arg;

    blockfall_engine::validate_catalog().context("Piece catalog is malformed")?;
    let config = speed.to_config();
    config.validate().context("Invalid speed settings")?;
    anyhow::ensure!(
        frame_rate.is_finite() && *frame_rate > 0.0,
        "Invalid frame rate: {frame_rate}"
    );

    let screen = PlayScreen::new(config, *seed, *frame_rate, save_file.clone(), Instant::now());
    let mut app = ScreenStack::new(Box::new(screen));
    Runtime::new().run(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_arguments_override_config() {
        let arg = SpeedArg {
            base_speed: 2.0,
            ..SpeedArg::default()
        };
        let config = arg.to_config();
        assert!((config.base_speed - 2.0).abs() < f32::EPSILON);
        assert_eq!(
            SessionConfig {
                base_speed: 1.0,
                ..config
            },
            SessionConfig::default()
        );
    }
}
