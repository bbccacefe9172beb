//! Stateful game logic built on the catalog and board.
//!
//! - [`GameSession`] - one game: active and next piece, score, level, speed and state
//! - [`CycleClock`] - fixed-rate cycle generator driving gravity
//! - [`SessionConfig`] - pacing constants
//! - [`PieceGenerator`] - seedable uniform piece draws
//! - [`SessionSnapshot`] - save record and its binary codec
//! - [`SessionStats`] - display-only counters
//!
//! # Game Flow
//!
//! 1. Create a [`GameSession`]; it starts in [`SessionState::NewGame`] with the clock paused
//! 2. [`GameSession::start_or_restart`] clears the board and spawns the first piece
//! 3. Each frame the driver calls [`GameSession::advance_frame`], which runs one
//!    gravity [`GameSession::tick`] per elapsed clock cycle
//! 4. A piece that cannot fall is locked, full lines are cleared and the next piece spawns
//! 5. A blocked spawn ends the game until the next restart

pub use self::{clock::*, config::*, piece_generator::*, save::*, session::*, stats::*};

mod clock;
mod config;
mod piece_generator;
mod save;
mod session;
mod stats;
