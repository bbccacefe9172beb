use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{
    SaveError,
    core::{
        board::Board,
        piece::{PieceKind, PieceRotation, RotationDirection},
    },
};

use super::{
    clock::CycleClock,
    config::SessionConfig,
    piece_generator::{PieceGenerator, PieceSeed},
    save::SessionSnapshot,
    stats::SessionStats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SessionState {
    /// Waiting for the first start; the clock is paused.
    NewGame,
    Playing,
    Paused,
    /// The last spawn collided; only a restart leaves this state.
    GameOver,
}

/// The piece under player control.
///
/// `column` and `row` are the board coordinates of the top-left corner of the
/// piece's bounding square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub column: i32,
    pub row: i32,
    pub rotation: PieceRotation,
}

impl ActivePiece {
    /// Creates a piece at its catalog spawn position in rotation 0.
    #[must_use]
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            column: kind.spawn_column(),
            row: kind.spawn_row(),
            rotation: PieceRotation::SPAWN,
        }
    }

    #[must_use]
    pub fn moved(self, dx: i32, dy: i32) -> Self {
        Self {
            column: self.column + dx,
            row: self.row + dy,
            ..self
        }
    }

    #[must_use]
    pub fn fits(&self, board: &Board) -> bool {
        board.is_valid_and_empty(self.kind, self.column, self.row, self.rotation)
    }

    /// Returns the board coordinates `(x, y)` of every occupied cell.
    pub fn occupied_positions(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        let Self {
            kind,
            column,
            row,
            rotation,
        } = *self;
        kind.occupied_cells(rotation)
            .map(move |(dx, dy)| (column + dx as i32, row + dy as i32))
    }

    /// Moves the piece back inside the grid for `rotation`, using that rotation's insets.
    ///
    /// Each axis is corrected at most once: a piece sticking out on the left or top is
    /// moved so that its first occupied column or row lands on 0, one sticking out on
    /// the right or bottom so that its last occupied column or row lands on the last
    /// one. Collisions are not considered.
    fn corrected_for(self, rotation: PieceRotation) -> Self {
        let insets = self.kind.insets(rotation);
        let dimension = self.kind.dimension() as i32;
        let (left, right) = (insets.left as i32, insets.right as i32);
        let (top, bottom) = (insets.top as i32, insets.bottom as i32);
        let columns = Board::COLUMNS as i32;
        let rows = Board::TOTAL_ROWS as i32;

        let mut column = self.column;
        if column < -left {
            column = -left;
        } else if column + dimension - 1 - right >= columns {
            column = columns - dimension + right;
        }

        let mut row = self.row;
        if row < -top {
            row = -top;
        } else if row + dimension - 1 - bottom >= rows {
            row = rows - dimension + bottom;
        }

        Self {
            column,
            row,
            rotation,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum MoveDirection {
    Left,
    Right,
}

impl MoveDirection {
    const fn dx(self) -> i32 {
        match self {
            MoveDirection::Left => -1,
            MoveDirection::Right => 1,
        }
    }
}

/// What a single gravity tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum TickOutcome {
    /// The session was not playing.
    Idle,
    /// The active piece moved down one row.
    Fell,
    /// The active piece was locked and the next one spawned.
    Locked { cleared_lines: usize },
    /// The active piece was locked and the next one could not spawn.
    ToppedOut { cleared_lines: usize },
}

/// Discrete player input understood by the session.
///
/// Saving and loading are host operations built on [`GameSession::export_state`]
/// and [`GameSession::import_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    RotateClockwise,
    RotateCounterClockwise,
    SoftDropStart,
    SoftDropEnd,
    TogglePause,
    StartOrRestart,
}

/// A single game: board, active and next piece, score and pacing.
///
/// The session never sleeps or reads the system clock on its own. The driver calls
/// [`Self::advance_frame`] once per frame with the current time and forwards player
/// input as [`Intent`]s.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
///
/// use blockfall_engine::{GameSession, PieceSeed, SessionConfig};
///
/// let start = Instant::now();
/// let seed = PieceSeed::from_bytes([1; 16]);
/// let mut session = GameSession::with_seed(SessionConfig::default(), seed, start);
/// assert!(session.is_new_game());
///
/// session.start_or_restart(start);
/// let row = session.active_piece().row;
///
/// // One cycle per second at the start of a game.
/// session.advance_frame(start + Duration::from_secs(1));
/// assert_eq!(session.active_piece().row, row + 1);
/// ```
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    board: Board,
    generator: PieceGenerator,
    clock: CycleClock,
    state: SessionState,
    active: ActivePiece,
    next_kind: PieceKind,
    score: i32,
    level: i32,
    speed: f32,
    drop_cooldown: u32,
    soft_dropping: bool,
    stats: SessionStats,
}

impl GameSession {
    /// Creates a session in the [`SessionState::NewGame`] state with a random seed.
    ///
    /// # Panics
    ///
    /// Panics if `config.base_speed` is not a positive finite number; see
    /// [`SessionConfig::validate`].
    #[must_use]
    pub fn new(config: SessionConfig, now: Instant) -> Self {
        Self::with_generator(config, PieceGenerator::new(), now)
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece sequences.
    #[must_use]
    pub fn with_seed(config: SessionConfig, seed: PieceSeed, now: Instant) -> Self {
        Self::with_generator(config, PieceGenerator::with_seed(seed), now)
    }

    fn with_generator(config: SessionConfig, mut generator: PieceGenerator, now: Instant) -> Self {
        let mut clock = CycleClock::with_start(config.base_speed, now);
        clock.set_paused(true);
        let active = ActivePiece::spawn(generator.next_kind());
        let next_kind = generator.next_kind();
        Self {
            speed: config.base_speed,
            config,
            board: Board::new(),
            generator,
            clock,
            state: SessionState::NewGame,
            active,
            next_kind,
            score: 0,
            level: 1,
            drop_cooldown: 0,
            soft_dropping: false,
            stats: SessionStats::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn active_piece(&self) -> &ActivePiece {
        &self.active
    }

    #[must_use]
    pub fn next_kind(&self) -> PieceKind {
        self.next_kind
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    #[must_use]
    pub fn is_new_game(&self) -> bool {
        self.state.is_new_game()
    }

    #[must_use]
    pub fn score(&self) -> i32 {
        self.score
    }

    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Returns the gravity rate in cycles per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Returns the frames left before soft drop requests are honored again.
    #[must_use]
    pub fn drop_cooldown(&self) -> u32 {
        self.drop_cooldown
    }

    #[must_use]
    pub fn is_soft_dropping(&self) -> bool {
        self.soft_dropping
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    #[must_use]
    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }

    /// Returns the lowest row the active piece can fall to without moving sideways.
    #[must_use]
    pub fn ghost_row(&self) -> i32 {
        let mut piece = self.active;
        while piece.moved(0, 1).fits(&self.board) {
            piece = piece.moved(0, 1);
        }
        piece.row
    }

    /// Starts a fresh game from [`SessionState::NewGame`] or [`SessionState::GameOver`].
    ///
    /// Returns `false`, doing nothing, in any other state.
    pub fn start_or_restart(&mut self, now: Instant) -> bool {
        if !(self.state.is_new_game() || self.state.is_game_over()) {
            return false;
        }
        self.reset(now);
        true
    }

    /// Clears the board and counters, draws a fresh next piece and spawns from it.
    ///
    /// Gravity restarts at `now`: the first cycle of the new game elapses one full
    /// cycle after it.
    pub fn reset(&mut self, now: Instant) {
        self.board.clear();
        self.score = 0;
        self.level = 1;
        self.speed = self.config.base_speed;
        self.drop_cooldown = 0;
        self.soft_dropping = false;
        self.stats = SessionStats::new();
        self.next_kind = self.generator.next_kind();
        self.state = SessionState::Playing;
        self.clock.reset_at(now);
        self.clock.set_rate(self.speed);
        self.spawn();
    }

    /// Promotes the next piece to the active piece and draws a new next piece.
    ///
    /// Returns `false` and ends the game if the spawn position is blocked.
    fn spawn(&mut self) -> bool {
        self.active = ActivePiece::spawn(self.next_kind);
        self.next_kind = self.generator.next_kind();
        if !self.active.fits(&self.board) {
            self.state = SessionState::GameOver;
            self.soft_dropping = false;
            self.clock.set_paused(true);
            return false;
        }
        true
    }

    /// Runs one gravity step.
    ///
    /// The active piece falls one row if it can; otherwise it is locked, full lines
    /// are cleared and scored, the game speeds up and the next piece spawns.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.is_playing() {
            return TickOutcome::Idle;
        }

        let fallen = self.active.moved(0, 1);
        if fallen.fits(&self.board) {
            self.active = fallen;
            return TickOutcome::Fell;
        }

        let ActivePiece {
            kind,
            column,
            row,
            rotation,
        } = self.active;
        self.board.place(kind, column, row, rotation);
        let cleared_lines = self.board.clear_full_lines();
        if cleared_lines > 0 {
            self.score = self.score.saturating_add(50 << cleared_lines);
        }
        self.stats.complete_piece_drop(cleared_lines);

        self.speed += self.config.speed_increment;
        self.soft_dropping = false;
        self.clock.set_rate(self.speed);
        // Ticks run right after a clock update, so its baseline is the current frame.
        self.clock.reset();
        self.drop_cooldown = self.config.drop_cooldown_frames;
        self.level = self.config.level_for_speed(self.speed);

        if self.spawn() {
            TickOutcome::Locked { cleared_lines }
        } else {
            TickOutcome::ToppedOut { cleared_lines }
        }
    }

    /// Runs one driver-loop iteration at time `now`.
    ///
    /// Updates the clock, runs one [`Self::tick`] per elapsed cycle and counts the
    /// drop cooldown down by one frame. Returns the outcome of every tick that ran.
    pub fn advance_frame(&mut self, now: Instant) -> Vec<TickOutcome> {
        self.clock.update(now);
        let mut outcomes = vec![];
        while self.state.is_playing() && self.clock.consume_cycle() {
            outcomes.push(self.tick());
        }
        self.drop_cooldown = self.drop_cooldown.saturating_sub(1);
        outcomes
    }

    /// Shifts the active piece one column if the target position is free.
    pub fn move_piece(&mut self, direction: MoveDirection) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        let moved = self.active.moved(direction.dx(), 0);
        if !moved.fits(&self.board) {
            return false;
        }
        self.active = moved;
        true
    }

    /// Rotates the active piece a quarter turn.
    ///
    /// A piece that would stick out of the grid in the new rotation is first moved
    /// back inside it. If the corrected position still does not fit, the rotation is
    /// rejected and the piece keeps its pose.
    pub fn rotate(&mut self, direction: RotationDirection) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        let rotated = self.active.corrected_for(self.active.rotation.rotated(direction));
        if !rotated.fits(&self.board) {
            return false;
        }
        self.active = rotated;
        true
    }

    /// Switches gravity to the soft drop rate.
    ///
    /// Ignored while not playing and during the cooldown that follows a lock.
    pub fn soft_drop_start(&mut self) -> bool {
        if !self.state.is_playing() || self.drop_cooldown > 0 {
            return false;
        }
        self.soft_dropping = true;
        self.clock.set_rate(self.config.soft_drop_speed);
        true
    }

    /// Restores the normal gravity rate and drops the cycles accumulated during
    /// the soft drop; the next cycle elapses one full cycle after `now`.
    ///
    /// Does nothing unless a soft drop is active.
    pub fn soft_drop_end(&mut self, now: Instant) -> bool {
        if !self.soft_dropping {
            return false;
        }
        self.soft_dropping = false;
        self.clock.set_rate(self.speed);
        self.clock.reset_at(now);
        true
    }

    /// Switches between [`SessionState::Playing`] and [`SessionState::Paused`].
    pub fn toggle_pause(&mut self) -> bool {
        match self.state {
            SessionState::Playing => {
                // The clock is paused next, so the baseline is irrelevant here.
                self.soft_drop_end(self.clock.last_update());
                self.state = SessionState::Paused;
                self.clock.set_paused(true);
            }
            SessionState::Paused => {
                self.state = SessionState::Playing;
                self.clock.set_paused(false);
            }
            SessionState::NewGame | SessionState::GameOver => return false,
        }
        true
    }

    /// Applies a player intent received at `now`. Returns whether it changed the session.
    pub fn apply(&mut self, intent: Intent, now: Instant) -> bool {
        match intent {
            Intent::MoveLeft => self.move_piece(MoveDirection::Left),
            Intent::MoveRight => self.move_piece(MoveDirection::Right),
            Intent::RotateClockwise => self.rotate(RotationDirection::Clockwise),
            Intent::RotateCounterClockwise => self.rotate(RotationDirection::CounterClockwise),
            Intent::SoftDropStart => self.soft_drop_start(),
            Intent::SoftDropEnd => self.soft_drop_end(now),
            Intent::TogglePause => self.toggle_pause(),
            Intent::StartOrRestart => self.start_or_restart(now),
        }
    }

    #[must_use]
    pub fn export_state(&self) -> SessionSnapshot {
        SessionSnapshot {
            level: self.level,
            score: self.score,
            active: self.active,
            next_kind: self.next_kind,
            speed: self.speed,
            game_over: self.state.is_game_over(),
            is_new_game: self.state.is_new_game(),
            board: self.board.snapshot(),
        }
    }

    /// Replaces the game with a saved one.
    ///
    /// The whole snapshot is validated first; on error the session is unchanged.
    /// A game that was in progress resumes in [`SessionState::Paused`]. Session
    /// statistics start over from zero.
    pub fn import_state(&mut self, snapshot: &SessionSnapshot) -> Result<(), SaveError> {
        let board = Board::from_snapshot(&snapshot.board)?;
        if !(snapshot.speed.is_finite() && snapshot.speed > 0.0) {
            return Err(SaveError::InvalidSpeed {
                speed: snapshot.speed,
            });
        }
        for (name, value) in [("score", snapshot.score), ("level", snapshot.level)] {
            if value < 0 {
                return Err(SaveError::NegativeCounter { name, value });
            }
        }
        let active = snapshot.active;
        if !Board::is_in_bounds(active.kind, active.column, active.row, active.rotation) {
            return Err(SaveError::PositionOutOfRange {
                column: active.column,
                row: active.row,
            });
        }

        self.board = board;
        self.active = active;
        self.next_kind = snapshot.next_kind;
        self.score = snapshot.score;
        self.level = snapshot.level;
        self.speed = snapshot.speed;
        self.drop_cooldown = 0;
        self.soft_dropping = false;
        self.stats = SessionStats::new();
        self.state = if snapshot.game_over {
            SessionState::GameOver
        } else if snapshot.is_new_game {
            SessionState::NewGame
        } else {
            SessionState::Paused
        };
        self.clock.set_rate(self.speed);
        self.clock.reset();
        self.clock.set_paused(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::core::board::Block;

    use super::*;

    const SEED: PieceSeed = PieceSeed::from_bytes([42; 16]);

    fn started_session() -> (GameSession, Instant) {
        let start = Instant::now();
        let mut session = GameSession::with_seed(SessionConfig::default(), SEED, start);
        assert!(session.start_or_restart(start));
        (session, start)
    }

    fn fill_row_except(board: &mut Board, y: i32, gap: std::ops::Range<i32>) {
        let mut snapshot = board.snapshot();
        for x in 0..Board::COLUMNS as i32 {
            if !gap.contains(&x) {
                snapshot.cells[(y as usize) * Board::COLUMNS + x as usize] = PieceKind::O as i32;
            }
        }
        board.restore(&snapshot).unwrap();
    }

    /// Locks a vertical I piece covering `column` in the bottom four rows.
    fn lock_vertical_i(session: &mut GameSession, column: i32) -> TickOutcome {
        session.active = ActivePiece {
            kind: PieceKind::I,
            column: column - 2,
            row: 18,
            rotation: PieceRotation::ALL[1],
        };
        assert!(session.active.fits(&session.board));
        session.tick()
    }

    #[test]
    fn test_new_session_waits_for_start() {
        let start = Instant::now();
        let mut session = GameSession::with_seed(SessionConfig::default(), SEED, start);
        assert!(session.is_new_game());
        assert!(session.clock().is_paused());
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert!(!session.toggle_pause());
        assert!(session.advance_frame(start + Duration::from_secs(10)).is_empty());

        assert!(session.start_or_restart(start));
        assert!(session.state().is_playing());
        assert_eq!(session.score(), 0);
        assert_eq!(session.level(), 1);
        assert!(!session.start_or_restart(start), "cannot restart while playing");
    }

    #[test]
    fn test_score_table() {
        for (lines, expected) in [(0, 0), (1, 100), (2, 200), (3, 400), (4, 800)] {
            let (mut session, _) = started_session();
            for y in (22 - lines)..22 {
                fill_row_except(&mut session.board, y, 0..1);
            }
            let outcome = lock_vertical_i(&mut session, 0);
            let cleared_lines = lines as usize;
            assert_eq!(outcome, TickOutcome::Locked { cleared_lines }, "{lines} lines");
            assert_eq!(session.score(), expected, "{lines} lines");
            assert_eq!(session.stats().total_cleared_lines(), cleared_lines);
        }
    }

    #[test]
    fn test_lock_updates_pacing() {
        let (mut session, _) = started_session();
        let config = SessionConfig::default();
        let outcome = lock_vertical_i(&mut session, 5);
        assert!(outcome.is_locked());
        assert!((session.speed() - (config.base_speed + config.speed_increment)).abs() < 1e-6);
        assert_eq!(session.level(), config.level_for_speed(session.speed()));
        assert_eq!(session.drop_cooldown(), config.drop_cooldown_frames);
        assert_eq!(session.stats().completed_pieces(), 1);
        assert_eq!(session.board().get(5, 21), Some(Block::Piece(PieceKind::I)));
        assert_eq!(*session.active_piece(), ActivePiece::spawn(session.active.kind));
    }

    #[test]
    fn test_gravity_follows_clock() {
        let (mut session, start) = started_session();
        let row = session.active_piece().row;
        assert!(session.advance_frame(start + Duration::from_millis(999)).is_empty());
        assert_eq!(
            session.advance_frame(start + Duration::from_millis(3000)),
            vec![TickOutcome::Fell, TickOutcome::Fell, TickOutcome::Fell]
        );
        assert_eq!(session.active_piece().row, row + 3);
    }

    #[test]
    fn test_move_blocked_by_wall() {
        let (mut session, _) = started_session();
        let mut moves = 0;
        while session.move_piece(MoveDirection::Left) {
            moves += 1;
            assert!(moves < Board::COLUMNS, "piece left the board");
        }
        let piece = *session.active_piece();
        let left = piece.occupied_positions().map(|(x, _)| x).min().unwrap();
        assert_eq!(left, 0);
        assert!(!session.move_piece(MoveDirection::Left));
        assert_eq!(*session.active_piece(), piece);
    }

    #[test]
    fn test_rotation_correction_at_left_wall() {
        let (mut session, _) = started_session();
        // Vertical I flush against the left wall occupies column 0.
        session.active = ActivePiece {
            kind: PieceKind::I,
            column: -2,
            row: 5,
            rotation: PieceRotation::ALL[1],
        };
        assert!(session.active.fits(&session.board));

        assert!(session.rotate(RotationDirection::Clockwise));
        let piece = *session.active_piece();
        assert_eq!(piece.rotation, PieceRotation::ALL[2]);
        assert_eq!(piece.column, 0, "shifted right by the inset deficit");
        assert_eq!(piece.row, 5);
        let columns: Vec<_> = piece.occupied_positions().map(|(x, _)| x).collect();
        assert_eq!(columns, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_rotation_rejected_after_correction() {
        let (mut session, _) = started_session();
        let vertical = ActivePiece {
            kind: PieceKind::I,
            column: -2,
            row: 5,
            rotation: PieceRotation::ALL[1],
        };
        session.active = vertical;
        // Block the cell the corrected horizontal piece would need.
        session.board.place(PieceKind::O, 2, 6, PieceRotation::SPAWN);
        assert!(session.active.fits(&session.board));

        assert!(!session.rotate(RotationDirection::Clockwise));
        assert_eq!(*session.active_piece(), vertical);
    }

    #[test]
    fn test_rotation_correction_at_right_wall_and_floor() {
        let (mut session, _) = started_session();
        // Vertical I in rotation 3 occupies local column 1; column 8 puts it on the last column.
        session.active = ActivePiece {
            kind: PieceKind::I,
            column: 8,
            row: 18,
            rotation: PieceRotation::ALL[3],
        };
        assert!(session.active.fits(&session.board));

        assert!(session.rotate(RotationDirection::Clockwise));
        let piece = *session.active_piece();
        assert_eq!(piece.rotation, PieceRotation::SPAWN);
        assert_eq!(piece.column, 6);
        let columns: Vec<_> = piece.occupied_positions().map(|(x, _)| x).collect();
        assert_eq!(columns, vec![6, 7, 8, 9]);

        // Horizontal I in rotation 2 on the floor turns vertical and is lifted.
        session.active = ActivePiece {
            kind: PieceKind::I,
            column: 3,
            row: 19,
            rotation: PieceRotation::ALL[2],
        };
        assert!(session.active.fits(&session.board));
        assert!(session.rotate(RotationDirection::CounterClockwise));
        let rows: Vec<_> = session
            .active_piece()
            .occupied_positions()
            .map(|(_, y)| y)
            .collect();
        assert_eq!(rows, vec![18, 19, 20, 21]);
    }

    #[test]
    fn test_soft_drop() {
        let (mut session, start) = started_session();
        assert!(session.soft_drop_start());
        assert!(session.is_soft_dropping());
        // 25 cycles per second: 40 ms per cycle.
        assert_eq!(session.advance_frame(start + Duration::from_millis(80)).len(), 2);

        let released = start + Duration::from_millis(80);
        assert!(session.soft_drop_end(released));
        assert!(!session.soft_drop_end(released), "release without a drop is ignored");
        assert!(session.advance_frame(start + Duration::from_millis(500)).is_empty());
        assert_eq!(session.advance_frame(start + Duration::from_millis(1080)).len(), 1);
    }

    #[test]
    fn test_soft_drop_blocked_by_cooldown() {
        let (mut session, start) = started_session();
        lock_vertical_i(&mut session, 5);
        assert!(!session.soft_drop_start());

        let mut now = start;
        for _ in 0..SessionConfig::default().drop_cooldown_frames {
            now += Duration::from_millis(20);
            session.advance_frame(now);
        }
        assert_eq!(session.drop_cooldown(), 0);
        assert!(session.soft_drop_start());
    }

    #[test]
    fn test_pause_stops_gravity() {
        let (mut session, start) = started_session();
        let row = session.active_piece().row;
        assert!(session.toggle_pause());
        assert!(session.is_paused());
        assert!(!session.move_piece(MoveDirection::Right));
        assert!(!session.rotate(RotationDirection::Clockwise));
        assert!(!session.soft_drop_start());
        assert!(session.advance_frame(start + Duration::from_secs(60)).is_empty());

        assert!(session.toggle_pause());
        assert!(session.advance_frame(start + Duration::from_millis(60_500)).is_empty());
        assert_eq!(session.advance_frame(start + Duration::from_secs(61)).len(), 1);
        assert_eq!(session.active_piece().row, row + 1);
    }

    #[test]
    fn test_blocked_spawn_ends_game() {
        let (mut session, start) = started_session();
        let next = session.next_kind();
        let spawn = ActivePiece::spawn(next);
        let (x, y) = spawn.occupied_positions().next().unwrap();
        let mut snapshot = session.board.snapshot();
        snapshot.cells[y as usize * Board::COLUMNS + x as usize] = PieceKind::Z as i32;
        session.board.restore(&snapshot).unwrap();

        let outcome = lock_vertical_i(&mut session, 0);
        assert_eq!(outcome, TickOutcome::ToppedOut { cleared_lines: 0 });
        assert!(session.is_game_over());
        assert!(session.clock().is_paused());

        let before = session.export_state();
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert!(!session.move_piece(MoveDirection::Left));
        assert!(!session.rotate(RotationDirection::Clockwise));
        assert!(!session.toggle_pause());
        assert!(session.advance_frame(start + Duration::from_secs(30)).is_empty());
        assert_eq!(session.export_state(), before);

        assert!(session.start_or_restart(start + Duration::from_secs(30)));
        assert!(session.state().is_playing());
        assert_eq!(session.score(), 0);
        assert!(session.board().rows().all(|row| row.cells().iter().all(|b| b.is_empty())));
    }

    #[test]
    fn test_score_saturates() {
        let (mut session, _) = started_session();
        let mut snapshot = session.export_state();
        snapshot.score = i32::MAX - 50;
        session.import_state(&snapshot).unwrap();
        assert!(session.toggle_pause());

        fill_row_except(&mut session.board, 21, 0..1);
        let outcome = lock_vertical_i(&mut session, 0);
        assert_eq!(outcome, TickOutcome::Locked { cleared_lines: 1 });
        assert_eq!(session.score(), i32::MAX);
    }

    #[test]
    fn test_input_restarts_gravity_at_input_time() {
        let start = Instant::now();
        let ms = Duration::from_millis;
        let mut session = GameSession::with_seed(SessionConfig::default(), SEED, start);
        session.advance_frame(start + ms(700));
        assert!(session.start_or_restart(start + ms(950)));
        assert!(session.advance_frame(start + ms(1700)).is_empty());
        assert_eq!(session.advance_frame(start + ms(1950)), vec![TickOutcome::Fell]);

        // A soft drop released between two frames.
        assert!(session.soft_drop_start());
        assert!(session.soft_drop_end(start + ms(1990)));
        assert!(session.advance_frame(start + ms(2950)).is_empty());
        assert_eq!(session.advance_frame(start + ms(2990)), vec![TickOutcome::Fell]);
    }

    #[test]
    fn test_ghost_row() {
        let (mut session, _) = started_session();
        session.active = ActivePiece::spawn(PieceKind::O);
        assert_eq!(session.ghost_row(), 20);
        session.board.place(PieceKind::O, 4, 20, PieceRotation::SPAWN);
        assert_eq!(session.ghost_row(), 18);
    }

    #[test]
    fn test_export_import_identity() {
        let (mut session, start) = started_session();
        lock_vertical_i(&mut session, 3);
        session.advance_frame(start + Duration::from_secs(2));
        assert!(session.move_piece(MoveDirection::Right));

        let snapshot = session.export_state();
        let mut other = GameSession::with_seed(SessionConfig::default(), PieceSeed::from_bytes([9; 16]), start);
        other.import_state(&snapshot).unwrap();

        assert_eq!(other.export_state(), snapshot);
        assert_eq!(other.board(), session.board());
        assert_eq!(other.speed().to_bits(), session.speed().to_bits());
        assert!(other.is_paused(), "a live game resumes paused");

        session.import_state(&snapshot).unwrap();
        assert_eq!(session.export_state(), snapshot);
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let (mut session, _) = started_session();
        lock_vertical_i(&mut session, 3);
        let before = session.export_state();

        let mut bad_cell = before.clone();
        bad_cell.score = 9999;
        bad_cell.board.cells[17] = 12;
        assert!(session.import_state(&bad_cell).is_err());

        let mut bad_speed = before.clone();
        bad_speed.score = 9999;
        bad_speed.speed = -1.0;
        assert!(matches!(
            session.import_state(&bad_speed),
            Err(SaveError::InvalidSpeed { .. })
        ));

        let mut bad_position = before.clone();
        bad_position.active.column = 11;
        assert!(matches!(
            session.import_state(&bad_position),
            Err(SaveError::PositionOutOfRange { column: 11, .. })
        ));

        let mut negative_score = before.clone();
        negative_score.score = -5;
        assert!(session.import_state(&negative_score).is_err());

        assert_eq!(session.export_state(), before);
        assert!(session.state().is_playing());
    }

    #[test]
    fn test_import_restores_flags() {
        let start = Instant::now();
        let mut session = GameSession::with_seed(SessionConfig::default(), SEED, start);
        let mut snapshot = session.export_state();
        assert!(snapshot.is_new_game);

        snapshot.is_new_game = false;
        snapshot.game_over = true;
        session.import_state(&snapshot).unwrap();
        assert!(session.is_game_over());
        assert!(session.clock().is_paused());
        assert!(session.start_or_restart(start));
    }

    #[test]
    fn test_seeded_sessions_are_deterministic() {
        let start = Instant::now();
        let play = || {
            let mut session = GameSession::with_seed(SessionConfig::default(), SEED, start);
            session.start_or_restart(start);
            let mut now = start;
            let mut kinds = vec![];
            while !session.is_game_over() && kinds.len() < 200 {
                now += Duration::from_millis(20);
                for outcome in session.advance_frame(now) {
                    if outcome.is_locked() {
                        kinds.push(session.active_piece().kind);
                    }
                }
            }
            (kinds, session.export_state())
        };
        let (kinds_a, state_a) = play();
        let (kinds_b, state_b) = play();
        assert!(!kinds_a.is_empty());
        assert_eq!(kinds_a, kinds_b);
        assert_eq!(state_a, state_b);
    }

    #[test]
    fn test_apply_intents() {
        let start = Instant::now();
        let mut session = GameSession::with_seed(SessionConfig::default(), SEED, start);
        assert!(!session.apply(Intent::MoveLeft, start));
        assert!(session.apply(Intent::StartOrRestart, start));
        let column = session.active_piece().column;
        assert!(session.apply(Intent::MoveLeft, start));
        assert_eq!(session.active_piece().column, column - 1);
        assert!(session.apply(Intent::MoveRight, start));
        assert!(session.apply(Intent::SoftDropStart, start));
        assert!(session.apply(Intent::SoftDropEnd, start));
        assert!(session.apply(Intent::TogglePause, start));
        assert!(session.is_paused());
        assert!(session.apply(Intent::TogglePause, start));
        assert!(!session.apply(Intent::StartOrRestart, start));
    }
}
