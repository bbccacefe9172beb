use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use crate::{CatalogError, SaveError};

/// Largest bounding square side length used by any piece.
pub const MAX_DIMENSION: usize = 4;

/// Occupancy of one rotation, stored row-major as `y * dimension + x`.
///
/// Only the first `dimension²` entries are meaningful.
type Bitmap = [bool; MAX_DIMENSION * MAX_DIMENSION];

/// Enum representing the type of piece.
///
/// The discriminant is the catalog index used by the save record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// J-piece.
    J = 1,
    /// L-piece.
    L = 2,
    /// O-piece.
    O = 3,
    /// S-piece.
    S = 4,
    /// T-piece.
    T = 5,
    /// Z-piece.
    Z = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// All kinds in catalog order.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Returns the catalog index of this kind.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks up a kind by catalog index.
    ///
    /// Returns `None` for indices outside `0..7`, including the `-1` empty marker.
    #[must_use]
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Returns the immutable shape of this kind.
    #[must_use]
    pub fn shape(self) -> &'static PieceShape {
        &CATALOG[self as usize]
    }

    #[must_use]
    pub fn dimension(self) -> usize {
        self.shape().dimension
    }

    /// Returns whether local cell `(x, y)` is filled in the given rotation.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is not below the piece dimension.
    #[must_use]
    pub fn is_occupied(self, rotation: PieceRotation, (x, y): (usize, usize)) -> bool {
        self.shape().is_occupied(rotation, x, y)
    }

    /// Returns the empty margins of the bounding square in the given rotation.
    #[must_use]
    pub const fn insets(self, rotation: PieceRotation) -> Insets {
        INSETS[self as usize][rotation.index()]
    }

    /// Column of the bounding square's left edge when the piece spawns.
    #[must_use]
    pub fn spawn_column(self) -> i32 {
        5 - (self.dimension() as i32) / 2
    }

    /// Row of the bounding square's top edge when the piece spawns.
    ///
    /// Equal to the top inset of rotation 0.
    #[must_use]
    pub const fn spawn_row(self) -> i32 {
        self.insets(PieceRotation::SPAWN).top as i32
    }

    /// Returns `(columns, rows)` of the shape at rotation 0, for preview layout.
    #[must_use]
    pub fn preview_size(self) -> (usize, usize) {
        let shape = self.shape();
        (shape.preview_cols, shape.preview_rows)
    }

    /// Returns an iterator of occupied local cells `(x, y)` in the given rotation.
    pub fn occupied_cells(self, rotation: PieceRotation) -> impl Iterator<Item = (usize, usize)> {
        let dimension = self.dimension();
        (0..dimension)
            .flat_map(move |y| (0..dimension).map(move |x| (x, y)))
            .filter(move |&(x, y)| self.is_occupied(rotation, (x, y)))
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::T => 'T',
            PieceKind::Z => 'Z',
        }
    }
}

/// Rotation state of a piece.
///
/// Represents one of four rotation states, `0` being the spawn orientation and
/// each step a quarter turn clockwise. Rotation operations wrap around modulo 4.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PieceRotation(u8);

impl From<PieceRotation> for u8 {
    fn from(rotation: PieceRotation) -> Self {
        rotation.0
    }
}

impl TryFrom<u8> for PieceRotation {
    type Error = SaveError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(SaveError::InvalidRotation {
            value: i32::from(value),
        })
    }
}

impl PieceRotation {
    pub const SPAWN: Self = Self(0);
    pub const ALL: [Self; 4] = [Self(0), Self(1), Self(2), Self(3)];

    /// Creates a rotation from its numeric value, or `None` if it is not in `0..4`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value < 4 { Some(Self(value)) } else { None }
    }

    #[must_use]
    pub fn rotated_right(self) -> Self {
        PieceRotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub fn rotated_left(self) -> Self {
        PieceRotation((self.0 + 3) % 4)
    }

    #[must_use]
    pub fn rotated(self, direction: RotationDirection) -> Self {
        match direction {
            RotationDirection::Clockwise => self.rotated_right(),
            RotationDirection::CounterClockwise => self.rotated_left(),
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// Number of structurally empty columns/rows on each edge of a piece's bounding square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insets {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

/// Static description of one piece kind: a square bitmap for each of the 4 rotations.
#[derive(Debug)]
pub struct PieceShape {
    dimension: usize,
    preview_cols: usize,
    preview_rows: usize,
    rotations: [Bitmap; 4],
}

#[derive(Clone, Copy)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl PieceShape {
    const fn new(
        dimension: usize,
        preview_cols: usize,
        preview_rows: usize,
        rotations: [&[&str]; 4],
    ) -> Self {
        assert!(dimension >= 2 && dimension <= MAX_DIMENSION);
        Self {
            dimension,
            preview_cols,
            preview_rows,
            rotations: [
                bitmap(dimension, rotations[0]),
                bitmap(dimension, rotations[1]),
                bitmap(dimension, rotations[2]),
                bitmap(dimension, rotations[3]),
            ],
        }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// # Panics
    ///
    /// Panics if `x` or `y` is not below the piece dimension.
    #[must_use]
    pub const fn is_occupied(&self, rotation: PieceRotation, x: usize, y: usize) -> bool {
        assert!(x < self.dimension && y < self.dimension, "local cell out of range");
        self.rotations[rotation.index()][y * self.dimension + x]
    }

    /// Number of empty columns before the first occupied one, scanning from the left.
    ///
    /// `None` if the rotation bitmap is empty.
    #[must_use]
    pub const fn left_inset(&self, rotation: PieceRotation) -> Option<usize> {
        self.scan(rotation, Edge::Left)
    }

    #[must_use]
    pub const fn right_inset(&self, rotation: PieceRotation) -> Option<usize> {
        self.scan(rotation, Edge::Right)
    }

    #[must_use]
    pub const fn top_inset(&self, rotation: PieceRotation) -> Option<usize> {
        self.scan(rotation, Edge::Top)
    }

    #[must_use]
    pub const fn bottom_inset(&self, rotation: PieceRotation) -> Option<usize> {
        self.scan(rotation, Edge::Bottom)
    }

    #[must_use]
    pub fn cell_count(&self, rotation: PieceRotation) -> usize {
        let cells = self.dimension * self.dimension;
        self.rotations[rotation.index()][..cells]
            .iter()
            .filter(|&&cell| cell)
            .count()
    }

    const fn scan(&self, rotation: PieceRotation, edge: Edge) -> Option<usize> {
        let n = self.dimension;
        let mut depth = 0;
        while depth < n {
            let mut i = 0;
            while i < n {
                let (x, y) = match edge {
                    Edge::Left => (depth, i),
                    Edge::Right => (n - 1 - depth, i),
                    Edge::Top => (i, depth),
                    Edge::Bottom => (i, n - 1 - depth),
                };
                if self.is_occupied(rotation, x, y) {
                    return Some(depth);
                }
                i += 1;
            }
            depth += 1;
        }
        None
    }

    const fn insets(&self, rotation: PieceRotation) -> Insets {
        match (
            self.left_inset(rotation),
            self.right_inset(rotation),
            self.top_inset(rotation),
            self.bottom_inset(rotation),
        ) {
            (Some(left), Some(right), Some(top), Some(bottom)) => Insets {
                left,
                right,
                top,
                bottom,
            },
            _ => panic!("piece rotation bitmap is empty"),
        }
    }
}

const fn bitmap(dimension: usize, rows: &[&str]) -> Bitmap {
    assert!(rows.len() == dimension, "bitmap row count must match dimension");
    let mut bits = [false; MAX_DIMENSION * MAX_DIMENSION];
    let mut y = 0;
    while y < dimension {
        let row = rows[y].as_bytes();
        assert!(row.len() == dimension, "bitmap row width must match dimension");
        let mut x = 0;
        while x < dimension {
            bits[y * dimension + x] = match row[x] {
                b'#' => true,
                b'.' => false,
                _ => panic!("bitmap cells must be '#' or '.'"),
            };
            x += 1;
        }
        y += 1;
    }
    bits
}

/// Checks the catalog invariants that the type system does not enforce.
///
/// Every rotation must be non-empty and all rotations of a kind must hold the
/// same number of cells. The host calls this once at startup.
pub fn validate_catalog() -> Result<(), CatalogError> {
    for kind in PieceKind::ALL {
        let shape = kind.shape();
        let expected = shape.cell_count(PieceRotation::SPAWN);
        for rotation in PieceRotation::ALL {
            let count = shape.cell_count(rotation);
            if count == 0 {
                return Err(CatalogError::EmptyRotation { kind, rotation });
            }
            if count != expected {
                return Err(CatalogError::CellCountMismatch {
                    kind,
                    rotation,
                    expected,
                    actual: count,
                });
            }
        }
    }
    Ok(())
}

static CATALOG: [PieceShape; PieceKind::LEN] = CATALOG_DATA;

const CATALOG_DATA: [PieceShape; PieceKind::LEN] = [
    // I-piece
    PieceShape::new(
        4,
        4,
        1,
        [
            &["....", "####", "....", "...."],
            &["..#.", "..#.", "..#.", "..#."],
            &["....", "....", "####", "...."],
            &[".#..", ".#..", ".#..", ".#.."],
        ],
    ),
    // J-piece
    PieceShape::new(
        3,
        3,
        2,
        [
            &["#..", "###", "..."],
            &[".##", ".#.", ".#."],
            &["...", "###", "..#"],
            &[".#.", ".#.", "##."],
        ],
    ),
    // L-piece
    PieceShape::new(
        3,
        3,
        2,
        [
            &["..#", "###", "..."],
            &[".#.", ".#.", ".##"],
            &["...", "###", "#.."],
            &["##.", ".#.", ".#."],
        ],
    ),
    // O-piece
    PieceShape::new(2, 2, 2, [&["##", "##"], &["##", "##"], &["##", "##"], &["##", "##"]]),
    // S-piece
    PieceShape::new(
        3,
        3,
        2,
        [
            &[".##", "##.", "..."],
            &[".#.", ".##", "..#"],
            &["...", ".##", "##."],
            &["#..", "##.", ".#."],
        ],
    ),
    // T-piece
    PieceShape::new(
        3,
        3,
        2,
        [
            &[".#.", "###", "..."],
            &[".#.", ".##", ".#."],
            &["...", "###", ".#."],
            &[".#.", "##.", ".#."],
        ],
    ),
    // Z-piece
    PieceShape::new(
        3,
        3,
        2,
        [
            &["##.", ".##", "..."],
            &["..#", ".##", ".#."],
            &["...", "##.", ".##"],
            &[".#.", "##.", "#.."],
        ],
    ),
];

// Computed at compile time; an empty rotation bitmap fails the build here.
const INSETS: [[Insets; 4]; PieceKind::LEN] = {
    let mut table = [[Insets {
        left: 0,
        right: 0,
        top: 0,
        bottom: 0,
    }; 4]; PieceKind::LEN];
    let mut k = 0;
    while k < PieceKind::LEN {
        let mut r = 0;
        while r < 4 {
            table[k][r] = CATALOG_DATA[k].insets(PieceRotation::ALL[r]);
            r += 1;
        }
        k += 1;
    }
    table
};
