use std::fmt::Write as _;

use derive_more::Display;
use smallvec::SmallVec;
use thiserror::Error;

/// One board configuration: a `rows × columns` grid of distinct tiles with a
/// single blank cell (value `0`).
///
/// States are never mutated once handed out; deriving a new state clones the
/// grid and swaps the blank in place.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridState {
    cells: Vec<Vec<u32>>,
}

impl GridState {
    pub fn new(cells: Vec<Vec<u32>>) -> Self {
        Self { cells }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }
    pub fn columns(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }
    pub fn value_at(&self, row: usize, column: usize) -> u32 {
        self.cells[row][column]
    }

    /// Canonical encoding used as the visited-set key: values joined by `,`
    /// in row-major order. Bijective with the grid for any fixed shape, and
    /// independent of object identity.
    pub fn key(&self) -> String {
        let mut key = String::with_capacity(self.rows() * self.columns() * 3);
        for &value in self.cells.iter().flatten() {
            if !key.is_empty() {
                key.push(',');
            }
            let _ = write!(key, "{value}");
        }
        key
    }

    /// Coordinates of the blank cell, if the state has one.
    pub fn blank_position(&self) -> Option<(usize, usize)> {
        for (row, line) in self.cells.iter().enumerate() {
            for (column, &value) in line.iter().enumerate() {
                if value == 0 {
                    return Some((row, column));
                }
            }
        }
        None
    }

    /// A uniformly shuffled `rows × columns` state holding every value in
    /// `0..rows*columns` exactly once.
    ///
    /// NOTE: No solvability filter is applied; roughly half the shuffles are
    /// unreachable from any given target.
    pub fn random<R: rand::Rng>(rows: usize, columns: usize, r: &mut R) -> Self {
        use rand::seq::SliceRandom;

        let mut values: Vec<u32> = (0..(rows * columns) as u32).collect();
        values.shuffle(r);

        Self::new(values.chunks(columns).map(<[u32]>::to_vec).collect())
    }

    fn sorted_values(&self) -> Vec<u32> {
        let mut values: Vec<u32> = self.cells.iter().flatten().copied().collect();
        values.sort_unstable();
        values
    }

    pub(crate) fn swap_cells(&mut self, a: (usize, usize), b: (usize, usize)) {
        let value = self.cells[b.0][b.1];
        self.cells[b.0][b.1] = self.cells[a.0][a.1];
        self.cells[a.0][a.1] = value;
    }
}

/// Renders the board column-aligned: every cell is left-justified and padded
/// to the digit width of the largest value, `|` between columns, newline
/// between rows (no trailing newline).
impl std::fmt::Display for GridState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let largest = self.cells.iter().flatten().max().copied().unwrap_or(0);
        let width = largest.to_string().len();

        for (row, line) in self.cells.iter().enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for (column, &value) in line.iter().enumerate() {
                if column > 0 {
                    write!(f, "|")?;
                }
                write!(f, "{value:<width$}")?;
            }
        }

        Ok(())
    }
}

/// The move that produced a state: the direction the blank travelled.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum Direction {
    #[display("↑")]
    Up,
    #[display("↓")]
    Down,
    #[display("←")]
    Left,
    #[display("→")]
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Where the blank lands, if the move keeps it inside a
    /// `rows × columns` grid.
    pub(crate) fn offset(
        self,
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    ) -> Option<(usize, usize)> {
        match self {
            Direction::Up => (row > 0).then(|| (row - 1, column)),
            Direction::Down => (row + 1 < rows).then(|| (row + 1, column)),
            Direction::Left => (column > 0).then(|| (row, column - 1)),
            Direction::Right => (column + 1 < columns).then(|| (row, column + 1)),
        }
    }
}

#[derive(Debug, Error)]
pub enum InvalidPuzzleDefinition {
    #[error("initial and target states must both be {rows}x{columns} grids")]
    ShapeMismatch { rows: usize, columns: usize },
    #[error("initial and target states use different tile sets")]
    TileSetMismatch,
    #[error("tile values must be a permutation of 0..{expected}")]
    MalformedTileSet { expected: u32 },
}

/// An immutable puzzle instance: dimensions plus the initial and target
/// arrangements. Many solver runs may share one definition.
#[derive(Clone, Debug)]
pub struct TilePuzzle {
    rows: usize,
    columns: usize,
    initial_state: GridState,
    target_state: GridState,
}

impl TilePuzzle {
    /// Validates shape, tile-multiset equality between the two states, and
    /// that the tiles are a permutation of `0..rows*columns` (exactly one
    /// blank, distinct values).
    pub fn new(
        rows: usize,
        columns: usize,
        initial_state: GridState,
        target_state: GridState,
    ) -> Result<Self, InvalidPuzzleDefinition> {
        if rows == 0 || columns == 0 {
            return Err(InvalidPuzzleDefinition::ShapeMismatch { rows, columns });
        }
        for state in [&initial_state, &target_state] {
            if state.rows() != rows || state.cells.iter().any(|line| line.len() != columns) {
                return Err(InvalidPuzzleDefinition::ShapeMismatch { rows, columns });
            }
        }

        let initial_values = initial_state.sorted_values();
        if initial_values != target_state.sorted_values() {
            return Err(InvalidPuzzleDefinition::TileSetMismatch);
        }
        let expected = (rows * columns) as u32;
        if initial_values.iter().enumerate().any(|(i, &v)| v != i as u32) {
            return Err(InvalidPuzzleDefinition::MalformedTileSet { expected });
        }

        Ok(Self {
            rows,
            columns,
            initial_state,
            target_state,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn columns(&self) -> usize {
        self.columns
    }
    pub fn initial_state(&self) -> &GridState {
        &self.initial_state
    }
    pub fn target_state(&self) -> &GridState {
        &self.target_state
    }

    /// Applies one blank move, returning the derived state.
    ///
    /// `None` when the move would push the blank off the board or the state
    /// has no blank.
    pub fn apply(&self, state: &GridState, direction: Direction) -> Option<GridState> {
        let (row, column) = state.blank_position()?;
        let (new_row, new_column) = direction.offset(row, column, self.rows, self.columns)?;

        let mut next = state.clone();
        next.swap_cells((row, column), (new_row, new_column));
        Some(next)
    }

    /// Expands a state into the (up to four) states one legal blank move
    /// away, each tagged with the move that produced it.
    pub fn neighbours(&self, state: &GridState) -> SmallVec<[(GridState, Direction); 4]> {
        let mut moves = SmallVec::new();
        let Some((row, column)) = state.blank_position() else {
            return moves;
        };

        for direction in Direction::ALL {
            if let Some((new_row, new_column)) =
                direction.offset(row, column, self.rows, self.columns)
            {
                let mut next = state.clone();
                next.swap_cells((row, column), (new_row, new_column));
                moves.push((next, direction));
            }
        }
        moves
    }
}

impl std::fmt::Display for TilePuzzle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "TilePuzzle({}x{})", self.rows, self.columns)
    }
}

#[derive(Debug, Error)]
pub enum TilePuzzleParseError {
    #[error("empty input")]
    EmptyInput,
    #[error("expected `rows | columns : initial : target`, got {got} section(s)")]
    MissingSection { got: usize },
    #[error("expected `rows | columns` dimensions")]
    BadDimensions,
    #[error("invalid number {text:?}: {source}")]
    InvalidNumber {
        text: String,
        source: std::num::ParseIntError,
    },
    #[error(transparent)]
    InvalidPuzzle(#[from] InvalidPuzzleDefinition),
}

fn parse_values(section: &str) -> Result<Vec<u32>, TilePuzzleParseError> {
    section
        .split('|')
        .map(|value| {
            let value = value.trim();
            value
                .parse::<u32>()
                .map_err(|source| TilePuzzleParseError::InvalidNumber {
                    text: value.to_string(),
                    source,
                })
        })
        .collect()
}

/// Parses one puzzle from a line of the form
/// `rows | columns : v|v|…|v : v|v|…|v` (values row-major, initial then
/// target), with an optional trailing `//` comment.
impl std::convert::TryFrom<&str> for TilePuzzle {
    type Error = TilePuzzleParseError;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        let line = line.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            return Err(TilePuzzleParseError::EmptyInput);
        }

        let sections: Vec<&str> = line.split(':').collect();
        if sections.len() != 3 {
            return Err(TilePuzzleParseError::MissingSection {
                got: sections.len(),
            });
        }

        let dimensions = parse_values(sections[0])?;
        let [rows, columns] = dimensions[..] else {
            return Err(TilePuzzleParseError::BadDimensions);
        };
        let (rows, columns) = (rows as usize, columns as usize);
        if rows == 0 || columns == 0 {
            return Err(InvalidPuzzleDefinition::ShapeMismatch { rows, columns }.into());
        }

        let grid = |values: Vec<u32>| {
            GridState::new(values.chunks(columns).map(<[u32]>::to_vec).collect())
        };
        let initial_state = grid(parse_values(sections[1])?);
        let target_state = grid(parse_values(sections[2])?);

        Ok(TilePuzzle::new(rows, columns, initial_state, target_state)?)
    }
}
