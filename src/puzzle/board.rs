use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Value of the empty cell.
pub const EMPTY: u16 = 0;

/// Largest supported grid edge; bigger requests are clamped.
pub const MAX_GRID_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

/// Direction the empty cell travels during a shuffle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    fn step(self, cell: Cell, size: usize) -> Option<Cell> {
        match self {
            Direction::Up => cell.row.checked_sub(1).map(|row| Cell::new(row, cell.col)),
            Direction::Down => (cell.row + 1 < size).then(|| Cell::new(cell.row + 1, cell.col)),
            Direction::Left => cell.col.checked_sub(1).map(|col| Cell::new(cell.row, col)),
            Direction::Right => (cell.col + 1 < size).then(|| Cell::new(cell.row, cell.col + 1)),
        }
    }
}

/// Why a slide was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejected {
    OutOfBounds,
    EmptyCell,
    NotAdjacent,
}

/// An accepted slide: tile `value` moved from `from` into the old empty cell `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub value: u16,
    pub from: Cell,
    pub to: Cell,
}

/// The tile currently highlighted as the move objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetTile {
    pub value: u16,
    pub cell: Cell,
}

/// G×G sliding puzzle. Values `1..G²` are tiles, `0` is the empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleBoard {
    size: usize,
    cells: Vec<u16>,
    empty: Cell,
}

impl PuzzleBoard {
    /// Row-major `1..G²-1` with the empty cell last. `size` is clamped to
    /// `2..=MAX_GRID_SIZE`.
    pub fn solved(size: usize) -> Self {
        let size = size.clamp(2, MAX_GRID_SIZE);
        let tiles = (size * size) as u16;
        let mut cells: Vec<u16> = (1..tiles).collect();
        cells.push(EMPTY);
        Self {
            size,
            cells,
            empty: Cell::new(size - 1, size - 1),
        }
    }

    /// Shuffle a solved board with `shuffle_moves` random legal empty-cell
    /// steps, so the result is always solvable. Returns the steps taken.
    pub fn generate<R: Rng + ?Sized>(
        size: usize,
        shuffle_moves: usize,
        rng: &mut R,
    ) -> (Self, Vec<Direction>) {
        let mut board = Self::solved(size);
        let mut history = Vec::with_capacity(shuffle_moves);

        for _ in 0..shuffle_moves {
            let options: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|d| d.step(board.empty, board.size).is_some())
                .collect();
            if let Some(direction) = options.choose(rng) {
                board.move_empty(*direction);
                history.push(*direction);
            }
        }

        (board, history)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[u16] {
        &self.cells
    }

    pub fn empty_cell(&self) -> Cell {
        self.empty
    }

    pub fn value_at(&self, cell: Cell) -> Option<u16> {
        self.in_bounds(cell).then(|| self.cells[self.index(cell)])
    }

    pub fn position_of(&self, value: u16) -> Option<Cell> {
        self.cells
            .iter()
            .position(|v| *v == value)
            .map(|i| Cell::new(i / self.size, i % self.size))
    }

    pub fn is_solved(&self) -> bool {
        *self == Self::solved(self.size)
    }

    /// In-bounds 4-neighbours of `cell`.
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        Direction::ALL
            .into_iter()
            .filter_map(|d| d.step(cell, self.size))
            .collect()
    }

    /// Swap the empty cell with its neighbour in `direction`.
    /// Returns false (and leaves the board alone) at the edge.
    pub fn move_empty(&mut self, direction: Direction) -> bool {
        let Some(next) = direction.step(self.empty, self.size) else {
            return false;
        };
        let (a, b) = (self.index(self.empty), self.index(next));
        self.cells.swap(a, b);
        self.empty = next;
        true
    }

    /// Validate and apply sliding the tile at `cell` into the empty cell.
    pub fn slide(&mut self, cell: Cell) -> Result<Slide, MoveRejected> {
        let value = self.value_at(cell).ok_or(MoveRejected::OutOfBounds)?;
        if value == EMPTY {
            return Err(MoveRejected::EmptyCell);
        }
        if !cell.is_adjacent(&self.empty) {
            return Err(MoveRejected::NotAdjacent);
        }

        let to = self.empty;
        let (a, b) = (self.index(cell), self.index(to));
        self.cells.swap(a, b);
        self.empty = cell;

        Ok(Slide {
            value,
            from: cell,
            to,
        })
    }

    /// Pick a uniformly random tile next to the empty cell.
    pub fn pick_target<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<TargetTile> {
        let candidates = self.neighbors(self.empty);
        let cell = *candidates.choose(rng)?;
        Some(TargetTile {
            value: self.cells[self.index(cell)],
            cell,
        })
    }

    /// Parity test for the sliding-puzzle family.
    pub fn is_solvable(&self) -> bool {
        let tiles: Vec<u16> = self.cells.iter().copied().filter(|v| *v != EMPTY).collect();
        let inversions = tiles
            .iter()
            .enumerate()
            .map(|(i, a)| tiles[i + 1..].iter().filter(|b| a > b).count())
            .sum::<usize>();

        if self.size % 2 == 1 {
            inversions % 2 == 0
        } else {
            let empty_row_from_bottom = self.size - self.empty.row;
            (inversions + empty_row_from_bottom) % 2 == 1
        }
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.size && cell.col < self.size
    }

    fn index(&self, cell: Cell) -> usize {
        cell.row * self.size + cell.col
    }
}

/// Where the board is drawn, used to map a cursor onto cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardLayout {
    pub origin: Point,
    pub tile_size: f32,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            origin: Point::new(0.1, 0.2),
            tile_size: 0.2,
        }
    }
}

impl BoardLayout {
    pub fn cell_at(&self, p: Point, size: usize) -> Option<Cell> {
        let col = (p.x - self.origin.x) / self.tile_size;
        let row = (p.y - self.origin.y) / self.tile_size;
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let cell = Cell::new(row.floor() as usize, col.floor() as usize);
        (cell.row < size && cell.col < size).then_some(cell)
    }

    /// Display rectangle of a cell.
    pub fn cell_rect(&self, cell: Cell) -> Rect {
        Rect::new(
            self.origin.x + cell.col as f32 * self.tile_size,
            self.origin.y + cell.row as f32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }
}
