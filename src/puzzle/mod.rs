pub mod board;

pub use board::{
    BoardLayout, Cell, Direction, MoveRejected, PuzzleBoard, Slide, TargetTile, EMPTY,
    MAX_GRID_SIZE,
};
