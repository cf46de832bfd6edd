//! Maze solving with a lives budget.
//!
//! A maze is a grid of cells packed as integers (see [`decode_cell`]). Each cell
//! has up to four doors and may be a mine, the start or the end. Solving walks
//! back from the end to the start, forking a new branch at every junction, and
//! drops any branch that steps on more mines than it has lives.

mod cell;
mod find;
mod grid;
pub mod util;

pub use cell::{decode_cell, Cell};
pub use find::{
    invert_path, Branch, BranchId, MapTrait, NodeReference, PathFinder, PathFinderState,
    PathResult, SearchConfig, SearchError, Termination,
};
pub use grid::{Direction, Maze, MazeError, Point, DEFAULT_LIVES};
pub use util::MazeDescription;
