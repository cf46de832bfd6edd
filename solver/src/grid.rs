use crate::cell::{decode_cell, Cell};
use crate::find::{MapTrait, NodeReference, PathFinder, PathFinderState, SearchConfig, SearchError};
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of lives a maze grants unless configured otherwise
pub const DEFAULT_LIVES: u32 = 3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The order in which doors are tried when expanding a cell
    pub const PRIORITY: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Up,
        Direction::Down,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::Up => "up",
                Direction::Down => "down",
                Direction::Left => "left",
                Direction::Right => "right",
            }
        )
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(anyhow::anyhow!("Invalid direction: {}", s)),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl NodeReference for Point {}

impl Point {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The neighboring point one step in `direction`, `None` if that would
    /// leave the non-negative coordinate space. Grid bounds are not checked.
    pub fn adjacent(self, direction: Direction) -> Option<Point> {
        match direction {
            Direction::Right => Some(Point::new(self.row, self.col + 1)),
            Direction::Left => self.col.checked_sub(1).map(|col| Point::new(self.row, col)),
            Direction::Up => self.row.checked_sub(1).map(|row| Point::new(row, self.col)),
            Direction::Down => Some(Point::new(self.row + 1, self.col)),
        }
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Reasons a list of cell codes does not describe a usable maze
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    #[error("Maze dimensions {rows}x{columns} are empty or too large")]
    Dimensions { rows: usize, columns: usize },

    #[error("Expected {expected} cells for the given dimensions but got {actual}")]
    CellCount { expected: usize, actual: usize },

    #[error("Maze has no start cell")]
    MissingStart,

    #[error("Maze has no end cell")]
    MissingEnd,

    #[error("Maze has more than one start cell: {first} and {second}")]
    DuplicateStart { first: Point, second: Point },

    #[error("Maze has more than one end cell: {first} and {second}")]
    DuplicateEnd { first: Point, second: Point },

    #[error("Cell {position} has a {direction} door leading outside the maze")]
    DoorOffGrid {
        position: Point,
        direction: Direction,
    },
}

/// A rectangular grid of decoded cells with a known start, end and lives budget.
///
/// A `Maze` never changes after it is built, the search state lives in a
/// separate [`PathFinder`] so the same maze can be solved repeatedly.
#[derive(Debug, Clone)]
pub struct Maze {
    rows: usize,
    columns: usize,
    cells: Vec<Vec<Cell>>,
    start: Point,
    end: Point,
    mines: Vec<Point>,
    lives: u32,
}

impl Maze {
    /// Build a maze from `rows * columns` cell codes given in row-major order.
    pub fn build(rows: usize, columns: usize, codes: &[u32]) -> Result<Self, MazeError> {
        let expected = match rows.checked_mul(columns) {
            Some(expected) if expected > 0 => expected,
            _ => return Err(MazeError::Dimensions { rows, columns }),
        };
        if codes.len() != expected {
            return Err(MazeError::CellCount {
                expected,
                actual: codes.len(),
            });
        }

        // sized from the codes actually given, which match rows * columns by now
        let mut cells = Vec::with_capacity(codes.len() / columns);
        let mut start: Option<Point> = None;
        let mut end: Option<Point> = None;
        let mut mines = Vec::new();

        for (row, chunk) in codes.chunks(columns).enumerate() {
            let mut decoded = Vec::with_capacity(columns);
            for (col, code) in chunk.iter().enumerate() {
                let cell = decode_cell(*code);
                let position = Point::new(row, col);

                if cell.is_start {
                    if let Some(first) = start {
                        return Err(MazeError::DuplicateStart {
                            first,
                            second: position,
                        });
                    }
                    start = Some(position);
                }
                if cell.is_end {
                    if let Some(first) = end {
                        return Err(MazeError::DuplicateEnd {
                            first,
                            second: position,
                        });
                    }
                    end = Some(position);
                }
                if cell.is_mine {
                    mines.push(position);
                }

                decoded.push(cell);
            }
            cells.push(decoded);
        }

        let start = start.ok_or(MazeError::MissingStart)?;
        let end = end.ok_or(MazeError::MissingEnd)?;

        let maze = Self {
            rows,
            columns,
            cells,
            start,
            end,
            mines,
            lives: DEFAULT_LIVES,
        };
        maze.check_doors()?;

        Ok(maze)
    }

    /// Replace the lives budget used when solving this maze
    pub fn with_lives(mut self, lives: u32) -> Self {
        self.lives = lives;
        self
    }

    // every open door must lead to a cell inside the grid
    fn check_doors(&self) -> Result<(), MazeError> {
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let position = Point::new(row, col);
                for direction in cell.doors() {
                    match position.adjacent(direction) {
                        Some(next) if self.contains(next) => {}
                        _ => return Err(MazeError::DoorOffGrid { position, direction }),
                    }
                }
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    /// Mine positions in row-major order
    pub fn mines(&self) -> &[Point] {
        &self.mines
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn contains(&self, point: Point) -> bool {
        point.row < self.rows && point.col < self.columns
    }

    pub fn cell(&self, point: Point) -> Option<&Cell> {
        self.cells.get(point.row).and_then(|row| row.get(point.col))
    }

    /// Solve with the default search settings and return the moves from start
    /// to end. The list is empty when no route survives the lives budget.
    pub fn solve(&self) -> Result<Vec<Direction>, SearchError> {
        match self.solve_with(&SearchConfig::default())? {
            PathFinderState::PathFound(result) => Ok(result.moves),
            PathFinderState::NoPathFound => Ok(Vec::new()),
            PathFinderState::Computing => unreachable!("finish only returns a finished search"),
        }
    }

    /// Run the search from the end cell back to the start cell.
    pub fn solve_with(&self, config: &SearchConfig) -> Result<PathFinderState<Point>, SearchError> {
        PathFinder::new(self.end, self.start, self.lives, config.clone()).finish(self)
    }
}

impl MapTrait for Maze {
    type Reference = Point;

    fn is_valid(&self, node: Self::Reference) -> bool {
        self.contains(node)
    }

    fn is_mine(&self, node: Self::Reference) -> bool {
        self.cell(node).is_some_and(|cell| cell.is_mine)
    }

    fn neighbors_of(
        &self,
        node: Self::Reference,
    ) -> impl Iterator<Item = (Self::Reference, Direction)> {
        let mut points = Vec::with_capacity(4);

        if let Some(cell) = self.cell(node) {
            for direction in cell.doors() {
                if let Some(next) = node.adjacent(direction) {
                    points.push((next, direction));
                }
            }
        }

        // doors were checked against the bounds when the maze was built
        debug_assert!(points.iter().all(|(p, _)| self.contains(*p)));

        points.into_iter()
    }
}

impl Display for Maze {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.cells {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            write!(f, "\n")?;
        }

        Ok(())
    }
}
