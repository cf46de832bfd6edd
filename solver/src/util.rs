use std::{fs, path::Path, str::FromStr};

use anyhow::{anyhow, Context};

use crate::grid::{Maze, MazeError};

/// One maze as written in a maze file: `(rows,cols)-[c1,c2,...,cN]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeDescription {
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<u32>,
}

impl MazeDescription {
    pub fn build(&self) -> Result<Maze, MazeError> {
        Maze::build(self.rows, self.columns, &self.cells)
    }
}

impl FromStr for MazeDescription {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (size, cells) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("Missing '-' between size and cells in: {}", s))?;

        let size = size
            .trim()
            .strip_prefix('(')
            .and_then(|size| size.strip_suffix(')'))
            .ok_or_else(|| anyhow!("Size must be written as (rows,cols): {}", size))?;
        let (rows, columns) = size
            .split_once(',')
            .ok_or_else(|| anyhow!("Size must be written as (rows,cols): {}", size))?;
        let rows = rows
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid row count: {}", rows))?;
        let columns = columns
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid column count: {}", columns))?;

        let cells = cells
            .trim()
            .strip_prefix('[')
            .and_then(|cells| cells.strip_suffix(']'))
            .ok_or_else(|| anyhow!("Cells must be written as [c1,c2,...]: {}", cells))?;
        let cells = if cells.trim().is_empty() {
            Vec::new()
        } else {
            cells
                .split(',')
                .map(|code| {
                    code.trim()
                        .parse::<u32>()
                        .with_context(|| format!("Invalid cell code: {}", code))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(MazeDescription {
            rows,
            columns,
            cells,
        })
    }
}

/// Parse every non-blank line of `text`, in order
pub fn parse_descriptions(text: &str) -> Result<Vec<MazeDescription>, anyhow::Error> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.parse::<MazeDescription>()
                .with_context(|| format!("Failed to parse maze on line {}", index + 1))
        })
        .collect()
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<MazeDescription>, anyhow::Error> {
    let path = path.as_ref();
    log::debug!("Reading input file at {}", path.display());

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read maze file {}", path.display()))?;

    parse_descriptions(&text)
}
