use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use serde::Serialize;
use solver::{util, Direction, PathFinderState, PathResult, Point, Termination};

use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "maze-solver")]
#[command(author, version, about = "Find a way through mazes without running out of lives")]
pub struct Cli {
    /// File with one maze per line, written as (rows,cols)-[c1,c2,...]
    pub file: PathBuf,

    /// JSON settings file, command line flags take precedence
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Lives per maze, every mine costs one and a route ends when none are left
    #[arg(long, short)]
    pub lives: Option<u32>,

    /// When to stop searching
    #[arg(long, value_enum)]
    pub termination: Option<TerminationArg>,

    /// Give up when more branches than this are alive at once
    #[arg(long)]
    pub max_branches: Option<usize>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TerminationArg {
    /// Take the first route that reaches the start
    FirstArrival,
    /// Explore everything and keep the shortest route
    Exhaustive,
}

impl From<TerminationArg> for Termination {
    fn from(arg: TerminationArg) -> Self {
        match arg {
            TerminationArg::FirstArrival => Termination::FirstArrival,
            TerminationArg::Exhaustive => Termination::Exhaustive,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    maze: usize,
    moves: Option<&'a [Direction]>,
    lives_remaining: Option<u32>,
}

impl Cli {
    /// Settings from the config file, if any, overridden by the flags
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(lives) = self.lives {
            settings.lives = lives;
        }
        if let Some(termination) = self.termination {
            settings.search.termination = termination.into();
        }
        if let Some(limit) = self.max_branches {
            settings.search.max_branches = Some(limit);
        }

        Ok(settings)
    }
}

fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render(format: OutputFormat, maze: usize, result: Option<&PathResult<Point>>) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => {
            let moves = result
                .map(|r| {
                    r.moves
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            format!("[{}]", moves)
        }
        OutputFormat::Json => serde_json::to_string(&Report {
            maze,
            moves: result.map(|r| r.moves.as_slice()),
            lives_remaining: result.map(|r| r.lives_remaining),
        })?,
    })
}

/// The route found for a finished search, `None` when the maze has no way through
fn outcome(state: PathFinderState<Point>, maze: usize) -> Result<Option<PathResult<Point>>> {
    match state {
        PathFinderState::PathFound(result) => Ok(Some(result)),
        PathFinderState::NoPathFound => {
            warn!("No path found for maze {}", maze);
            Ok(None)
        }
        PathFinderState::Computing => {
            anyhow::bail!("Search for maze {} stopped before finishing", maze)
        }
    }
}

pub fn run(cli: &Cli) -> Result<()> {
    let settings = cli.settings()?;
    debug!("Using {:?}", settings);

    let descriptions = util::read_file(&cli.file)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut solved = 0;

    for (index, description) in descriptions.iter().enumerate() {
        let number = index + 1;
        debug!("{}", "*".repeat(50));
        debug!("Processing maze: {}", number);
        debug!("{}", "*".repeat(50));

        let maze = description
            .build()
            .with_context(|| format!("Maze {} is malformed", number))?
            .with_lives(settings.lives);

        debug!("Start position: {}", maze.start());
        debug!("End position: {}", maze.end());
        debug!("Mines located at: [{}]", format_points(maze.mines()));
        debug!("\n{}", maze);

        let state = maze
            .solve_with(&settings.search)
            .with_context(|| format!("Failed to solve maze {}", number))?;

        let result = outcome(state, number)?;
        if result.is_some() {
            solved += 1;
        }

        writeln!(out, "{}", render(cli.format, number, result.as_ref())?)?;
    }

    info!("Solved {} of {} mazes", solved, descriptions.len());

    Ok(())
}
