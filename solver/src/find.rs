use std::{
    collections::{BTreeMap, HashSet, VecDeque},
    fmt::Debug,
    hash::Hash,
};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::Direction;

/// Supertrait that collects all the requirements on the NodeReference values
/// Must be copy, comparable, hashable and not references (hence 'static)
pub trait NodeReference: Copy + Eq + Hash + Debug + 'static {}

pub trait MapTrait {
    /// The type that can be used to reference nodes in the map
    type Reference: NodeReference;

    /// Check if the provided node reference is valid
    fn is_valid(&self, node: Self::Reference) -> bool;

    /// Whether entering this node costs a life
    fn is_mine(&self, node: Self::Reference) -> bool;

    /// Return an iterator over the nodes reachable through the open doors of the provided node,
    /// together with the door used, in the order they should be explored
    fn neighbors_of(
        &self,
        node: Self::Reference,
    ) -> impl Iterator<Item = (Self::Reference, Direction)>;
}

/// When the search stops looking for more routes
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// Stop as soon as any branch reaches the goal. The winner is the first
    /// route discovered in breadth-first order, which is not necessarily the
    /// shortest or the one that loses the fewest lives.
    #[default]
    FirstArrival,
    /// Explore every branch until the queue is empty, then pick the best
    /// route among all that reached the goal.
    Exhaustive,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub termination: Termination,
    /// Maximum number of branches alive at the same time, unlimited if `None`
    pub max_branches: Option<usize>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search needed more than {limit} live branches")]
    BranchLimitExceeded { limit: usize },
}

pub type BranchId = usize;

/// One candidate route, forked whenever a cell offers more than one way forward
#[derive(Clone, Debug)]
pub struct Branch<R: NodeReference> {
    pub lives_remaining: u32,
    /// Doors taken so far, in the order the search walked them
    pub path: Vec<Direction>,
    visited: Vec<R>,
    seen: HashSet<R>,
}

impl<R: NodeReference> Branch<R> {
    fn new(lives: u32) -> Self {
        Self {
            lives_remaining: lives,
            path: Vec::new(),
            visited: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn visit(&mut self, node: R) {
        if self.seen.insert(node) {
            self.visited.push(node);
        }
    }

    pub fn has_visited(&self, node: R) -> bool {
        self.seen.contains(&node)
    }

    /// Positions dequeued on this branch, oldest first
    pub fn visited(&self) -> &[R] {
        &self.visited
    }

    pub fn last_visited(&self) -> Option<R> {
        self.visited.last().copied()
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct PathResult<R> {
    /// Moves from the goal back to where the search began, i.e. from the
    /// maze start to the maze end when searching backwards
    pub moves: Vec<Direction>,
    /// Nodes visited by the winning branch, in search order
    pub trail: Vec<R>,
    pub start: R,
    pub goal: R,
    pub lives_remaining: u32,
    pub branch: BranchId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFinderState<R> {
    Computing,
    NoPathFound,
    PathFound(PathResult<R>),
}

impl<R> PathFinderState<R> {
    pub fn is_done(&self) -> bool {
        !matches!(self, PathFinderState::Computing)
    }
}

/// Reverse a path walked from the goal side and flip every door, giving the
/// moves as taken from the other end.
pub fn invert_path(path: &[Direction]) -> Vec<Direction> {
    path.iter().rev().map(|d| d.opposite()).collect()
}

/// Breadth-first search over doors that keeps a separate branch, with its own
/// lives counter, for every fork in the road.
#[derive(Debug)]
pub struct PathFinder<R: NodeReference, M: MapTrait<Reference = R>> {
    start: R,
    goal: R,
    config: SearchConfig,
    branches: BTreeMap<BranchId, Branch<R>>,
    next_id: BranchId,
    visit_list: VecDeque<(R, BranchId)>,
    state: PathFinderState<R>,
    _map: std::marker::PhantomData<M>,
}

impl<R: NodeReference, M: MapTrait<Reference = R>> PathFinder<R, M> {
    pub fn new(start: R, goal: R, lives: u32, config: SearchConfig) -> Self {
        Self {
            start,
            goal,
            config,
            branches: BTreeMap::from([(0, Branch::new(lives))]),
            next_id: 1,
            visit_list: VecDeque::from([(start, 0)]),
            state: PathFinderState::Computing,
            _map: std::marker::PhantomData,
        }
    }

    pub fn finish(mut self, map: &M) -> Result<PathFinderState<R>, SearchError> {
        loop {
            match self.step(map)? {
                PathFinderState::Computing => {}
                s => return Ok(s),
            }
        }
    }

    pub fn step(&mut self, map: &M) -> Result<PathFinderState<R>, SearchError> {
        if self.state.is_done() {
            return Ok(self.state.clone());
        }

        let Some((point, id)) = self.visit_list.pop_front() else {
            self.conclude();
            return Ok(self.state.clone());
        };

        let Some(branch) = self.branches.get_mut(&id) else {
            return Ok(self.state.clone());
        };

        branch.visit(point);

        if point == self.goal {
            debug!("branch {} reached the goal at {:?}", id, point);
            if self.config.termination == Termination::FirstArrival {
                self.conclude();
            }
            return Ok(self.state.clone());
        }

        if map.is_mine(point) {
            branch.lives_remaining = branch.lives_remaining.saturating_sub(1);
        }

        if branch.lives_remaining == 0 {
            debug!("branch {} ran out of lives at {:?}", id, point);
            self.branches.remove(&id);
            return Ok(self.state.clone());
        }

        let open: Vec<(R, Direction)> = map
            .neighbors_of(point)
            .filter(|(next, _)| map.is_valid(*next) && !branch.has_visited(*next))
            .collect();

        // the first open door extends the branch itself
        let Some(&(next, direction)) = open.first() else {
            return Ok(self.state.clone());
        };
        branch.path.push(direction);
        self.visit_list.push_back((next, id));

        if open.len() == 1 {
            return Ok(self.state.clone());
        }

        // every further door gets a copy of the branch without that first step
        let parent = branch.clone();
        for &(next, direction) in &open[1..] {
            let fork_id = self.fork(&parent)?;
            debug!("branch {} forked into {} going {}", id, fork_id, direction);

            if let Some(fork) = self.branches.get_mut(&fork_id) {
                fork.path.push(direction);
            }
            self.visit_list.push_back((next, fork_id));
        }

        Ok(self.state.clone())
    }

    fn fork(&mut self, parent: &Branch<R>) -> Result<BranchId, SearchError> {
        if let Some(limit) = self.config.max_branches {
            if self.branches.len() >= limit {
                return Err(SearchError::BranchLimitExceeded { limit });
            }
        }

        let mut fork = parent.clone();
        fork.path.pop();

        let id = self.next_id;
        self.next_id += 1;
        self.branches.insert(id, fork);

        Ok(id)
    }

    // drop every branch that did not end on the goal and pick the winner
    fn conclude(&mut self) {
        let goal = self.goal;
        self.branches
            .retain(|_, branch| branch.last_visited() == Some(goal));

        // fewest moves, then most lives left, then the oldest branch
        let winner = self.branches.iter().min_by_key(|(id, branch)| {
            (
                branch.path.len(),
                std::cmp::Reverse(branch.lives_remaining),
                **id,
            )
        });

        self.state = match winner {
            Some((id, branch)) => {
                debug!(
                    "branch {} wins with {} moves and {} lives left ({} candidates)",
                    id,
                    branch.path.len(),
                    branch.lives_remaining,
                    self.branches.len()
                );
                PathFinderState::PathFound(PathResult {
                    moves: invert_path(&branch.path),
                    trail: branch.visited.clone(),
                    start: self.start,
                    goal: self.goal,
                    lives_remaining: branch.lives_remaining,
                    branch: *id,
                })
            }
            None => {
                debug!("no branch reached the goal");
                PathFinderState::NoPathFound
            }
        };
    }

    pub fn state(&self) -> &PathFinderState<R> {
        &self.state
    }

    /// Branches that are still alive, keyed by id
    pub fn branches(&self) -> &BTreeMap<BranchId, Branch<R>> {
        &self.branches
    }

    pub fn start(&self) -> R {
        self.start
    }

    pub fn goal(&self) -> R {
        self.goal
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::grid::{Maze, Point};
    use Direction::*;

    fn create_example_maze() -> Maze {
        Maze::build(3, 3, &[34, 14, 12, 6, 77, 5, 1, 19, 9]).unwrap()
    }

    fn finder_for(maze: &Maze, config: SearchConfig) -> PathFinder<Point, Maze> {
        PathFinder::new(maze.end(), maze.start(), maze.lives(), config)
    }

    #[test]
    fn test_example_route() {
        let maze = create_example_maze();
        assert_eq!(maze.solve().unwrap(), vec![Up, Up, Left]);
    }

    #[test]
    fn test_example_route_one_life() {
        let maze = create_example_maze().with_lives(1);
        assert_eq!(maze.solve().unwrap(), vec![Right, Up, Up, Left, Left]);
    }

    #[test]
    fn test_example_result_details() {
        let maze = create_example_maze();

        let state = maze.solve_with(&SearchConfig::default()).unwrap();
        let PathFinderState::PathFound(result) = state else {
            panic!("expected a path");
        };

        // branch 2 forks off branch 1 at the mine and walks straight down
        assert_eq!(result.branch, 2);
        assert_eq!(result.lives_remaining, 2);
        assert_eq!(
            result.trail,
            vec![
                Point::new(0, 0),
                Point::new(0, 1),
                Point::new(1, 1),
                Point::new(2, 1)
            ]
        );
        assert_eq!(result.start, maze.end());
        assert_eq!(result.goal, maze.start());
    }

    #[test]
    fn test_first_arrival_stops_early() {
        let maze = create_example_maze();
        let mut finder = finder_for(&maze, SearchConfig::default());

        let mut steps = 0;
        while !finder.step(&maze).unwrap().is_done() {
            steps += 1;
        }

        // (0,0) (0,1) (0,2) (1,1) (1,2) (1,0) and then the start
        assert_eq!(steps, 6);
        // only the winner survives, the other branches were still on their way
        assert_eq!(finder.branches().len(), 1);
        assert!(finder.branches().contains_key(&2));
        assert!(matches!(finder.state(), PathFinderState::PathFound(_)));
    }

    #[test]
    fn test_step_after_done_is_stable() {
        let maze = create_example_maze();
        let mut finder = finder_for(&maze, SearchConfig::default());

        let done = loop {
            let state = finder.step(&maze).unwrap();
            if state.is_done() {
                break state;
            }
        };
        assert_eq!(finder.step(&maze).unwrap(), done);
    }

    #[test]
    fn test_exhaustive_picks_fewest_moves() {
        let config = SearchConfig {
            termination: Termination::Exhaustive,
            max_branches: None,
        };

        let maze = create_example_maze();
        let PathFinderState::PathFound(result) = maze.solve_with(&config).unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(result.moves, vec![Up, Up, Left]);
        assert_eq!(result.lives_remaining, 2);

        let maze = create_example_maze().with_lives(1);
        let PathFinderState::PathFound(result) = maze.solve_with(&config).unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(result.moves, vec![Right, Up, Up, Left, Left]);
        assert_eq!(result.lives_remaining, 1);
    }

    #[test]
    fn test_exhaustive_prefers_more_lives() {
        // two routes of equal length around a 2x3 block, the top one has a mine:
        //   E  M  .
        //   .  .  S
        let maze = Maze::build(
            2,
            3,
            &[32 + 2 + 4, 64 + 8 + 2, 8 + 4, 1 + 2, 8 + 2, 16 + 8 + 1],
        )
        .unwrap();
        let config = SearchConfig {
            termination: Termination::Exhaustive,
            max_branches: None,
        };

        let PathFinderState::PathFound(result) = maze.solve_with(&config).unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(result.lives_remaining, 3);
        assert_eq!(result.moves, vec![Left, Left, Up]);

        // breadth-first order reaches the goal through the mine first
        let PathFinderState::PathFound(result) = maze.solve_with(&SearchConfig::default()).unwrap()
        else {
            panic!("expected a path");
        };
        assert_eq!(result.lives_remaining, 2);
        assert_eq!(result.moves, vec![Up, Left, Left]);
    }

    #[test]
    fn test_no_route() {
        // the end is walled off from the start
        let maze = Maze::build(1, 2, &[32, 16]).unwrap();
        assert_eq!(
            maze.solve_with(&SearchConfig::default()).unwrap(),
            PathFinderState::NoPathFound
        );
        assert!(maze.solve().unwrap().is_empty());
    }

    #[test]
    fn test_lives_exhausted() {
        // the only route crosses two mines
        let maze = Maze::build(1, 4, &[32 + 2, 64 + 8 + 2, 64 + 8 + 2, 16 + 8]).unwrap();

        assert_eq!(maze.clone().with_lives(3).solve().unwrap(), vec![Left, Left, Left]);
        assert!(maze.clone().with_lives(2).solve().unwrap().is_empty());
        assert!(maze.with_lives(0).solve().unwrap().is_empty());
    }

    #[test]
    fn test_dead_branches_never_win() {
        let maze = create_example_maze().with_lives(1);
        let mut finder = finder_for(
            &maze,
            SearchConfig {
                termination: Termination::Exhaustive,
                max_branches: None,
            },
        );

        loop {
            if finder.step(&maze).unwrap().is_done() {
                break;
            }
            assert!(finder.branches().values().all(|b| b.lives_remaining > 0));
        }

        // branch 1 stepped on the mine with its only life
        assert!(!finder.branches().contains_key(&1));
        for branch in finder.branches().values() {
            assert_eq!(branch.last_visited(), Some(maze.start()));
        }
    }

    #[test]
    fn test_cycle_visits_each_point_once() {
        // a 3x3 grid with every inner door open, start and end on opposite corners
        let mut codes = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                let mut code = 0;
                if row > 0 {
                    code += 1;
                }
                if row < 2 {
                    code += 4;
                }
                if col > 0 {
                    code += 8;
                }
                if col < 2 {
                    code += 2;
                }
                codes.push(code);
            }
        }
        codes[0] += 32;
        codes[8] += 16;
        let maze = Maze::build(3, 3, &codes).unwrap();

        let config = SearchConfig {
            termination: Termination::Exhaustive,
            max_branches: None,
        };
        let mut finder = finder_for(&maze, config);
        while !finder.step(&maze).unwrap().is_done() {
            for branch in finder.branches().values() {
                let unique: HashSet<_> = branch.visited().iter().collect();
                assert_eq!(unique.len(), branch.visited().len());
            }
        }

        let PathFinderState::PathFound(result) = finder.state() else {
            panic!("expected a path");
        };
        assert_eq!(result.moves.len(), 4);
        assert_eq!(maze.solve().unwrap().len(), 4);
    }

    #[test]
    fn test_long_corridor_never_forks() {
        // a single row walked from the end on the right to the start on the left
        let length = 500;
        let mut codes = vec![8 + 2; length];
        codes[0] = 16 + 2;
        codes[length - 1] = 32 + 8;
        let maze = Maze::build(1, length, &codes).unwrap();

        let config = SearchConfig {
            termination: Termination::FirstArrival,
            max_branches: Some(1),
        };
        let PathFinderState::PathFound(result) = maze.solve_with(&config).unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(result.branch, 0);
        assert_eq!(result.moves, vec![Right; length - 1]);
        assert_eq!(result.trail.len(), length);
    }

    #[test]
    fn test_branch_limit() {
        let maze = create_example_maze();
        let config = SearchConfig {
            termination: Termination::FirstArrival,
            max_branches: Some(1),
        };
        assert_eq!(
            maze.solve_with(&config).unwrap_err(),
            SearchError::BranchLimitExceeded { limit: 1 }
        );

        let config = SearchConfig {
            termination: Termination::FirstArrival,
            max_branches: Some(3),
        };
        assert!(matches!(
            maze.solve_with(&config).unwrap(),
            PathFinderState::PathFound(_)
        ));
    }

    #[test]
    fn test_start_is_end() {
        let maze = Maze::build(1, 1, &[16 + 32]).unwrap();
        let PathFinderState::PathFound(result) = maze.solve_with(&SearchConfig::default()).unwrap()
        else {
            panic!("expected a path");
        };
        assert!(result.moves.is_empty());
        assert_eq!(result.trail, vec![Point::new(0, 0)]);
    }

    #[test]
    fn test_invert_path_involution() {
        let path = vec![Right, Down, Down, Left, Up];
        assert_eq!(invert_path(&path), vec![Down, Right, Up, Up, Left]);
        assert_eq!(invert_path(&invert_path(&path)), path);
        assert!(invert_path(&[]).is_empty());
    }
}
