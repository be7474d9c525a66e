//! Perfect-maze generation with hazard placement.
//!
//! Mazes are carved with a randomized depth-first backtracker that moves two
//! cells at a time, so corridors are one cell wide and the carved cells form
//! a spanning tree rooted at `(0, 0)`. After carving, the exit and start
//! cells are forced open and wired into the tree, and a sparse random subset
//! of the remaining walls is marked as hazardous.
//!
//! All randomness comes from the caller's [`Rng`], so a seeded generator
//! yields a reproducible maze.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Probability that any given wall cell becomes a hazard.
pub const DEFAULT_HAZARD_PROBABILITY: f64 = 0.2;

/// Largest width or height accepted by default.
pub const DEFAULT_MAX_DIMENSION: usize = 4096;

/// Lattice steps explored from each carved cell.
const CARVE_STEPS: [(isize, isize); 4] = [(2, 0), (-2, 0), (0, 2), (0, -2)];

/// Orthogonal neighbour offsets.
const ADJACENT: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// A maze coordinate, `x` across and `y` down. Serialised as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position(pub usize, pub usize);

impl Position {
    /// Create a position from its column and row.
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self(x, y)
    }

    /// Column index.
    #[must_use]
    pub const fn x(self) -> usize {
        self.0
    }

    /// Row index.
    #[must_use]
    pub const fn y(self) -> usize {
        self.1
    }

    /// The cell halfway between `self` and `other`.
    const fn midpoint(self, other: Self) -> Self {
        Self((self.0 + other.0) / 2, (self.1 + other.1) / 2)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// A single maze cell. On the wire a wall is `1` and a path is `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    /// Open floor the player can walk on.
    Path,
    /// Solid wall.
    Wall,
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Path => 0,
            Cell::Wall => 1,
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Path),
            1 => Ok(Cell::Wall),
            other => Err(format!("invalid maze cell {other}, expected 0 or 1")),
        }
    }
}

/// A rectangular grid of cells, stored row by row (`rows[y][x]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Maze {
    rows: Vec<Vec<Cell>>,
}

impl Maze {
    fn filled(width: usize, height: usize, cell: Cell) -> Self {
        Self {
            rows: vec![vec![cell; width]; height],
        }
    }

    /// Build a maze from explicit rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// The rows of the maze, top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// The cell at `position`, or `None` if it lies outside the grid.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<Cell> {
        self.rows
            .get(position.y())
            .and_then(|row| row.get(position.x()))
            .copied()
    }

    /// Returns `true` if `position` is inside the grid and open.
    #[must_use]
    pub fn is_path(&self, position: Position) -> bool {
        self.get(position) == Some(Cell::Path)
    }

    /// Returns `true` if `position` is inside the grid.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.x() < self.width() && position.y() < self.height()
    }

    /// In-bounds orthogonal neighbours of `position`.
    pub fn neighbours(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        ADJACENT
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(position, dx, dy))
    }

    /// Number of open cells.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|&&cell| cell == Cell::Path)
            .count()
    }

    /// All open cells reachable from `start` through open cells.
    ///
    /// Empty if `start` itself is not open.
    #[must_use]
    pub fn reachable_from(&self, start: Position) -> HashSet<Position> {
        let mut seen = HashSet::new();
        if !self.is_path(start) {
            return seen;
        }
        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some(cell) = queue.pop_front() {
            for next in self.neighbours(cell) {
                if self.is_path(next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    fn offset(&self, position: Position, dx: isize, dy: isize) -> Option<Position> {
        let x = position.x().checked_add_signed(dx)?;
        let y = position.y().checked_add_signed(dy)?;
        let moved = Position(x, y);
        self.contains(moved).then_some(moved)
    }

    fn set(&mut self, position: Position, cell: Cell) {
        if let Some(slot) = self
            .rows
            .get_mut(position.y())
            .and_then(|row| row.get_mut(position.x()))
        {
            *slot = cell;
        }
    }

    /// Open `target` and, if it has no open neighbour, carve the shortest
    /// corridor from it to the nearest open cell.
    fn open_connected(&mut self, target: Position) {
        if self.is_path(target) {
            return;
        }
        let mut parents: HashMap<Position, Position> = HashMap::from([(target, target)]);
        let mut queue = VecDeque::from([target]);
        while let Some(cell) = queue.pop_front() {
            if self.neighbours(cell).any(|next| self.is_path(next)) {
                let mut step = cell;
                while step != target {
                    self.set(step, Cell::Path);
                    step = parents[&step];
                }
                break;
            }
            let fresh: Vec<Position> = self
                .neighbours(cell)
                .filter(|next| !parents.contains_key(next))
                .collect();
            for next in fresh {
                parents.insert(next, cell);
                queue.push_back(next);
            }
        }
        self.set(target, Cell::Path);
    }
}

/// A request for a new maze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeRequest {
    /// Maze width in cells. Must be positive.
    pub width: i64,
    /// Maze height in cells. Must be positive.
    pub height: i64,
    /// Cell the player must reach.
    pub exit_position: Position,
    /// Cell the player starts on.
    pub start_position: Position,
}

impl MazeRequest {
    /// Create a request with explicit exit and start cells.
    #[must_use]
    pub fn new(width: i64, height: i64, exit_position: Position, start_position: Position) -> Self {
        Self {
            width,
            height,
            exit_position,
            start_position,
        }
    }

    /// The layout used by the LED-matrix clients: exit in the bottom-left
    /// corner, start in the top-right corner.
    #[must_use]
    pub fn corner_to_corner(width: usize, height: usize) -> Self {
        Self {
            width: i64::try_from(width).unwrap_or(i64::MAX),
            height: i64::try_from(height).unwrap_or(i64::MAX),
            exit_position: Position(0, height.saturating_sub(1)),
            start_position: Position(width.saturating_sub(1), 0),
        }
    }

    /// Check the preconditions and return the grid size as `(width, height)`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidDimensions`] for a non-positive size,
    /// [`GameError::TooLarge`] if either side exceeds `max_dimension`, and
    /// [`GameError::OutOfBounds`] if the exit or start lies outside the grid.
    pub fn validate(&self, max_dimension: usize) -> Result<(usize, usize), GameError> {
        let invalid = || GameError::InvalidDimensions {
            width: self.width,
            height: self.height,
        };
        if self.width <= 0 || self.height <= 0 {
            return Err(invalid());
        }
        let limit = i64::try_from(max_dimension).unwrap_or(i64::MAX);
        if self.width > limit || self.height > limit {
            return Err(GameError::TooLarge {
                width: self.width,
                height: self.height,
                limit: max_dimension,
            });
        }
        let width = usize::try_from(self.width).map_err(|_| invalid())?;
        let height = usize::try_from(self.height).map_err(|_| invalid())?;

        for (role, position) in [("exit", self.exit_position), ("start", self.start_position)] {
            if position.x() >= width || position.y() >= height {
                return Err(GameError::OutOfBounds {
                    role,
                    position,
                    width,
                    height,
                });
            }
        }
        Ok((width, height))
    }
}

/// A generated maze and its hazard cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeResponse {
    /// The carved grid.
    pub maze: Maze,
    /// Wall cells that are dangerous to touch.
    pub hazards: BTreeSet<Position>,
}

/// Tunables for maze generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MazeConfig {
    /// Probability in `[0, 1]` that a wall cell becomes a hazard.
    pub hazard_probability: f64,
    /// Largest accepted width or height. Bounds the memory and time a single
    /// request can claim.
    pub max_dimension: usize,
}

impl MazeConfig {
    /// Override the hazard probability. Values are clamped to `[0, 1]`.
    #[must_use]
    pub fn with_hazard_probability(mut self, probability: f64) -> Self {
        self.hazard_probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    /// Override the size limit. A limit below one is raised to one.
    #[must_use]
    pub fn with_max_dimension(mut self, max_dimension: usize) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            hazard_probability: DEFAULT_HAZARD_PROBABILITY,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Generate a maze for `request`.
///
/// # Errors
///
/// Returns a [`GameError`] if the request fails [`MazeRequest::validate`].
pub fn generate<R: Rng + ?Sized>(
    request: &MazeRequest,
    config: &MazeConfig,
    rng: &mut R,
) -> Result<MazeResponse, GameError> {
    let (width, height) = request.validate(config.max_dimension)?;

    let mut maze = carve(width, height, rng);
    maze.open_connected(request.exit_position);
    maze.open_connected(request.start_position);

    let hazards = place_hazards(
        &maze,
        &[request.exit_position, request.start_position],
        config.hazard_probability,
        rng,
    );

    Ok(MazeResponse { maze, hazards })
}

/// Depth-first backtracker over the even-coordinate lattice.
fn carve<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Maze {
    let mut maze = Maze::filled(width, height, Cell::Wall);
    let mut stack = vec![Position(0, 0)];

    while let Some(&current) = stack.last() {
        maze.set(current, Cell::Path);

        let mut steps = CARVE_STEPS;
        steps.shuffle(rng);
        let next = steps
            .iter()
            .filter_map(|&(dx, dy)| maze.offset(current, dx, dy))
            .find(|&candidate| maze.get(candidate) == Some(Cell::Wall));

        match next {
            Some(next) => {
                maze.set(current.midpoint(next), Cell::Path);
                stack.push(next);
            }
            None => {
                stack.pop();
            }
        }
    }

    maze
}

/// Independent Bernoulli draw per remaining wall cell.
fn place_hazards<R: Rng + ?Sized>(
    maze: &Maze,
    excluded: &[Position],
    probability: f64,
    rng: &mut R,
) -> BTreeSet<Position> {
    let probability = probability.clamp(0.0, 1.0);
    let mut hazards = BTreeSet::new();
    for (y, row) in maze.rows().iter().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            let position = Position(x, y);
            if cell == Cell::Wall && rng.gen_bool(probability) && !excluded.contains(&position) {
                hazards.insert(position);
            }
        }
    }
    hazards
}
