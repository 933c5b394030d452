//! Grid primitives: positions, directions and cell types.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer coordinate into the grid. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring position one step in `dir`
    pub fn step(self, dir: Direction) -> Position {
        let (dx, dy) = dir.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four cardinal moves. `Up` decreases `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
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

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl FromStr for Direction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "north" | "n" => Ok(Direction::Up),
            "down" | "south" | "s" => Ok(Direction::Down),
            "left" | "west" | "w" => Ok(Direction::Left),
            "right" | "east" | "e" => Ok(Direction::Right),
            _ => Err(EngineError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cell type without per-session data. `Boundary` stands for off-grid targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Road,
    Home,
    Park,
    Supercharger,
    Water,
    Building,
    Boundary,
}

impl TileKind {
    pub fn is_passable(self) -> bool {
        matches!(
            self,
            TileKind::Road | TileKind::Home | TileKind::Park | TileKind::Supercharger
        )
    }

    pub fn is_charger(self) -> bool {
        matches!(self, TileKind::Home | TileKind::Supercharger)
    }

    /// Layout character used in map files
    pub fn symbol(self) -> char {
        match self {
            TileKind::Road => 'R',
            TileKind::Home => 'H',
            TileKind::Park => 'P',
            TileKind::Supercharger => 'S',
            TileKind::Water => 'W',
            TileKind::Building | TileKind::Boundary => 'B',
        }
    }

    pub fn from_symbol(c: char) -> Option<TileKind> {
        match c {
            'R' => Some(TileKind::Road),
            'H' => Some(TileKind::Home),
            'P' => Some(TileKind::Park),
            'S' => Some(TileKind::Supercharger),
            'W' => Some(TileKind::Water),
            'B' => Some(TileKind::Building),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TileKind::Road => "road",
            TileKind::Home => "home",
            TileKind::Park => "park",
            TileKind::Supercharger => "supercharger",
            TileKind::Water => "water",
            TileKind::Building => "building",
            TileKind::Boundary => "boundary",
        }
    }
}

impl FromStr for TileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "road" => Ok(TileKind::Road),
            "home" => Ok(TileKind::Home),
            "park" => Ok(TileKind::Park),
            "supercharger" => Ok(TileKind::Supercharger),
            "water" => Ok(TileKind::Water),
            "building" => Ok(TileKind::Building),
            other => Err(format!("unknown tile type '{}'", other)),
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grid cell. Only parks carry data, and their `visited` flag is owned by
/// the engine of a single session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Cell {
    Road,
    Home,
    Park { id: String, visited: bool },
    Supercharger,
    Water,
    Building,
}

impl Cell {
    /// Build a cell from its kind. Parks get `park_id`, other kinds ignore it.
    pub fn from_kind(kind: TileKind, park_id: impl FnOnce() -> String) -> Cell {
        match kind {
            TileKind::Road => Cell::Road,
            TileKind::Home => Cell::Home,
            TileKind::Park => Cell::Park {
                id: park_id(),
                visited: false,
            },
            TileKind::Supercharger => Cell::Supercharger,
            TileKind::Water => Cell::Water,
            TileKind::Building | TileKind::Boundary => Cell::Building,
        }
    }

    pub fn kind(&self) -> TileKind {
        match self {
            Cell::Road => TileKind::Road,
            Cell::Home => TileKind::Home,
            Cell::Park { .. } => TileKind::Park,
            Cell::Supercharger => TileKind::Supercharger,
            Cell::Water => TileKind::Water,
            Cell::Building => TileKind::Building,
        }
    }

    pub fn is_passable(&self) -> bool {
        self.kind().is_passable()
    }

    pub fn is_charger(&self) -> bool {
        self.kind().is_charger()
    }

    pub fn park_id(&self) -> Option<&str> {
        match self {
            Cell::Park { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Character for text renderings; visited parks show as a check mark.
    pub fn symbol(&self) -> char {
        match self {
            Cell::Park { visited: true, .. } => '✓',
            other => other.kind().symbol(),
        }
    }
}
