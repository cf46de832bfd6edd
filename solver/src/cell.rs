use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::grid::Direction;

pub const MINE_VALUE: u32 = 64;
pub const END_VALUE: u32 = 32;
pub const START_VALUE: u32 = 16;
pub const LEFT_VALUE: u32 = 8;
pub const DOWN_VALUE: u32 = 4;
pub const RIGHT_VALUE: u32 = 2;
pub const UP_VALUE: u32 = 1;

/// A single decoded maze cell.
///
/// The flags are independent of each other, any combination can be encoded.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub is_mine: bool,
    pub is_start: bool,
    pub is_end: bool,
    pub door_up: bool,
    pub door_down: bool,
    pub door_left: bool,
    pub door_right: bool,
}

/// Decode a packed cell code. Bits outside the seven known masks are ignored.
pub fn decode_cell(code: u32) -> Cell {
    Cell {
        is_mine: code & MINE_VALUE != 0,
        is_start: code & START_VALUE != 0,
        is_end: code & END_VALUE != 0,
        door_up: code & UP_VALUE != 0,
        door_down: code & DOWN_VALUE != 0,
        door_left: code & LEFT_VALUE != 0,
        door_right: code & RIGHT_VALUE != 0,
    }
}

impl From<u32> for Cell {
    fn from(code: u32) -> Self {
        decode_cell(code)
    }
}

impl Cell {
    pub fn has_door(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.door_up,
            Direction::Down => self.door_down,
            Direction::Left => self.door_left,
            Direction::Right => self.door_right,
        }
    }

    /// The open doors of this cell, in search priority order
    pub fn doors(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::PRIORITY
            .into_iter()
            .filter(move |direction| self.has_door(*direction))
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            if self.is_start {
                "S"
            } else if self.is_end {
                "E"
            } else if self.is_mine {
                "X"
            } else {
                "."
            }
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_all_doors() {
        let expected = Cell {
            door_up: true,
            door_down: true,
            door_left: true,
            door_right: true,
            ..Default::default()
        };
        assert_eq!(decode_cell(15), expected);
    }

    #[test]
    fn test_mine_door_up() {
        let expected = Cell {
            is_mine: true,
            door_up: true,
            ..Default::default()
        };
        assert_eq!(decode_cell(65), expected);
    }

    #[test]
    fn test_start_left_up_door() {
        let expected = Cell {
            is_start: true,
            door_left: true,
            door_up: true,
            ..Default::default()
        };
        assert_eq!(decode_cell(25), expected);
    }

    #[test]
    fn test_end_right_door() {
        let expected = Cell {
            is_end: true,
            door_right: true,
            ..Default::default()
        };
        assert_eq!(Cell::from(34), expected);
    }

    #[test]
    fn test_mine_with_three_doors() {
        let expected = Cell {
            is_mine: true,
            door_left: true,
            door_down: true,
            door_up: true,
            ..Default::default()
        };
        assert_eq!(decode_cell(77), expected);
    }

    #[test]
    fn test_flags_match_bits() {
        for code in 0..128u32 {
            let cell = decode_cell(code);
            assert_eq!(cell.is_mine, code & 64 != 0);
            assert_eq!(cell.is_end, code & 32 != 0);
            assert_eq!(cell.is_start, code & 16 != 0);
            assert_eq!(cell.door_left, code & 8 != 0);
            assert_eq!(cell.door_down, code & 4 != 0);
            assert_eq!(cell.door_right, code & 2 != 0);
            assert_eq!(cell.door_up, code & 1 != 0);
        }
    }

    #[test]
    fn test_unknown_bits_ignored() {
        assert_eq!(decode_cell(128 + 15), decode_cell(15));
        assert_eq!(decode_cell(1024 + 77), decode_cell(77));
    }

    #[test]
    fn test_doors_in_priority_order() {
        let doors: Vec<Direction> = decode_cell(15).doors().collect();
        assert_eq!(
            doors,
            vec![
                Direction::Right,
                Direction::Left,
                Direction::Up,
                Direction::Down
            ]
        );
        assert_eq!(decode_cell(64).doors().count(), 0);
    }
}
