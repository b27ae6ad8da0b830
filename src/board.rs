// location-bingo/src/board.rs
// This module handles the card state and the line detection logic for the bingo game.

use serde::{Deserialize, Serialize};

use crate::defs::{CELLCOUNT, FREE_CELL, GRIDCONFIG, LINECOUNT};
use crate::error::{BingoError, Result};

const SIDE: usize = GRIDCONFIG.cols;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Horizontal,
    Vertical,
    Diagonal,
}

impl LineKind {
    /// Single letter used as the reward code prefix.
    pub fn tag(self) -> char {
        match self {
            LineKind::Horizontal => 'H',
            LineKind::Vertical => 'V',
            LineKind::Diagonal => 'D',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LineKind::Horizontal => "horizontal",
            LineKind::Vertical => "vertical",
            LineKind::Diagonal => "diagonal",
        }
    }

    /// Anything that is not a row or a column name counts as a diagonal.
    pub fn from_name(name: &str) -> Self {
        match name {
            "horizontal" => LineKind::Horizontal,
            "vertical" => LineKind::Vertical,
            _ => LineKind::Diagonal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Line {
    pub kind: LineKind,
    pub index: u8,
    pub cells: [usize; SIDE],
}

// Rows first, then columns, then the two diagonals. The order is the tie-break
// when a single toggle completes several lines at once.
const fn build_lines() -> [Line; LINECOUNT] {
    let mut lines = [Line { kind: LineKind::Horizontal, index: 0, cells: [0; SIDE] }; LINECOUNT];

    let mut i = 0;
    while i < SIDE {
        lines[i].index = i as u8;
        lines[SIDE + i].kind = LineKind::Vertical;
        lines[SIDE + i].index = i as u8;

        let mut j = 0;
        while j < SIDE {
            lines[i].cells[j] = i * SIDE + j;
            lines[SIDE + i].cells[j] = j * SIDE + i;
            j += 1;
        }
        i += 1;
    }

    let main = 2 * SIDE;
    let anti = 2 * SIDE + 1;
    lines[main].kind = LineKind::Diagonal;
    lines[anti].kind = LineKind::Diagonal;
    lines[anti].index = 1;

    let mut j = 0;
    while j < SIDE {
        lines[main].cells[j] = j * (SIDE + 1);
        lines[anti].cells[j] = (j + 1) * (SIDE - 1);
        j += 1;
    }

    lines
}

pub const LINES: [Line; LINECOUNT] = build_lines();

// This struct represents the visited flags of the 25 cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BoardState([bool; CELLCOUNT]);

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Fresh card: only the free cell is visited.
    pub fn new() -> Self {
        let mut cells = [false; CELLCOUNT];
        cells[FREE_CELL] = true;
        BoardState(cells)
    }

    /// Builds a state from raw flags. The free cell is forced to visited.
    pub fn from_cells(mut cells: [bool; CELLCOUNT]) -> Self {
        cells[FREE_CELL] = true;
        BoardState(cells)
    }

    pub fn cells(&self) -> &[bool; CELLCOUNT] {
        &self.0
    }

    pub fn is_visited(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Returns a copy with `index` flipped. The free cell comes back unchanged.
    pub fn toggled(&self, index: usize) -> Result<Self> {
        if index >= CELLCOUNT {
            return Err(BingoError::CellOutOfRange(index));
        }
        let mut next = *self;
        if index != FREE_CELL {
            next.0[index] = !next.0[index];
        }
        Ok(next)
    }

    pub fn visited_count(&self) -> usize {
        self.0.iter().filter(|&&visited| visited).count()
    }

    pub fn progress_percent(&self) -> u8 {
        ((self.visited_count() * 100 + CELLCOUNT / 2) / CELLCOUNT) as u8
    }
}

/// Set of completed lines, one bit per entry of [`LINES`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompletedLines(u16);

impl CompletedLines {
    pub fn contains(&self, line: usize) -> bool {
        line < LINECOUNT && self.0 & (1 << line) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_strict_superset_of(&self, other: &CompletedLines) -> bool {
        self.0 & other.0 == other.0 && self.0 != other.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Line> + '_ {
        LINES.iter().enumerate().filter(|(i, _)| self.contains(*i)).map(|(_, line)| line)
    }

    /// First line, in enumeration order, present here but not in `before`.
    pub fn first_new_since(&self, before: &CompletedLines) -> Option<&'static Line> {
        let fresh = CompletedLines(self.0 & !before.0);
        fresh.iter().next()
    }
}

pub fn check_lines(state: &BoardState) -> CompletedLines {
    let mut bits = 0u16;
    for (i, line) in LINES.iter().enumerate() {
        if line.cells.iter().all(|&cell| state.is_visited(cell)) {
            bits |= 1 << i;
        }
    }
    CompletedLines(bits)
}
