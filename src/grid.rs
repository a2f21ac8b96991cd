//! Grid engine: generation, same-colour flood fill, column compaction and selection.

use crate::block::{Block, Colour, ColourSource};
use crate::vlog;
use thiserror::Error;

/// (column, row) inside the grid. Row 0 is the bottom of a column.
pub type Position = (usize, usize);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("unknown colour {letter:?} on layout line {line}")]
    UnknownColour { letter: char, line: usize },
    #[error("layout line {line} has {len} blocks, expected {expected}")]
    RaggedRow {
        line: usize,
        len: usize,
        expected: usize,
    },
    #[error("column {column} has {len} rows, expected {expected}")]
    RaggedColumn {
        column: usize,
        len: usize,
        expected: usize,
    },
}

/// Outcome of one flood fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matches {
    /// Colour that was matched; None when no colour was given and no seed was inside the grid.
    pub colour: Option<Colour>,
    /// Positions whose block went from displayed to removed, in discovery order.
    pub removed: Vec<Position>,
    /// Frontier expansions performed; never more than the number of blocks.
    pub visited: usize,
    pub passes: usize,
}

impl Matches {
    fn new(colour: Option<Colour>) -> Self {
        Self {
            colour,
            removed: Vec::new(),
            visited: 0,
            passes: 0,
        }
    }
}

/// Width x height blocks stored column-major: `columns[x][y]`.
/// After compaction columns can be shorter than `height`; the missing top cells are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    columns: Vec<Vec<Block>>,
}

impl Grid {
    /// Fills every cell with a fresh block, pulling colours column by column, bottom to top.
    pub fn generate(
        width: usize,
        height: usize,
        colours: &mut (impl ColourSource + ?Sized),
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        let columns = (0..width)
            .map(|x| {
                (0..height)
                    .map(|y| Block::new(x, y, Some(colours.next_colour())))
                    .collect()
            })
            .collect();
        vlog!("generated {}x{} grid", width, height);
        Ok(Self {
            width,
            height,
            columns,
        })
    }

    /// Builds a grid from a known layout, `layout[x][y]`. Every column must have the same length.
    pub fn from_colours(layout: &[Vec<Colour>]) -> Result<Self, GridError> {
        let width = layout.len();
        let height = layout.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        if let Some((column, col)) = layout.iter().enumerate().find(|(_, c)| c.len() != height) {
            return Err(GridError::RaggedColumn {
                column,
                len: col.len(),
                expected: height,
            });
        }
        let columns = layout
            .iter()
            .enumerate()
            .map(|(x, col)| {
                col.iter()
                    .enumerate()
                    .map(|(y, &c)| Block::new(x, y, Some(c)))
                    .collect()
            })
            .collect();
        Ok(Self {
            width,
            height,
            columns,
        })
    }

    /// Parses a text layout: one line per row, top row first, one colour letter per block
    /// (see `Colour::from_letter`). Blank lines and whitespace inside a line are ignored.
    pub fn parse_layout(text: &str) -> Result<Self, GridError> {
        let mut rows: Vec<Vec<Colour>> = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let row = line
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| {
                    Colour::from_letter(c).ok_or(GridError::UnknownColour {
                        letter: c,
                        line: i + 1,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if row.is_empty() {
                continue;
            }
            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(GridError::RaggedRow {
                        line: i + 1,
                        len: row.len(),
                        expected: first.len(),
                    });
                }
            }
            rows.push(row);
        }
        let width = rows.first().map_or(0, Vec::len);
        let layout: Vec<Vec<Colour>> = (0..width)
            .map(|x| rows.iter().rev().map(|row| row[x]).collect())
            .collect();
        Self::from_colours(&layout)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn columns(&self) -> &[Vec<Block>] {
        &self.columns
    }

    /// Block stored at `(x, y)`, displayed or not. None outside the grid or above a column's top.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&Block> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.columns.get(x).and_then(|col| col.get(y))
    }

    #[inline]
    fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Block> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.columns.get_mut(x).and_then(|col| col.get_mut(y))
    }

    /// Number of displayed blocks.
    pub fn remaining(&self) -> usize {
        self.columns
            .iter()
            .flatten()
            .filter(|b| b.is_displayed())
            .count()
    }

    pub fn is_cleared(&self) -> bool {
        self.remaining() == 0
    }

    /// Up, down, right, left. Nothing wraps; cells outside the grid or a short column are skipped.
    fn neighbours(&self, x: usize, y: usize) -> impl Iterator<Item = Position> + '_ {
        let candidates = [
            y.checked_add(1).map(|ny| (x, ny)),
            y.checked_sub(1).map(|ny| (x, ny)),
            x.checked_add(1).map(|nx| (nx, y)),
            x.checked_sub(1).map(|nx| (nx, y)),
        ];
        candidates
            .into_iter()
            .flatten()
            .filter(move |&(nx, ny)| self.get(nx, ny).is_some())
    }

    /// Removes every block connected to `seeds` through orthogonal neighbours of `colour`
    /// (default: the first seed's colour), one frontier ring per pass.
    ///
    /// Seeds are always marked removed and always expanded, even if they were removed
    /// already, so surviving same-colour neighbours of a removed seed still match.
    /// Out-of-range seeds are skipped.
    pub fn find_connected_matches(
        &mut self,
        seeds: &[Position],
        colour: Option<Colour>,
    ) -> Matches {
        let colour = match colour
            .or_else(|| seeds.first().and_then(|&(x, y)| self.get(x, y)).map(Block::colour))
        {
            Some(c) => c,
            // No colour given and no seed to take one from: nothing can match.
            None => return Matches::new(None),
        };
        let mut matches = Matches::new(Some(colour));

        let mut frontier: Vec<Position> = Vec::with_capacity(seeds.len());
        for &(x, y) in seeds {
            if frontier.contains(&(x, y)) {
                continue;
            }
            if let Some(block) = self.get_mut(x, y) {
                if block.is_displayed() {
                    matches.removed.push((x, y));
                }
                block.remove();
                frontier.push((x, y));
            }
        }

        while !frontier.is_empty() {
            matches.passes += 1;
            matches.visited += frontier.len();

            let candidates: Vec<Position> = frontier
                .iter()
                .flat_map(|&(x, y)| self.neighbours(x, y))
                .collect();

            let mut next = Vec::new();
            for (x, y) in candidates {
                let Some(block) = self.get_mut(x, y) else {
                    continue;
                };
                if block.is_displayed() && block.colour() == colour {
                    block.remove();
                    matches.removed.push((x, y));
                    next.push((x, y));
                }
            }
            frontier = next;
        }
        matches
    }

    /// Drops removed blocks and renumbers survivors per column; relative order is kept.
    pub fn compact(&mut self) {
        for (x, col) in self.columns.iter_mut().enumerate() {
            col.retain(Block::is_displayed);
            for (y, block) in col.iter_mut().enumerate() {
                block.relocate(x, y);
            }
        }
    }

    /// Player selection: flood fill from `(x, y)` then compact.
    /// Returns None without touching the grid when the cell is outside the grid or empty.
    pub fn select_block(&mut self, x: usize, y: usize) -> Option<Matches> {
        if !self.get(x, y).is_some_and(Block::is_displayed) {
            vlog!("ignored selection at ({}, {}): no block", x, y);
            return None;
        }
        let matches = self.find_connected_matches(&[(x, y)], None);
        self.compact();
        vlog!(
            "selected ({}, {}): removed {} {} block(s), visited {}, {} pass(es), {} left",
            x,
            y,
            matches.removed.len(),
            matches.colour.map_or("-", Colour::name),
            matches.visited,
            matches.passes,
            self.remaining()
        );
        Some(matches)
    }
}
