//! Block: one grid cell's colour, occupancy and position. Also the colour palette and colour sources.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// Block colours. The first four form the classic palette; high colour mode adds magenta and cyan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Colour {
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
}

impl Colour {
    pub const CLASSIC: [Self; 4] = [Self::Red, Self::Green, Self::Blue, Self::Yellow];
    pub const ALL: [Self; 6] = [
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Magenta,
        Self::Cyan,
    ];

    /// Palette used for new grids.
    pub fn palette(high_color: bool) -> &'static [Self] {
        if high_color { &Self::ALL } else { &Self::CLASSIC }
    }

    /// Index into theme colour tables (0..6).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Yellow => 3,
            Self::Magenta => 4,
            Self::Cyan => 5,
        }
    }

    /// Layout file letter: R G B Y M C, either case.
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(Self::Red),
            'G' => Some(Self::Green),
            'B' => Some(Self::Blue),
            'Y' => Some(Self::Yellow),
            'M' => Some(Self::Magenta),
            'C' => Some(Self::Cyan),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
        }
    }
}

/// Produces one palette colour per call. Grids take one of these so tests can pin the layout.
pub trait ColourSource {
    fn next_colour(&mut self) -> Colour;
}

impl<F: FnMut() -> Colour> ColourSource for F {
    fn next_colour(&mut self) -> Colour {
        self()
    }
}

/// Uniform random colours from a palette.
#[derive(Debug, Clone)]
pub struct RandomColours<R> {
    rng: R,
    palette: &'static [Colour],
}

impl RandomColours<ThreadRng> {
    pub fn new(palette: &'static [Colour]) -> Self {
        Self {
            rng: rand::thread_rng(),
            palette,
        }
    }
}

impl RandomColours<StdRng> {
    /// Reproducible colours: the same seed and palette always yield the same sequence.
    pub fn seeded(seed: u64, palette: &'static [Colour]) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            palette,
        }
    }
}

impl<R: Rng> ColourSource for RandomColours<R> {
    fn next_colour(&mut self) -> Colour {
        self.palette[self.rng.gen_range(0..self.palette.len())]
    }
}

/// One cell of the grid. `display == false` means removed and waiting for compaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    x: usize,
    y: usize,
    colour: Colour,
    display: bool,
}

impl Block {
    /// New occupied block. Without a colour, one is drawn at random from the classic palette.
    pub fn new(x: usize, y: usize, colour: Option<Colour>) -> Self {
        let colour =
            colour.unwrap_or_else(|| RandomColours::new(&Colour::CLASSIC).next_colour());
        Self {
            x,
            y,
            colour,
            display: true,
        }
    }

    /// Marks the block removed. Calling it again is a no-op.
    #[inline]
    pub fn remove(&mut self) {
        self.display = false;
    }

    /// Overwrites the stored position. Bounds are the caller's problem.
    #[inline]
    pub fn relocate(&mut self, x: usize, y: usize) {
        self.x = x;
        self.y = y;
    }

    #[inline]
    pub fn x(&self) -> usize {
        self.x
    }

    #[inline]
    pub fn y(&self) -> usize {
        self.y
    }

    #[inline]
    pub fn colour(&self) -> Colour {
        self.colour
    }

    #[inline]
    pub fn is_displayed(&self) -> bool {
        self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_block_is_displayed() {
        let b = Block::new(2, 3, Some(Colour::Blue));
        assert_eq!((b.x(), b.y()), (2, 3));
        assert_eq!(b.colour(), Colour::Blue);
        assert!(b.is_displayed());
    }

    #[test]
    fn test_new_block_without_colour_uses_classic_palette() {
        for _ in 0..50 {
            let b = Block::new(0, 0, None);
            assert!(Colour::CLASSIC.contains(&b.colour()));
        }
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut b = Block::new(1, 1, Some(Colour::Red));
        b.remove();
        let once = b.clone();
        b.remove();
        assert!(!b.is_displayed());
        assert_eq!(b, once);
    }

    #[test]
    fn test_relocate_keeps_colour_and_display() {
        let mut b = Block::new(4, 4, Some(Colour::Green));
        b.relocate(4, 0);
        assert_eq!((b.x(), b.y()), (4, 0));
        assert_eq!(b.colour(), Colour::Green);
        assert!(b.is_displayed());

        b.remove();
        b.relocate(9, 9);
        assert!(!b.is_displayed());
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = RandomColours::seeded(42, &Colour::ALL);
        let mut b = RandomColours::seeded(42, &Colour::ALL);
        let xs: Vec<Colour> = (0..32).map(|_| a.next_colour()).collect();
        let ys: Vec<Colour> = (0..32).map(|_| b.next_colour()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_random_source_stays_in_palette() {
        let mut src = RandomColours::seeded(7, &Colour::CLASSIC);
        for _ in 0..200 {
            let c = src.next_colour();
            assert!(Colour::CLASSIC.contains(&c));
            assert!(c.index() < 4);
        }
    }

    #[test]
    fn test_closure_is_a_colour_source() {
        let mut seq = [Colour::Cyan, Colour::Magenta].into_iter().cycle();
        let mut src = move || seq.next().unwrap_or(Colour::Red);
        assert_eq!(src.next_colour(), Colour::Cyan);
        assert_eq!(src.next_colour(), Colour::Magenta);
        assert_eq!(src.next_colour(), Colour::Cyan);
    }

    #[test]
    fn test_from_letter() {
        assert_eq!(Colour::from_letter('r'), Some(Colour::Red));
        assert_eq!(Colour::from_letter('C'), Some(Colour::Cyan));
        assert_eq!(Colour::from_letter('x'), None);
    }

    #[test]
    fn test_palette_selection() {
        assert_eq!(Colour::palette(false).len(), 4);
        assert_eq!(Colour::palette(true).len(), 6);
        for (i, c) in Colour::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }
}
