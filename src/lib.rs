use std::{
    collections::BTreeSet,
    error,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};

const GRASS: char = '.';
const ROCK: char = '*';

#[derive(Debug)]
pub enum Error {
    InvalidGridShape(usize, usize, usize),
    MissingDimension(&'static str),
    InvalidDimension(&'static str, String),
    InvalidChar(char, Position),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidGridShape(row_n, col_n, given_n) => write!(
                f,
                "Expect {} row(s) of {} square(s) in farm, given {} square(s).",
                row_n, col_n, given_n
            ),
            Error::MissingDimension(name) => write!(f, "Missing farm {} in input.", name),
            Error::InvalidDimension(name, s) => write!(
                f,
                "Invalid farm {}({}), expect an unsigned integer.",
                name, s
            ),
            Error::InvalidChar(c, pos) => {
                write!(f, "Invalid character({}) for square at {}.", c, pos)
            }
        }
    }
}

impl error::Error for Error {}

#[derive(Debug, Parser)]
pub struct CLIArgs {
    /// Farm description: width and height, then one symbol per square
    #[arg(default_value = "feedtime.in")]
    pub input_path: PathBuf,
    /// Where the size of the largest pasture is written
    #[arg(default_value = "feedtime.out")]
    pub output_path: PathBuf,
    /// Treat unknown square symbols as grass instead of rejecting them
    #[arg(long)]
    pub lenient: bool,
}

impl CLIArgs {
    pub fn symbol_policy(&self) -> SymbolPolicy {
        if self.lenient {
            SymbolPolicy::Lenient
        } else {
            SymbolPolicy::Strict
        }
    }
}

/// What the loader does with a square symbol that is neither grass nor rock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymbolPolicy {
    #[default]
    Strict,
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    r: usize,
    c: usize,
}

impl Position {
    pub fn new(r: usize, c: usize) -> Self {
        Self { r, c }
    }

    pub fn row(&self) -> usize {
        self.r
    }

    pub fn col(&self) -> usize {
        self.c
    }

    /// Squares around this one (diagonals included), clipped to a farm of
    /// `row_n` x `col_n` squares.
    pub fn neighbors(&self, row_n: usize, col_n: usize) -> impl Iterator<Item = Position> {
        let (r, c) = (self.r, self.c);
        let cols = c.saturating_sub(1)..(c + 2).min(col_n);
        (r.saturating_sub(1)..(r + 2).min(row_n))
            .flat_map(move |nr| cols.clone().map(move |nc| Position::new(nr, nc)))
            .filter(move |pos| pos.r != r || pos.c != c)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.r, self.c)
    }
}

/// Farm squares in row-major order, `true` for rock or already eaten grass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<bool>,
    row_n: usize,
    col_n: usize,
}

impl Grid {
    pub fn new(row_n: usize, col_n: usize, cells: Vec<bool>) -> Result<Self, Error> {
        if row_n.checked_mul(col_n) != Some(cells.len()) {
            return Err(Error::InvalidGridShape(row_n, col_n, cells.len()));
        }

        Ok(Self {
            cells,
            row_n,
            col_n,
        })
    }

    pub fn row_n(&self) -> usize {
        self.row_n
    }

    pub fn col_n(&self) -> usize {
        self.col_n
    }

    pub fn is_obstructed(&self, pos: &Position) -> Option<bool> {
        self.pos_to_ind(pos)
            .and_then(|ind| self.cells.get(ind))
            .copied()
    }

    /// Size of the largest pasture, 0 if there is no grass at all.
    ///
    /// Every square is marked as obstructed afterwards.
    pub fn max_region_size(&mut self) -> usize {
        let mut max_size = 0;
        self.scan_regions(|_, size| max_size = max_size.max(size));

        max_size
    }

    /// Sizes of all pastures, ordered by their first square in row-major order.
    ///
    /// Every square is marked as obstructed afterwards.
    pub fn region_sizes(&mut self) -> Vec<usize> {
        let mut sizes = Vec::new();
        self.scan_regions(|_, size| sizes.push(size));

        sizes
    }

    fn scan_regions<F: FnMut(&Position, usize)>(&mut self, mut on_region: F) {
        for r in 0..self.row_n {
            for c in 0..self.col_n {
                let pos = Position::new(r, c);
                if self.is_obstructed(&pos) == Some(false) {
                    let size = self.fill_region(&pos);
                    debug!("Found pasture of {} square(s) from {}.", size, pos);
                    on_region(&pos, size);
                }
            }
        }
    }

    fn fill_region(&mut self, start_pos: &Position) -> usize {
        let mut frontier = BTreeSet::from([*start_pos]);
        let mut size = 0;
        while let Some(cur_pos) = frontier.pop_first() {
            let Some(ind) = self.pos_to_ind(&cur_pos) else {
                continue;
            };
            if self.cells[ind] {
                continue;
            }

            self.cells[ind] = true;
            size += 1;
            frontier.extend(
                cur_pos
                    .neighbors(self.row_n, self.col_n)
                    .filter(|pos| self.is_obstructed(pos) == Some(false)),
            );
        }

        size
    }

    fn pos_to_ind(&self, pos: &Position) -> Option<usize> {
        if pos.r < self.row_n && pos.c < self.col_n {
            Some(pos.r * self.col_n + pos.c)
        } else {
            None
        }
    }
}

pub fn max_region_size(grid: &mut Grid) -> usize {
    grid.max_region_size()
}

#[derive(Debug)]
struct GridBuilder {
    cells: Vec<bool>,
    row_n: usize,
    col_n: usize,
    policy: SymbolPolicy,
    replaced_n: usize,
}

impl GridBuilder {
    pub fn new(row_n: usize, col_n: usize, policy: SymbolPolicy) -> Self {
        Self {
            cells: Vec::new(),
            row_n,
            col_n,
            policy,
            replaced_n: 0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.cells.len() >= self.row_n.saturating_mul(self.col_n)
    }

    pub fn add_symbol(&mut self, sym: char) -> Result<(), Error> {
        let obstructed = match sym {
            GRASS => false,
            ROCK => true,
            _ => match self.policy {
                SymbolPolicy::Strict => {
                    let ind = self.cells.len();
                    return Err(Error::InvalidChar(
                        sym,
                        Position::new(ind / self.col_n, ind % self.col_n),
                    ));
                }
                SymbolPolicy::Lenient => {
                    self.replaced_n += 1;
                    false
                }
            },
        };
        self.cells.push(obstructed);

        Ok(())
    }

    pub fn build(self) -> Result<Grid, Error> {
        if self.replaced_n > 0 {
            warn!(
                "Treated {} square(s) with unknown symbol as grass.",
                self.replaced_n
            );
        }

        Grid::new(self.row_n, self.col_n, self.cells)
    }
}

fn parse_dimension(token: Option<&str>, name: &'static str) -> Result<usize, Error> {
    let token = token.ok_or(Error::MissingDimension(name))?;
    token
        .parse::<usize>()
        .map_err(|_| Error::InvalidDimension(name, token.to_string()))
}

/// Parses width and height followed by one symbol per square, whitespace
/// between symbols is skipped.
pub fn parse_grid(text: &str, policy: SymbolPolicy) -> Result<Grid, Error> {
    let mut tokens = text.split_whitespace();
    let col_n = parse_dimension(tokens.next(), "width")?;
    let row_n = parse_dimension(tokens.next(), "height")?;
    let mut builder = GridBuilder::new(row_n, col_n, policy);
    let mut symbols = tokens.flat_map(str::chars);
    while !builder.is_full() {
        let Some(sym) = symbols.next() else {
            break;
        };
        builder.add_symbol(sym)?;
    }

    let ignored_n = symbols.count();
    if ignored_n > 0 {
        warn!(
            "Ignored {} symbol(s) after the last square of farm.",
            ignored_n
        );
    }

    builder.build()
}

pub fn read_grid<P: AsRef<Path>>(path: P, policy: SymbolPolicy) -> Result<Grid> {
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read given file({}).", path.as_ref().display()))?;
    let grid = parse_grid(&text, policy)?;
    info!(
        "Loaded farm of {} row(s) and {} column(s) from {}.",
        grid.row_n(),
        grid.col_n(),
        path.as_ref().display()
    );

    Ok(grid)
}

pub fn write_result<P: AsRef<Path>>(path: P, size: usize) -> Result<()> {
    fs::write(&path, size.to_string()).with_context(|| {
        format!(
            "Failed to write result to given file({}).",
            path.as_ref().display()
        )
    })?;
    info!("Wrote result {} to {}.", size, path.as_ref().display());

    Ok(())
}
