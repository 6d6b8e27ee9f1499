//! Core growth-painting engine shared across the colorgrowth workspace.
//!
//! A run grows colored regions outward from randomly chosen seed cells on a
//! fixed canvas. Every cell carries a lineage (`parent`) color inherited from
//! whichever neighbor recruited it; when the cell settles it perturbs that
//! color once and passes the result on to the neighbors it recruits in turn.
//! All randomness flows through a single seeded [`SmallRng`], consumed in a
//! fixed order (seed count when ranged, then seed positions, then per settled
//! cell: three channel offsets, the recruitment count, the neighbor sample),
//! so an identical configuration reproduces the identical canvas.

use rand::seq::index;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::mem;
use thiserror::Error;

/// Upper bound for the viscosity knob; values above it are clamped.
pub const VISCOSITY_MAX: u32 = 6;

/// RGB channels carried as floats so half-integer mutation offsets accumulate
/// exactly; range is [0, 255] with truncating conversion at the raster edge.
pub type ColorChannels = [f32; 3];

fn channel_triplet(color: [u8; 3]) -> ColorChannels {
    color.map(f32::from)
}

/// Errors raised while constructing a simulation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrowthError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// How many origin cells a run starts from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SeedCount {
    /// Exactly this many seeds.
    Fixed(u32),
    /// Drawn uniformly from the inclusive range at run start.
    Range { min: u32, max: u32 },
}

/// Static configuration for one painted image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthConfig {
    /// Canvas width in cells.
    pub width: u32,
    /// Canvas height in cells.
    pub height: u32,
    /// Per-channel mutation range: offsets are drawn from `[-rshift, rshift]`
    /// and scaled by one half before being applied.
    pub rshift: u32,
    /// Canvas color; unpainted cells keep it.
    pub background_color: [u8; 3],
    /// Lineage color assigned to seeds; `None` falls back to the background.
    pub color_mutation_base: Option<[u8; 3]>,
    /// Spread throttle in [0, 6]: 0 floods every open neighbor range, higher
    /// values recruit fewer neighbors per step and leave orphans behind.
    pub viscosity: u32,
    /// Number of seed cells, fixed or drawn from a range.
    pub seed_count: SeedCount,
    /// Optional RNG seed for reproducible canvases; `None` draws from entropy
    /// (the drawn value is recorded on the simulation).
    pub rng_seed: Option<u64>,
    /// Fraction of the canvas to paint before stopping, in (0, 1].
    pub stop_fill_fraction: f64,
    /// Revive paintable cells that were surrounded without being recruited.
    pub reclaim_orphans: bool,
    /// Emit an animation frame every N passes; 0 disables.
    pub frame_interval: u32,
    /// Emit a progress snapshot every N passes; 0 disables.
    pub snapshot_interval: u32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 200,
            rshift: 8,
            background_color: [252, 251, 201],
            color_mutation_base: None,
            viscosity: 4,
            seed_count: SeedCount::Range { min: 1, max: 13 },
            rng_seed: None,
            stop_fill_fraction: 0.64,
            reclaim_orphans: true,
            frame_interval: 0,
            snapshot_interval: 3,
        }
    }
}

impl GrowthConfig {
    /// Total number of cells on the canvas.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Settled-cell count at which the run stops (truncated product of the
    /// canvas size and the stop fraction).
    #[must_use]
    pub fn fill_quota(&self) -> usize {
        (self.cell_count() as f64 * self.stop_fill_fraction) as usize
    }

    fn validate(&self) -> Result<(), GrowthError> {
        if self.width == 0 || self.height == 0 {
            return Err(GrowthError::InvalidConfig(
                "canvas dimensions must be non-zero",
            ));
        }
        if !self.stop_fill_fraction.is_finite()
            || self.stop_fill_fraction <= 0.0
            || self.stop_fill_fraction > 1.0
        {
            return Err(GrowthError::InvalidConfig(
                "stop_fill_fraction must lie in (0, 1]",
            ));
        }
        let cells = self.cell_count();
        match self.seed_count {
            SeedCount::Fixed(0) => {
                return Err(GrowthError::InvalidConfig(
                    "seed count must be at least 1",
                ));
            }
            SeedCount::Fixed(n) if n as usize > cells => {
                return Err(GrowthError::InvalidConfig(
                    "seed count cannot exceed the cell count",
                ));
            }
            SeedCount::Fixed(_) => {}
            SeedCount::Range { min, max } => {
                if min == 0 {
                    return Err(GrowthError::InvalidConfig(
                        "seed range minimum must be at least 1",
                    ));
                }
                if min > max {
                    return Err(GrowthError::InvalidConfig(
                        "seed range minimum cannot exceed its maximum",
                    ));
                }
                if max as usize > cells {
                    return Err(GrowthError::InvalidConfig(
                        "seed range maximum cannot exceed the cell count",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns the configured RNG seed, drawing one from entropy if absent.
    fn resolved_seed(&self) -> u64 {
        match self.rng_seed {
            Some(seed) => seed,
            None => rand::random(),
        }
    }
}

/// Lifecycle tag for one canvas position. The three pools partition the
/// canvas at all times; a position moves `Unclaimed -> Active` exactly once
/// (recruitment) and `Active -> Settled` exactly once (mutation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Unclaimed,
    Active,
    Settled,
}

/// Per-position paint state.
#[derive(Debug, Clone)]
pub struct Cell {
    parent_color: ColorChannels,
    mutated_color: ColorChannels,
    open_neighbors: SmallVec<[u32; 8]>,
}

impl Cell {
    /// Lineage color inherited from the recruiting neighbor (or the seed
    /// base). Re-stamped by each settling neighbor while the cell is open.
    #[must_use]
    pub fn parent_color(&self) -> ColorChannels {
        self.parent_color
    }

    /// Final color, written once at settlement. Until then it equals the
    /// color the cell was constructed with, so unpainted cells raster as the
    /// canvas background.
    #[must_use]
    pub fn mutated_color(&self) -> ColorChannels {
        self.mutated_color
    }

    /// In-bounds Moore neighbors not yet claimed by any cell.
    #[must_use]
    pub fn open_neighbors(&self) -> &[u32] {
        &self.open_neighbors
    }
}

/// Fixed-size 2D canvas of cells, stored row-major.
#[derive(Debug, Clone)]
pub struct CanvasGrid {
    width: u32,
    height: u32,
    background: [u8; 3],
    cells: Vec<Cell>,
}

impl CanvasGrid {
    /// Construct a grid with every cell holding the background color and a
    /// fully open neighbor list.
    pub fn new(width: u32, height: u32, background: [u8; 3]) -> Result<Self, GrowthError> {
        if width == 0 || height == 0 {
            return Err(GrowthError::InvalidConfig(
                "canvas dimensions must be non-zero",
            ));
        }
        let base = channel_triplet(background);
        let len = width as usize * height as usize;
        let mut cells = Vec::with_capacity(len);
        for position in 0..len as u32 {
            cells.push(Cell {
                parent_color: base,
                mutated_color: base,
                open_neighbors: moore_neighbors(width, height, position),
            });
        }
        Ok(Self {
            width,
            height,
            background,
            cells,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn background(&self) -> [u8; 3] {
        self.background
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flat index for `(x, y)`.
    #[must_use]
    pub const fn index(&self, x: u32, y: u32) -> u32 {
        y * self.width + x
    }

    #[must_use]
    pub fn cell(&self, position: u32) -> &Cell {
        &self.cells[position as usize]
    }

    #[must_use]
    pub fn cell_at(&self, x: u32, y: u32) -> &Cell {
        self.cell(self.index(x, y))
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// In-bounds Moore neighborhood of a position, in fixed row-major order.
    /// Pure geometry; claim fan-out relies on it so no second adjacency list
    /// is stored.
    #[must_use]
    pub fn neighbor_indices(&self, position: u32) -> SmallVec<[u32; 8]> {
        moore_neighbors(self.width, self.height, position)
    }
}

fn moore_neighbors(width: u32, height: u32, position: u32) -> SmallVec<[u32; 8]> {
    let x = i64::from(position % width);
    let y = i64::from(position / width);
    let mut neighbors = SmallVec::new();
    for dy in -1..=1i64 {
        for dx in -1..=1i64 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
                continue;
            }
            neighbors.push(ny as u32 * width + nx as u32);
        }
    }
    neighbors
}

/// Usable upper bound for the recruitment-count draw. Nonzero viscosity
/// shrinks the range by its own value whenever more than one option would
/// remain; otherwise the full open-neighbor count stays usable.
fn usable_recruit_range(open: usize, viscosity: u32) -> usize {
    let throttled = open as i64 - i64::from(viscosity);
    if viscosity != 0 && throttled > 1 {
        throttled as usize
    } else {
        open
    }
}

/// Engine state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthPhase {
    /// Active cells remain to mutate and spread.
    Running,
    /// The active pool drained; orphan candidates are being promoted.
    DrainingOrphans,
    /// Terminal: quota reached or nothing left to revive.
    Done,
}

/// Progress report emitted after every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub pass: u64,
    pub painted: usize,
    pub fill_quota: usize,
    pub total_cells: usize,
    /// Cells recruited into the active pool during this pass.
    pub recruited: usize,
    /// Orphans promoted back to active at the end of this pass.
    pub reclaimed: usize,
    pub phase: GrowthPhase,
}

/// Observation sink invoked at pass boundaries. Hooks are purely
/// observational: dropping them changes no pixel of the final canvas.
pub trait GrowthObserver {
    /// Called once per pass with the progress summary.
    fn on_pass(&mut self, _summary: &PassSummary) {}

    /// Periodic request to raster the in-flight canvas as a progress image.
    fn on_snapshot(&mut self, _grid: &CanvasGrid) {}

    /// Request to raster animation frame `frame` from the in-flight canvas.
    fn on_frame(&mut self, _grid: &CanvasGrid, _frame: u32) {}

    /// Called exactly once when the run reaches its terminal phase.
    fn on_complete(&mut self, _grid: &CanvasGrid) {}
}

/// No-op observation sink.
#[derive(Debug, Default)]
pub struct NullObserver;

impl GrowthObserver for NullObserver {}

/// One color-growth run over a canvas.
///
/// Construction validates the configuration, clamps viscosity (recording an
/// advisory), builds the grid, and claims the seed cells; [`GrowthSim::run`]
/// then executes passes until the fill quota is met or the active pool and
/// the reclaimable orphan set are both exhausted.
pub struct GrowthSim {
    config: GrowthConfig,
    advisories: Vec<&'static str>,
    rng: SmallRng,
    rng_seed: u64,
    seed_count: u32,
    grid: CanvasGrid,
    status: Vec<CellStatus>,
    active: Vec<u32>,
    orphan_candidates: Vec<u32>,
    orphan_scratch: Vec<bool>,
    unclaimed: usize,
    painted: usize,
    fill_quota: usize,
    pass: u64,
    phase: GrowthPhase,
    frame_tick: u32,
    frame_index: u32,
    completed: bool,
    observer: Box<dyn GrowthObserver>,
}

impl fmt::Debug for GrowthSim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowthSim")
            .field("config", &self.config)
            .field("rng_seed", &self.rng_seed)
            .field("phase", &self.phase)
            .field("pass", &self.pass)
            .field("painted", &self.painted)
            .field("active", &self.active.len())
            .finish()
    }
}

impl GrowthSim {
    /// Instantiate a run with a no-op observer.
    pub fn new(config: GrowthConfig) -> Result<Self, GrowthError> {
        Self::with_observer(config, Box::new(NullObserver))
    }

    /// Instantiate a run with the supplied observation sink.
    pub fn with_observer(
        mut config: GrowthConfig,
        observer: Box<dyn GrowthObserver>,
    ) -> Result<Self, GrowthError> {
        config.validate()?;
        let mut advisories = Vec::new();
        if config.viscosity > VISCOSITY_MAX {
            config.viscosity = VISCOSITY_MAX;
            advisories.push("viscosity above 6 was clamped to 6");
        }

        let rng_seed = config.resolved_seed();
        let grid = CanvasGrid::new(config.width, config.height, config.background_color)?;
        let cells = grid.len();
        let fill_quota = config.fill_quota();
        let mut sim = Self {
            config,
            advisories,
            rng: SmallRng::seed_from_u64(rng_seed),
            rng_seed,
            seed_count: 0,
            grid,
            status: vec![CellStatus::Unclaimed; cells],
            active: Vec::new(),
            orphan_candidates: Vec::new(),
            orphan_scratch: vec![false; cells],
            unclaimed: cells,
            painted: 0,
            fill_quota,
            pass: 0,
            phase: GrowthPhase::Running,
            frame_tick: 0,
            frame_index: 0,
            completed: false,
            observer,
        };
        sim.seed_initial();
        Ok(sim)
    }

    /// Draw the seed count (when ranged) and claim that many distinct cells,
    /// selected uniformly without replacement. These are the first draws on
    /// the run RNG.
    fn seed_initial(&mut self) {
        let count = match self.config.seed_count {
            SeedCount::Fixed(n) => n,
            SeedCount::Range { min, max } => self.rng.random_range(min..=max),
        };
        self.seed_count = count;
        let base = channel_triplet(
            self.config
                .color_mutation_base
                .unwrap_or(self.config.background_color),
        );
        let mut pool: Vec<u32> = (0..self.grid.len() as u32).collect();
        for _ in 0..count {
            let slot = self.rng.random_range(0..pool.len());
            let position = pool.swap_remove(slot);
            self.claim(position, base);
        }
    }

    /// Recruit `position` into the active pool with the given lineage color.
    ///
    /// The sole `Unclaimed -> Active` write path: seeding, fan-out, and
    /// orphan promotion all pass through here. Removes the position from the
    /// open-neighbor list of every cell that can list it (its geometric
    /// neighbors), keeping the shared neighbor bookkeeping consistent in one
    /// place. No-op returning `false` when the position is already claimed.
    fn claim(&mut self, position: u32, parent: ColorChannels) -> bool {
        let slot = position as usize;
        if self.status[slot] != CellStatus::Unclaimed {
            return false;
        }
        self.status[slot] = CellStatus::Active;
        self.unclaimed -= 1;
        self.grid.cells[slot].parent_color = parent;
        for neighbor in self.grid.neighbor_indices(position) {
            self.grid.cells[neighbor as usize]
                .open_neighbors
                .retain(|open| *open != position);
        }
        self.active.push(position);
        true
    }

    /// Settle one active cell: perturb its lineage color, then recruit a
    /// viscosity-throttled random subset of its open neighbors with the
    /// freshly mutated color. Neighbors passed over become orphan candidates
    /// stamped with the same color. Returns the number recruited.
    fn grow_step(&mut self, position: u32) -> usize {
        let slot = position as usize;
        debug_assert_eq!(self.status[slot], CellStatus::Active);

        let parent = self.grid.cells[slot].parent_color;
        let shift = self.config.rshift as i32;
        let mut mutated = [0.0f32; 3];
        for (channel, value) in mutated.iter_mut().enumerate() {
            let offset = self.rng.random_range(-shift..=shift);
            *value = (parent[channel] + offset as f32 * 0.5).clamp(0.0, 255.0);
        }
        self.grid.cells[slot].mutated_color = mutated;
        self.status[slot] = CellStatus::Settled;
        self.painted += 1;

        let open = self.grid.cells[slot].open_neighbors.clone();
        let mut recruited = 0;
        if !open.is_empty() {
            let usable = usable_recruit_range(open.len(), self.config.viscosity);
            let count = self.rng.random_range(1..=usable);
            for pick in index::sample(&mut self.rng, open.len(), count).iter() {
                if self.claim(open[pick], mutated) {
                    recruited += 1;
                }
            }
        }

        // Whatever is still open was painted around without being recruited;
        // stamp the lineage now so a later reclamation carries a sensible
        // color.
        let passed_over = self.grid.cells[slot].open_neighbors.clone();
        for &orphan in passed_over.iter() {
            self.grid.cells[orphan as usize].parent_color = mutated;
            self.orphan_candidates.push(orphan);
        }
        recruited
    }

    /// Promote accumulated orphan candidates back into the active pool:
    /// deduplicate in first-seen order, skip anything no longer unclaimed,
    /// and claim the rest with their stamped lineage colors. The accumulator
    /// is rebuilt fresh each cycle.
    fn reclaim_orphans(&mut self) -> usize {
        let candidates = mem::take(&mut self.orphan_candidates);
        if candidates.is_empty() {
            return 0;
        }
        self.orphan_scratch.fill(false);
        let mut promoted = 0;
        for position in candidates {
            let slot = position as usize;
            if self.orphan_scratch[slot] {
                continue;
            }
            self.orphan_scratch[slot] = true;
            if self.status[slot] != CellStatus::Unclaimed {
                continue;
            }
            let parent = self.grid.cells[slot].parent_color;
            if self.claim(position, parent) {
                promoted += 1;
            }
        }
        promoted
    }

    /// Execute one pass: settle every cell in a snapshot of the active pool
    /// (recruits land in the next pass), drain orphans if the pool emptied,
    /// apply the quota check, and emit observational hooks. Returns the pass
    /// summary; a no-op once the run is done.
    pub fn step_pass(&mut self) -> PassSummary {
        if self.phase == GrowthPhase::Done {
            return self.summary(0, 0);
        }

        let snapshot = mem::take(&mut self.active);
        let mut recruited = 0;
        for position in snapshot {
            recruited += self.grow_step(position);
        }
        self.pass += 1;

        let mut reclaimed = 0;
        if self.active.is_empty() {
            if self.config.reclaim_orphans {
                self.phase = GrowthPhase::DrainingOrphans;
                reclaimed = self.reclaim_orphans();
                self.phase = if reclaimed > 0 {
                    GrowthPhase::Running
                } else {
                    GrowthPhase::Done
                };
            } else {
                self.phase = GrowthPhase::Done;
            }
        }
        if self.painted >= self.fill_quota {
            self.phase = GrowthPhase::Done;
        }

        if self.config.frame_interval > 0 {
            if self.frame_tick % self.config.frame_interval == 0 {
                self.observer.on_frame(&self.grid, self.frame_index);
                self.frame_index += 1;
            }
            self.frame_tick = self.frame_tick.wrapping_add(1);
        }

        let summary = self.summary(recruited, reclaimed);
        self.observer.on_pass(&summary);
        let snapshot_every = u64::from(self.config.snapshot_interval);
        if snapshot_every > 0 && (self.pass - 1) % snapshot_every == 0 {
            self.observer.on_snapshot(&self.grid);
        }
        summary
    }

    /// Run passes until the terminal phase, then hand the finished canvas to
    /// the observer exactly once.
    pub fn run(&mut self) {
        while self.phase != GrowthPhase::Done {
            self.step_pass();
        }
        if !self.completed {
            self.completed = true;
            self.observer.on_complete(&self.grid);
        }
    }

    fn summary(&self, recruited: usize, reclaimed: usize) -> PassSummary {
        PassSummary {
            pass: self.pass,
            painted: self.painted,
            fill_quota: self.fill_quota,
            total_cells: self.grid.len(),
            recruited,
            reclaimed,
            phase: self.phase,
        }
    }

    /// Returns an immutable reference to the (clamped) configuration.
    #[must_use]
    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Advisory notes recorded while normalizing the configuration.
    #[must_use]
    pub fn advisories(&self) -> &[&'static str] {
        &self.advisories
    }

    /// The RNG seed this run consumes; recorded even when it was drawn from
    /// entropy so the run stays replayable.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Seed-cell count after resolving a ranged configuration.
    #[must_use]
    pub const fn resolved_seed_count(&self) -> u32 {
        self.seed_count
    }

    /// Read-only access to the canvas.
    #[must_use]
    pub fn grid(&self) -> &CanvasGrid {
        &self.grid
    }

    /// Lifecycle tag for one position.
    #[must_use]
    pub fn status(&self, position: u32) -> CellStatus {
        self.status[position as usize]
    }

    /// Current `(unclaimed, active, settled)` pool sizes; the sum always
    /// equals the cell count.
    #[must_use]
    pub fn pool_counts(&self) -> (usize, usize, usize) {
        (self.unclaimed, self.active.len(), self.painted)
    }

    /// Number of settled cells.
    #[must_use]
    pub const fn painted(&self) -> usize {
        self.painted
    }

    /// Settled-cell target for this run.
    #[must_use]
    pub const fn fill_quota(&self) -> usize {
        self.fill_quota
    }

    /// Number of completed passes.
    #[must_use]
    pub const fn pass(&self) -> u64 {
        self.pass
    }

    /// Current engine phase.
    #[must_use]
    pub const fn phase(&self) -> GrowthPhase {
        self.phase
    }
}
