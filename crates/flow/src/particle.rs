use std::collections::VecDeque;

use foundation::GeoPoint;

/// Most recent geographic positions of one agent, oldest first.
///
/// Fixed capacity: once full, each push evicts the oldest point. The backing
/// buffer is allocated once and reused across respawns.
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    points: VecDeque<GeoPoint>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// A trail holding exactly `start`.
    pub fn starting_at(capacity: usize, start: GeoPoint) -> Self {
        let mut trail = Self::new(capacity);
        trail.reset(start);
        trail
    }

    pub fn push(&mut self, p: GeoPoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(p);
    }

    /// Drops the history and restarts from a single point.
    pub fn reset(&mut self, start: GeoPoint) {
        self.points.clear();
        self.points.push_back(start);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &GeoPoint> + '_ {
        self.points.iter()
    }

    pub fn oldest(&self) -> Option<GeoPoint> {
        self.points.front().copied()
    }

    pub fn newest(&self) -> Option<GeoPoint> {
        self.points.back().copied()
    }

    pub fn to_vec(&self) -> Vec<GeoPoint> {
        self.points.iter().copied().collect()
    }
}

/// One wind particle. Geography is the only authoritative state; nothing here
/// is ever expressed in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub position: GeoPoint,
    /// Ticks since the last (re)spawn.
    pub age: u32,
    pub max_age: u32,
    /// Multiplier applied to the wind vector each tick.
    pub speed: f64,
    pub trail: Trail,
    /// Reserved per-agent randomness in `[0, 100)`; not read by the simulation.
    pub spawn_phase: f64,
}

impl Agent {
    /// A freshly spawned agent at `position` with `age = 0`.
    pub fn new(position: GeoPoint, max_age: u32, speed: f64, trail_capacity: usize) -> Self {
        Self {
            position,
            age: 0,
            max_age,
            speed,
            trail: Trail::starting_at(trail_capacity, position),
            spawn_phase: 0.0,
        }
    }

    /// `age / max_age`; drives the fade envelope.
    pub fn life_fraction(&self) -> f64 {
        self.age as f64 / self.max_age as f64
    }
}

/// Fixed-size agent population.
///
/// There is no way to add or remove agents after construction; the lifecycle
/// recycles them in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleStore {
    agents: Vec<Agent>,
}

impl ParticleStore {
    pub fn from_fn(count: usize, mut f: impl FnMut(usize) -> Agent) -> Self {
        let mut agents = Vec::with_capacity(count);
        for i in 0..count {
            agents.push(f(i));
        }
        Self { agents }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Agent> {
        self.agents.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Agent> {
        self.agents.get_mut(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Agent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Agent> {
        self.agents.iter_mut()
    }

    pub fn as_slice(&self) -> &[Agent] {
        &self.agents
    }
}
