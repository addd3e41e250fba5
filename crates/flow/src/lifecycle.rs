use foundation::{GeoBounds, GeoPoint};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::{FlowConfig, WindVector};
use crate::particle::{Agent, ParticleStore};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecycleCause {
    /// `age` passed `max_age`.
    Expired,
    /// The agent drifted outside the padded viewport.
    OutOfBounds,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved,
    Recycled(RecycleCause),
}

/// Advances, ages and respawns agents.
///
/// Owns the random source so a seeded lifecycle replays identically.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    rng: SmallRng,
    min_age: u32,
    max_age: u32,
    min_speed: f64,
    max_speed: f64,
    trail_capacity: usize,
}

impl Lifecycle {
    pub fn new(config: &FlowConfig, seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            min_age: config.min_age.max(1),
            max_age: config.max_age.max(config.min_age.max(1)),
            min_speed: config.min_speed,
            max_speed: config.max_speed.max(config.min_speed),
            trail_capacity: config.trail_capacity,
        }
    }

    /// One simulation step for one agent: age, drift with the wind, extend
    /// the trail, then recycle if expired or out of `bounds`.
    pub fn advance(&mut self, agent: &mut Agent, wind: WindVector, bounds: &GeoBounds) -> Advance {
        agent.age = agent.age.saturating_add(1);
        agent.position = agent
            .position
            .offset(wind.lat_deg * agent.speed, wind.lon_deg * agent.speed);
        agent.trail.push(agent.position);

        let cause = if agent.age > agent.max_age {
            RecycleCause::Expired
        } else if !bounds.contains(agent.position) {
            RecycleCause::OutOfBounds
        } else {
            return Advance::Moved;
        };
        self.recycle(agent, bounds);
        Advance::Recycled(cause)
    }

    /// Respawns `agent` in place: fresh position inside `bounds`, `age = 0`,
    /// new lifetime and speed, trail collapsed to the new position.
    pub fn recycle(&mut self, agent: &mut Agent, bounds: &GeoBounds) {
        agent.position = self.random_point(bounds);
        agent.age = 0;
        agent.max_age = self.rng.random_range(self.min_age..=self.max_age);
        agent.speed = self.min_speed + self.rng.random::<f64>() * (self.max_speed - self.min_speed);
        agent.spawn_phase = self.rng.random::<f64>() * 100.0;
        agent.trail.reset(agent.position);
    }

    /// A new agent with its age preseeded in `[0, max_age)` so a population
    /// does not fade in and out in lockstep.
    pub fn spawn(&mut self, bounds: &GeoBounds) -> Agent {
        let mut agent = Agent::new(bounds.center(), self.min_age, self.min_speed, self.trail_capacity);
        self.respawn_staggered(&mut agent, bounds);
        agent
    }

    pub fn populate(&mut self, count: usize, bounds: &GeoBounds) -> ParticleStore {
        ParticleStore::from_fn(count, |_| self.spawn(bounds))
    }

    /// Re-spawns every agent of `store` in place (same count, same buffers).
    pub fn reseed(&mut self, store: &mut ParticleStore, bounds: &GeoBounds) {
        for agent in store.iter_mut() {
            self.respawn_staggered(agent, bounds);
        }
    }

    fn respawn_staggered(&mut self, agent: &mut Agent, bounds: &GeoBounds) {
        self.recycle(agent, bounds);
        agent.age = self.rng.random_range(0..agent.max_age);
    }

    fn random_point(&mut self, bounds: &GeoBounds) -> GeoPoint {
        // Scaled unit draws rather than `random_range` so zero-span bounds
        // (a collapsed container) cannot panic.
        let u = self.rng.random::<f64>();
        let v = self.rng.random::<f64>();
        bounds.lerp(u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::{Advance, Lifecycle, RecycleCause};
    use crate::config::{FlowConfig, WindVector};
    use crate::particle::Agent;
    use foundation::{GeoBounds, GeoPoint};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn wide_bounds() -> GeoBounds {
        GeoBounds::new(GeoPoint::new(39.0, 116.0), GeoPoint::new(41.0, 118.0))
    }

    fn lifecycle() -> Lifecycle {
        Lifecycle::new(&FlowConfig::default(), 0xBEEF)
    }

    #[test]
    fn advance_moves_by_wind_times_speed() {
        let mut lc = lifecycle();
        let mut a = Agent::new(GeoPoint::new(39.9140, 116.4020), 100, 1.0, 10);
        let out = lc.advance(&mut a, WindVector::new(-0.00004, 0.00006), &wide_bounds());
        assert_eq!(out, Advance::Moved);
        assert_close(a.position.lat_deg, 39.91396, 1e-12);
        assert_close(a.position.lon_deg, 116.40206, 1e-12);
        assert_eq!(a.age, 1);
        assert_eq!(a.trail.len(), 2);
        assert_eq!(a.trail.newest(), Some(a.position));
    }

    #[test]
    fn speed_scales_displacement() {
        let mut lc = lifecycle();
        let mut a = Agent::new(GeoPoint::new(40.0, 117.0), 100, 0.5, 10);
        lc.advance(&mut a, WindVector::new(0.001, -0.002), &wide_bounds());
        assert_close(a.position.lat_deg, 40.0005, 1e-12);
        assert_close(a.position.lon_deg, 116.999, 1e-12);
    }

    #[test]
    fn trail_saturates_at_capacity() {
        let mut lc = lifecycle();
        let mut a = Agent::new(GeoPoint::new(40.0, 117.0), 250, 1.0, 10);
        for _ in 0..30 {
            lc.advance(&mut a, WindVector::new(0.00001, 0.00001), &wide_bounds());
        }
        assert_eq!(a.trail.len(), 10);
        assert_eq!(a.trail.newest(), Some(a.position));
    }

    #[test]
    fn expiry_recycles_after_max_age() {
        let mut lc = lifecycle();
        let mut a = Agent::new(GeoPoint::new(40.0, 117.0), 3, 1.0, 10);
        let wind = WindVector::new(0.0, 0.0);
        for _ in 0..3 {
            assert_eq!(lc.advance(&mut a, wind, &wide_bounds()), Advance::Moved);
        }
        assert_eq!(a.age, 3);
        assert_eq!(
            lc.advance(&mut a, wind, &wide_bounds()),
            Advance::Recycled(RecycleCause::Expired)
        );
        assert_eq!(a.age, 0);
        assert_eq!(a.trail.len(), 1);
    }

    #[test]
    fn leaving_bounds_recycles_inside_bounds() {
        let mut lc = lifecycle();
        let bounds = wide_bounds();
        let mut a = Agent::new(GeoPoint::new(40.99999, 117.0), 200, 1.0, 10);
        for _ in 0..4 {
            a.trail.push(a.position);
        }
        let out = lc.advance(&mut a, WindVector::new(0.001, 0.0), &bounds);
        assert_eq!(out, Advance::Recycled(RecycleCause::OutOfBounds));
        assert_eq!(a.age, 0);
        assert!(bounds.contains(a.position));
        assert_eq!(a.trail.to_vec(), vec![a.position]);
    }

    #[test]
    fn recycle_redraws_within_configured_ranges() {
        let cfg = FlowConfig::default();
        let mut lc = lifecycle();
        let mut a = Agent::new(GeoPoint::new(40.0, 117.0), 1, 9.0, 10);
        for _ in 0..200 {
            lc.recycle(&mut a, &wide_bounds());
            assert!((cfg.min_age..=cfg.max_age).contains(&a.max_age));
            assert!(a.speed >= cfg.min_speed && a.speed < cfg.max_speed);
            assert!((0.0..100.0).contains(&a.spawn_phase));
        }
    }

    #[test]
    fn spawn_preseeds_age_below_max() {
        let mut lc = lifecycle();
        let bounds = wide_bounds();
        let store = lc.populate(500, &bounds);
        assert_eq!(store.len(), 500);
        for a in store.iter() {
            assert!(a.age < a.max_age);
            assert!(bounds.contains(a.position));
            assert_eq!(a.trail.len(), 1);
        }
        let distinct_ages: std::collections::BTreeSet<u32> = store.iter().map(|a| a.age).collect();
        assert!(distinct_ages.len() > 50, "ages should be staggered");
    }

    #[test]
    fn degenerate_bounds_do_not_panic() {
        let mut lc = lifecycle();
        let point = GeoPoint::new(40.0, 117.0);
        let collapsed = GeoBounds::new(point, point);
        let a = lc.spawn(&collapsed);
        assert_eq!(a.position, point);
    }

    #[test]
    fn same_seed_replays_identically() {
        let cfg = FlowConfig::default();
        let mut a = Lifecycle::new(&cfg, 42);
        let mut b = Lifecycle::new(&cfg, 42);
        let bounds = wide_bounds();
        assert_eq!(a.populate(16, &bounds), b.populate(16, &bounds));
    }

    #[test]
    fn reseed_keeps_population_size() {
        let mut lc = lifecycle();
        let bounds = wide_bounds();
        let mut store = lc.populate(8, &bounds);
        let narrow = GeoBounds::new(GeoPoint::new(40.0, 117.0), GeoPoint::new(40.01, 117.01));
        lc.reseed(&mut store, &narrow);
        assert_eq!(store.len(), 8);
        assert!(store.iter().all(|a| narrow.contains(a.position)));
    }
}
