//! Headless runs of the wind overlay against a synthetic Mercator map.

use flow::driver::{
    METRIC_RECYCLED_EXPIRED, METRIC_RECYCLED_OUT_OF_BOUNDS, METRIC_REINIT, METRIC_TRAILS_DRAWN,
};
use flow::{AnimationDriver, FlowConfig, FlowError, ParticleStore, RecordingSurface, TickOutcome};
use foundation::{GeoBounds, GeoPoint, PixelSize};
use runtime::{ManualClock, MetricsSnapshot};
use serde::Serialize;
use tracing::{debug, info};
use viewport::{MercatorCamera, MercatorViewport, ViewportProvider};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulateOptions {
    pub ticks: u64,
    pub size: PixelSize,
    pub center: GeoPoint,
    pub zoom: f64,
    /// Pan the map by `(dx, dy)` pixels every `n` ticks.
    pub pan_every: Option<(u64, f64, f64)>,
    /// Resize the map container to the given size before tick `n`.
    pub resize_at: Option<(u64, PixelSize)>,
    pub config: FlowConfig,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            ticks: 300,
            size: PixelSize::new(800, 600),
            center: GeoPoint::new(39.9140, 116.4020),
            zoom: 15.0,
            pan_every: None,
            resize_at: None,
            config: FlowConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindSummary {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub heading_deg: Option<f64>,
    pub compass: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsSummary {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl From<GeoBounds> for BoundsSummary {
    fn from(b: GeoBounds) -> Self {
        Self {
            north: b.north,
            south: b.south,
            east: b.east,
            west: b.west,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub ticks: u64,
    pub rendered_ticks: u64,
    pub skipped_ticks: u64,
    pub agents: usize,
    pub final_size: String,
    pub reinitializations: u64,
    pub recycled_expired: u64,
    pub recycled_out_of_bounds: u64,
    pub trails_drawn: u64,
    /// Largest `age / max_age` in the final population; never above 1.
    pub max_life_fraction: f64,
    pub wind: WindSummary,
    pub padded_bounds: BoundsSummary,
    /// blake3 of the final population state; equal seeds give equal digests.
    pub population_digest: String,
    pub metrics: MetricsSnapshot,
}

/// Content hash of every agent's geographic state.
pub fn population_digest(store: &ParticleStore) -> String {
    let mut hasher = blake3::Hasher::new();
    for agent in store.iter() {
        hasher.update(&agent.age.to_le_bytes());
        hasher.update(&agent.max_age.to_le_bytes());
        hasher.update(&agent.speed.to_le_bytes());
        for p in agent.trail.iter() {
            hasher.update(&p.lat_deg.to_le_bytes());
            hasher.update(&p.lon_deg.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

pub fn simulate(opts: &SimulateOptions) -> Result<SimulationReport, FlowError> {
    let config = opts.config.clone();
    let seed = config.seed_or_default();
    let wind = config.wind;

    let viewport = MercatorViewport::new(MercatorCamera::new(opts.center, opts.zoom), opts.size);
    let mut driver = AnimationDriver::new(
        config,
        viewport,
        RecordingSurface::new(PixelSize::default()),
        ManualClock::new(),
    )?;
    driver.start()?;
    info!(seed, ticks = opts.ticks, size = %opts.size, "simulation started");

    let mut rendered_ticks = 0u64;
    let mut skipped_ticks = 0u64;
    for tick in 0..opts.ticks {
        if let Some((at, size)) = opts.resize_at {
            if tick == at {
                debug!(tick, size = %size, "resizing map container");
                driver.viewport_mut().resize(size);
            }
        }
        if let Some((every, dx, dy)) = opts.pan_every {
            if every > 0 && tick > 0 && tick % every == 0 {
                driver.viewport_mut().pan_by_pixels(dx, dy);
            }
        }

        driver.clock_mut().fire();
        match driver.on_frame() {
            TickOutcome::Rendered { .. } => rendered_ticks += 1,
            TickOutcome::Skipped(_) => skipped_ticks += 1,
            TickOutcome::Stopped => break,
        }
    }

    let store = driver
        .store()
        .ok_or_else(|| FlowError::Scheduler("driver stopped before the run ended".to_string()))?;
    let max_life_fraction = store
        .iter()
        .map(|a| a.life_fraction())
        .fold(0.0f64, f64::max);
    let digest = population_digest(store);
    let agents = store.len();

    let metrics = driver.metrics();
    let report = SimulationReport {
        seed,
        ticks: opts.ticks,
        rendered_ticks,
        skipped_ticks,
        agents,
        final_size: driver.surface_size().to_string(),
        reinitializations: metrics.counter(METRIC_REINIT),
        recycled_expired: metrics.counter(METRIC_RECYCLED_EXPIRED),
        recycled_out_of_bounds: metrics.counter(METRIC_RECYCLED_OUT_OF_BOUNDS),
        trails_drawn: metrics.counter(METRIC_TRAILS_DRAWN),
        max_life_fraction,
        wind: WindSummary {
            lat_deg: wind.lat_deg,
            lon_deg: wind.lon_deg,
            heading_deg: wind.heading_deg(),
            compass: wind.compass_point(),
        },
        padded_bounds: driver
            .viewport()
            .padded_bounds(driver.config().pad_ratio)
            .into(),
        population_digest: digest,
        metrics: metrics.snapshot(),
    };

    driver.stop();
    info!(
        rendered = report.rendered_ticks,
        recycled = report.recycled_expired + report.recycled_out_of_bounds,
        "simulation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{SimulateOptions, simulate};
    use flow::FlowConfig;
    use foundation::PixelSize;

    fn opts(ticks: u64, seed: u64) -> SimulateOptions {
        SimulateOptions {
            ticks,
            config: FlowConfig {
                agent_count: 80,
                seed: Some(seed),
                ..FlowConfig::default()
            },
            ..SimulateOptions::default()
        }
    }

    #[test]
    fn same_seed_same_digest() {
        let a = simulate(&opts(50, 11)).unwrap();
        let b = simulate(&opts(50, 11)).unwrap();
        let c = simulate(&opts(50, 12)).unwrap();
        assert_eq!(a.population_digest, b.population_digest);
        assert_ne!(a.population_digest, c.population_digest);
    }

    #[test]
    fn long_run_keeps_population_and_ages() {
        let r = simulate(&opts(400, 3)).unwrap();
        assert_eq!(r.agents, 80);
        assert_eq!(r.rendered_ticks, 400);
        assert!(r.max_life_fraction <= 1.0);
        assert!(r.recycled_expired > 0);
        assert_eq!(r.reinitializations, 1);
    }

    #[test]
    fn resize_mid_run_reinitializes_once() {
        let mut o = opts(20, 5);
        o.resize_at = Some((10, PixelSize::new(400, 300)));
        let r = simulate(&o).unwrap();
        assert_eq!(r.final_size, "400x300");
        assert_eq!(r.reinitializations, 2);
        assert_eq!(r.agents, 80);
    }

    #[test]
    fn wind_summary_reports_heading() {
        let r = simulate(&opts(1, 1)).unwrap();
        assert_eq!(r.wind.compass, Some("ESE"));
        assert_eq!(r.metrics.gauges.get("flow.agents"), Some(&80));
    }

    #[test]
    fn panning_pushes_agents_out_of_bounds() {
        let mut o = opts(120, 9);
        o.pan_every = Some((5, 200.0, 0.0));
        let r = simulate(&o).unwrap();
        assert!(r.recycled_out_of_bounds > 0);
    }
}
