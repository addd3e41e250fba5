use foundation::PixelSize;
use runtime::{Frame, FrameClock, FrameRequest, Metrics};
use tracing::{debug, info, trace, warn};
use viewport::ViewportProvider;

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::lifecycle::{Advance, Lifecycle, RecycleCause};
use crate::particle::ParticleStore;
use crate::render::{TrailDraw, TrailRenderer};
use crate::surface::OverlaySurface;

pub const METRIC_TICKS: &str = "flow.ticks";
pub const METRIC_TICKS_SKIPPED: &str = "flow.ticks.skipped";
pub const METRIC_REINIT: &str = "flow.reinit";
pub const METRIC_RECYCLED_EXPIRED: &str = "flow.recycled.expired";
pub const METRIC_RECYCLED_OUT_OF_BOUNDS: &str = "flow.recycled.out_of_bounds";
pub const METRIC_TRAILS_DRAWN: &str = "flow.trails.drawn";
pub const METRIC_TRAILS_SKIPPED: &str = "flow.trails.skipped";
pub const METRIC_AGENTS: &str = "flow.agents";
pub const METRIC_TICK_DRAWN: &str = "flow.tick.drawn";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Stopped,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The map container is detached or not laid out.
    NoContainer,
    /// The overlay surface has no drawing context this frame.
    NoContext,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The driver is stopped; nothing ran.
    Stopped,
    Skipped(SkipReason),
    Rendered {
        drawn: usize,
        recycled: usize,
        /// The surface changed size and the population was respawned.
        reinitialized: bool,
    },
}

/// Per-frame loop tying viewport, lifecycle, renderer and surface together.
///
/// The host delivers display-refresh callbacks by calling
/// [`AnimationDriver::on_frame`]; the driver asks its [`FrameClock`] for the
/// next one and cancels it on [`AnimationDriver::stop`].
pub struct AnimationDriver<V, S, C> {
    config: FlowConfig,
    viewport: V,
    surface: S,
    clock: C,
    lifecycle: Lifecycle,
    renderer: TrailRenderer,
    store: Option<ParticleStore>,
    state: DriverState,
    pending: Option<FrameRequest>,
    frame: Frame,
    metrics: Metrics,
}

impl<V, S, C> AnimationDriver<V, S, C>
where
    V: ViewportProvider,
    S: OverlaySurface,
    C: FrameClock,
{
    /// Takes ownership of the overlay surface. Nothing is attached or
    /// scheduled until [`AnimationDriver::start`].
    pub fn new(config: FlowConfig, viewport: V, surface: S, clock: C) -> Result<Self, FlowError> {
        config.validate()?;
        let lifecycle = Lifecycle::new(&config, config.seed_or_default());
        let renderer = TrailRenderer::new(&config);
        Ok(Self {
            config,
            viewport,
            surface,
            clock,
            lifecycle,
            renderer,
            store: None,
            state: DriverState::Stopped,
            pending: None,
            frame: Frame::default(),
            metrics: Metrics::new(),
        })
    }

    pub fn start(&mut self) -> Result<(), FlowError> {
        if self.state == DriverState::Running {
            return Ok(());
        }

        self.surface.acquire()?;
        if let Some(size) = self.viewport.container_size() {
            if size != self.surface.pixel_size() {
                self.surface.resize(size);
            }
        }
        self.populate();

        match self.clock.request_frame() {
            Ok(req) => self.pending = Some(req),
            Err(err) => {
                self.store = None;
                self.surface.release();
                return Err(err.into());
            }
        }

        self.state = DriverState::Running;
        self.frame = Frame::default();
        info!(
            agents = self.config.agent_count,
            size = %self.surface.pixel_size(),
            "wind overlay started"
        );
        Ok(())
    }

    /// Cancels the pending frame, releases the surface and drops the
    /// population. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(req) = self.pending.take() {
            self.clock.cancel_frame(req);
        }
        if self.state == DriverState::Stopped {
            return;
        }
        self.surface.release();
        self.store = None;
        self.state = DriverState::Stopped;
        info!(frames = self.frame.index, "wind overlay stopped");
    }

    /// Display-refresh callback: run one tick, then schedule the next.
    pub fn on_frame(&mut self) -> TickOutcome {
        if self.state == DriverState::Stopped {
            trace!("frame delivered after stop; ignoring");
            return TickOutcome::Stopped;
        }
        self.pending = None;

        let outcome = self.tick();

        match self.clock.request_frame() {
            Ok(req) => self.pending = Some(req),
            Err(err) => {
                warn!(error = %err, "could not schedule next frame; stopping overlay");
                self.stop();
            }
        }
        outcome
    }

    fn tick(&mut self) -> TickOutcome {
        self.frame = self.frame.next();
        self.metrics.inc(METRIC_TICKS);

        let Some(container) = self.viewport.container_size() else {
            debug!(frame = self.frame.index, "map container unavailable; skipping tick");
            self.metrics.inc(METRIC_TICKS_SKIPPED);
            return TickOutcome::Skipped(SkipReason::NoContainer);
        };

        let mut reinitialized = false;
        if container != self.surface.pixel_size() {
            debug!(
                from = %self.surface.pixel_size(),
                to = %container,
                "overlay resized; respawning particles"
            );
            self.surface.resize(container);
            self.populate();
            reinitialized = true;
        }

        let Some(ctx) = self.surface.context() else {
            debug!(frame = self.frame.index, "no drawing context; skipping tick");
            self.metrics.inc(METRIC_TICKS_SKIPPED);
            return TickOutcome::Skipped(SkipReason::NoContext);
        };
        ctx.clear(container);

        let bounds = self.viewport.padded_bounds(self.config.pad_ratio);
        let wind = self.config.wind;
        let store = self.store.get_or_insert_with(|| {
            self.lifecycle.populate(self.config.agent_count, &bounds)
        });

        let mut drawn = 0usize;
        let mut skipped = 0usize;
        let mut expired = 0usize;
        let mut out_of_bounds = 0usize;
        for agent in store.iter_mut() {
            match self.lifecycle.advance(agent, wind, &bounds) {
                Advance::Moved => {}
                Advance::Recycled(RecycleCause::Expired) => expired += 1,
                Advance::Recycled(RecycleCause::OutOfBounds) => out_of_bounds += 1,
            }
            match self.renderer.draw(ctx, agent, &self.viewport) {
                TrailDraw::Drawn { .. } => drawn += 1,
                TrailDraw::Skipped => skipped += 1,
            }
        }

        self.metrics.inc_by(METRIC_RECYCLED_EXPIRED, expired as u64);
        self.metrics
            .inc_by(METRIC_RECYCLED_OUT_OF_BOUNDS, out_of_bounds as u64);
        self.metrics.inc_by(METRIC_TRAILS_DRAWN, drawn as u64);
        self.metrics.inc_by(METRIC_TRAILS_SKIPPED, skipped as u64);
        self.metrics.record(METRIC_TICK_DRAWN, drawn as i64);

        TickOutcome::Rendered {
            drawn,
            recycled: expired + out_of_bounds,
            reinitialized,
        }
    }

    /// Builds (or respawns in place) the full population against the current
    /// padded viewport.
    fn populate(&mut self) {
        let bounds = self.viewport.padded_bounds(self.config.pad_ratio);
        match self.store.as_mut() {
            Some(store) if store.len() == self.config.agent_count => {
                self.lifecycle.reseed(store, &bounds);
            }
            _ => {
                self.store = Some(self.lifecycle.populate(self.config.agent_count, &bounds));
            }
        }
        self.metrics.inc(METRIC_REINIT);
        self.metrics
            .set_gauge(METRIC_AGENTS, self.config.agent_count as i64);
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&ParticleStore> {
        self.store.as_ref()
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Host-side access for pan/zoom/resize of the map between frames.
    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn surface_size(&self) -> PixelSize {
        self.surface.pixel_size()
    }
}
