use flow::driver::{METRIC_AGENTS, METRIC_REINIT, METRIC_TICKS, METRIC_TICKS_SKIPPED};
use flow::{
    Advance, Agent, AnimationDriver, FlowConfig, Lifecycle, RecordingSurface, RecycleCause,
    SkipReason, TickOutcome, TrailRenderer, WindVector,
};
use foundation::{GeoBounds, GeoPoint, PixelSize};
use pretty_assertions::assert_eq;
use runtime::ManualClock;
use viewport::{MercatorCamera, MercatorViewport, Projection, ViewportProvider};

type Driver = AnimationDriver<MercatorViewport, RecordingSurface, ManualClock>;

const AGENTS: usize = 120;

fn assert_close(a: f64, b: f64, eps: f64) {
    let diff = (a - b).abs();
    assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
}

fn running_driver(size: PixelSize) -> Driver {
    let config = FlowConfig {
        agent_count: AGENTS,
        seed: Some(7),
        ..FlowConfig::default()
    };
    let viewport = MercatorViewport::new(
        MercatorCamera::new(GeoPoint::new(39.9140, 116.4020), 15.0),
        size,
    );
    let mut d = AnimationDriver::new(
        config,
        viewport,
        RecordingSurface::new(PixelSize::new(1, 1)),
        ManualClock::new(),
    )
    .unwrap();
    d.start().unwrap();
    d
}

fn snapshot_trails(d: &Driver) -> Vec<Vec<GeoPoint>> {
    d.store()
        .unwrap()
        .iter()
        .map(|a| a.trail.to_vec())
        .collect()
}

#[test]
fn population_stays_fixed_under_pan_and_zoom() {
    let mut d = running_driver(PixelSize::new(800, 600));
    for i in 0..300 {
        if i % 25 == 0 {
            d.viewport_mut().pan_by_pixels(40.0, -15.0);
        }
        if i % 60 == 0 {
            d.viewport_mut().zoom_at(400.0, 300.0, 0.5);
        }
        d.clock_mut().fire();
        d.on_frame();
        assert_eq!(d.store().map(|s| s.len()), Some(AGENTS));
    }
    assert_eq!(d.metrics().counter(METRIC_REINIT), 1);
    assert_eq!(d.metrics().gauge(METRIC_AGENTS), Some(AGENTS as i64));
}

#[test]
fn ages_never_exceed_lifetime() {
    let mut d = running_driver(PixelSize::new(640, 480));
    for _ in 0..400 {
        d.on_frame();
        for a in d.store().unwrap().iter() {
            assert!(a.age <= a.max_age, "age {} > max_age {}", a.age, a.max_age);
            assert!(a.trail.len() >= 1 && a.trail.len() <= a.trail.capacity());
        }
    }
}

#[test]
fn panning_does_not_touch_geographic_trails() {
    let mut d = running_driver(PixelSize::new(800, 600));
    for _ in 0..12 {
        d.on_frame();
    }
    let before = snapshot_trails(&d);
    d.viewport_mut().pan_by_pixels(120.0, 80.0);
    d.viewport_mut().zoom_at(10.0, 20.0, -1.0);
    assert_eq!(snapshot_trails(&d), before);
}

#[test]
fn every_frame_projects_through_the_current_view() {
    let mut d = running_driver(PixelSize::new(800, 600));
    for _ in 0..12 {
        d.on_frame();
    }
    d.viewport_mut().pan_by_pixels(-200.0, 35.0);
    d.on_frame();

    let agents: Vec<&Agent> = d
        .store()
        .unwrap()
        .iter()
        .filter(|a| a.trail.len() >= 3)
        .collect();
    let strokes: Vec<_> = d.surface().recording().strokes().collect();
    assert_eq!(strokes.len(), agents.len());
    for (agent, (points, _style)) in agents.iter().zip(strokes) {
        let expected: Vec<_> = agent
            .trail
            .iter()
            .map(|g| d.viewport().project(*g))
            .collect();
        assert_eq!(points, expected.as_slice());
    }
}

#[test]
fn same_trail_two_views_two_paths() {
    let mut agent = Agent::new(GeoPoint::new(39.9140, 116.4020), 200, 1.0, 10);
    let mut lc = Lifecycle::new(&FlowConfig::default(), 1);
    let bounds = GeoBounds::new(GeoPoint::new(39.0, 116.0), GeoPoint::new(41.0, 118.0));
    for _ in 0..5 {
        lc.advance(&mut agent, WindVector::new(-0.00004, 0.00006), &bounds);
    }

    let size = PixelSize::new(800, 600);
    let a = MercatorViewport::new(MercatorCamera::new(GeoPoint::new(39.914, 116.402), 16.0), size);
    let mut b = a.clone();
    b.pan_by_pixels(50.0, 0.0);

    let pa: Vec<_> = agent.trail.iter().map(|g| a.project(*g)).collect();
    let pb: Vec<_> = agent.trail.iter().map(|g| b.project(*g)).collect();
    assert_ne!(pa, pb);
    for (p, q) in pa.iter().zip(&pb) {
        assert_close(q.x - p.x, 50.0, 1e-6);
        assert_close(q.y - p.y, 0.0, 1e-6);
    }

    // The renderer is stateless across views.
    let mut renderer = TrailRenderer::new(&FlowConfig::default());
    let mut ctx = flow::RecordingContext::default();
    renderer.draw(&mut ctx, &agent, &a);
    renderer.draw(&mut ctx, &agent, &b);
    let drawn: Vec<_> = ctx.strokes().map(|(p, _)| p.to_vec()).collect();
    assert_eq!(drawn, vec![pa, pb]);
}

#[test]
fn leaving_padded_bounds_recycles_within_one_tick() {
    let viewport = MercatorViewport::new(
        MercatorCamera::new(GeoPoint::new(39.9140, 116.4020), 15.0),
        PixelSize::new(800, 600),
    );
    let bounds = viewport.padded_bounds(0.4);
    let mut lc = Lifecycle::new(&FlowConfig::default(), 99);
    let edge = GeoPoint::new(bounds.center().lat_deg, bounds.east);
    let mut agent = Agent::new(edge, 200, 1.0, 10);
    agent.age = 40;
    agent.trail.push(edge);
    agent.trail.push(edge);

    let out = lc.advance(&mut agent, WindVector::new(0.0, 0.001), &bounds);
    assert_eq!(out, Advance::Recycled(RecycleCause::OutOfBounds));
    assert_eq!(agent.age, 0);
    assert_eq!(agent.trail.len(), 1);
    assert!(bounds.contains(agent.position));
}

#[test]
fn single_agent_drift_and_expiry() {
    let bounds = GeoBounds::new(GeoPoint::new(39.0, 116.0), GeoPoint::new(41.0, 118.0));
    let wind = WindVector::new(-0.00004, 0.00006);
    let mut lc = Lifecycle::new(&FlowConfig::default(), 2024);
    let mut agent = Agent::new(GeoPoint::new(39.9140, 116.4020), 100, 1.0, 10);

    assert_eq!(lc.advance(&mut agent, wind, &bounds), Advance::Moved);
    assert_close(agent.position.lat_deg, 39.91396, 1e-9);
    assert_close(agent.position.lon_deg, 116.40206, 1e-9);
    assert_eq!(agent.trail.len(), 2);

    let mut recycled = 0;
    for _ in 0..100 {
        if let Advance::Recycled(_) = lc.advance(&mut agent, wind, &bounds) {
            recycled += 1;
        }
        assert!(agent.age <= agent.max_age);
    }
    assert!(recycled >= 1);
}

#[test]
fn resize_respawns_the_whole_population() {
    let mut d = running_driver(PixelSize::new(800, 600));
    for _ in 0..30 {
        d.on_frame();
    }
    let before = d.store().unwrap().clone();

    d.viewport_mut().resize(PixelSize::new(400, 300));
    let out = d.on_frame();
    assert!(matches!(
        out,
        TickOutcome::Rendered {
            reinitialized: true,
            ..
        }
    ));
    assert_eq!(d.surface_size(), PixelSize::new(400, 300));

    let store = d.store().unwrap();
    assert_eq!(store.len(), AGENTS);
    let bounds = d.viewport().padded_bounds(d.config().pad_ratio);
    for (now, then) in store.iter().zip(before.iter()) {
        // One tick since respawn: at most the spawn point and one step.
        assert!(now.trail.len() <= 2);
        assert!(bounds.contains(now.position));
        assert_ne!(now.trail.to_vec(), then.trail.to_vec());
    }
    assert_eq!(d.metrics().counter(METRIC_REINIT), 2);
}

#[test]
fn missing_container_and_context_are_skipped_quietly() {
    let mut d = running_driver(PixelSize::new(300, 200));
    d.viewport_mut().set_attached(false);
    assert_eq!(d.on_frame(), TickOutcome::Skipped(SkipReason::NoContainer));
    d.viewport_mut().set_attached(true);
    assert!(matches!(d.on_frame(), TickOutcome::Rendered { .. }));
    assert_eq!(d.metrics().counter(METRIC_TICKS), 2);
    assert_eq!(d.metrics().counter(METRIC_TICKS_SKIPPED), 1);
    assert!(d.is_running());
}

#[test]
fn teardown_cancels_and_ignores_late_frames() {
    let mut d = running_driver(PixelSize::new(300, 200));
    d.on_frame();
    let pending = d.clock().pending().unwrap();
    d.stop();
    d.stop();
    assert_eq!(d.clock().cancelled(), &[pending]);
    assert_eq!(d.surface().release_count(), 1);
    assert_eq!(d.on_frame(), TickOutcome::Stopped);
    assert!(d.store().is_none());
}
