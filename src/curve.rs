//! Reproducible curved edges.
//!
//! Each edge bends through a midpoint offset drawn from a stream seeded by
//! the ordered endpoint ids, so curves never overlap as straight lines yet
//! never jitter between renders. Direction matters: (a, b) and (b, a) may
//! bend differently, which is fine for directed relationships.

use crate::rng::SeededRng;
use glam::DVec3;

/// Number of cached sample points along each curve.
pub const CURVE_SAMPLES: usize = 32;

/// A quadratic Bezier between two node positions with cached samples.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCurve {
    start: DVec3,
    control: DVec3,
    end: DVec3,
    points: Vec<DVec3>,
}

impl EdgeCurve {
    /// Build the curve for one edge. Identical inputs yield identical
    /// curves, bit for bit.
    pub fn build(source: DVec3, target: DVec3, source_id: &str, target_id: &str) -> Self {
        let mut rng = SeededRng::from_key(&format!("{source_id}{target_id}"));
        let dist = source.distance(target);
        let mid = (source + target) * 0.5;
        let control = DVec3::new(
            mid.x + (rng.next() - 0.5) * dist * 0.3,
            mid.y + (rng.next() - 0.5) * dist * 0.3,
            mid.z + (rng.next() - 0.5) * dist * 0.3,
        );

        let points = (0..CURVE_SAMPLES)
            .map(|i| {
                let t = i as f64 / (CURVE_SAMPLES - 1) as f64;
                quadratic(source, control, target, t)
            })
            .collect();

        Self {
            start: source,
            control,
            end: target,
            points,
        }
    }

    /// Exact point on the curve at `t` in [0, 1].
    pub fn point_at(&self, t: f64) -> DVec3 {
        quadratic(self.start, self.control, self.end, t.clamp(0.0, 1.0))
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn start(&self) -> DVec3 {
        self.start
    }

    pub fn end(&self) -> DVec3 {
        self.end
    }

    /// Control point, optionally lifted — the animation loop breathes active
    /// edges by passing a small time-varying lift.
    pub fn control_lifted(&self, lift: f64) -> DVec3 {
        self.control + DVec3::Y * lift
    }
}

fn quadratic(p0: DVec3, p1: DVec3, p2: DVec3, t: f64) -> DVec3 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}
