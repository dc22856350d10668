//! Connectivity-shape classification.
//!
//! A focal table's in/out degree balance picks one of three qualitative
//! shapes, which in turn picks the particle-formation geometry drawn around
//! it. Classification is total over all non-negative degree pairs.

use glam::DVec3;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Central hub, many inbound references.
    Nucleus,
    /// Outbound-dominant, transactional stream.
    Helix,
    /// Balanced or low connectivity, stable reference entity.
    Ring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub topology: Topology,
    pub rationale: &'static str,
}

/// Classify a table by its degree balance. Ties and near-ties fall through
/// to `Ring`.
pub fn classify(in_degree: usize, out_degree: usize) -> Classification {
    if in_degree > out_degree {
        Classification {
            topology: Topology::Nucleus,
            rationale: "central hub, many inbound references",
        }
    } else if out_degree > in_degree + 1 {
        Classification {
            topology: Topology::Helix,
            rationale: "outbound-dominant, transactional stream",
        }
    } else {
        Classification {
            topology: Topology::Ring,
            rationale: "balanced or low connectivity, stable reference entity",
        }
    }
}

/// Particle-formation geometry for a topology: a shell cloud around a
/// nucleus, a winding strand for a helix, a flat ring otherwise. Purely
/// index-deterministic, like the galaxy layout.
pub fn formation_points(topology: Topology, count: usize, radius: f64) -> Vec<DVec3> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![DVec3::new(radius, 0.0, 0.0)];
    }

    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    (0..count)
        .map(|i| {
            let t = i as f64 / (count - 1) as f64;
            match topology {
                Topology::Nucleus => {
                    let y = 1.0 - t * 2.0;
                    let r = (1.0 - y * y).max(0.0).sqrt();
                    let theta = i as f64 * golden_angle;
                    DVec3::new(theta.cos() * r * radius, y * radius, theta.sin() * r * radius)
                }
                Topology::Helix => {
                    let angle = t * 4.0 * PI;
                    DVec3::new(
                        angle.cos() * radius * 0.6,
                        (t - 0.5) * 1.6 * radius,
                        angle.sin() * radius * 0.6,
                    )
                }
                Topology::Ring => {
                    let angle = t * 2.0 * PI;
                    DVec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_heavy_is_nucleus() {
        assert_eq!(classify(5, 2).topology, Topology::Nucleus);
    }

    #[test]
    fn outbound_heavy_is_helix() {
        assert_eq!(classify(2, 5).topology, Topology::Helix);
    }

    #[test]
    fn balance_and_near_ties_are_ring() {
        assert_eq!(classify(3, 3).topology, Topology::Ring);
        assert_eq!(classify(3, 4).topology, Topology::Ring);
        assert_eq!(classify(0, 0).topology, Topology::Ring);
        assert_eq!(classify(0, 1).topology, Topology::Ring);
    }

    #[test]
    fn formations_honor_count_and_scale() {
        for topology in [Topology::Nucleus, Topology::Helix, Topology::Ring] {
            let points = formation_points(topology, 24, 10.0);
            assert_eq!(points.len(), 24);
            for p in &points {
                assert!(p.length() <= 10.0 * 1.001, "escaped formation: {p:?}");
            }
        }
        assert!(formation_points(Topology::Ring, 0, 10.0).is_empty());
    }

    #[test]
    fn ring_formation_is_flat() {
        for p in formation_points(Topology::Ring, 12, 5.0) {
            assert_eq!(p.y, 0.0);
        }
    }
}
