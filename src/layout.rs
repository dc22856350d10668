//! Deterministic layout engine.
//!
//! Two layout families: a Fibonacci-sphere "galaxy" spread for the schema
//! overview, and a statistics-driven radial spread for column drill-ins.
//! Base positions never depend on render-time random state; recomputing a
//! layout for unchanged input is a visual no-op.

use crate::metrics::{ColumnProfile, ColumnValue, HealthStatus, TableNode};
use crate::rng::SeededRng;
use glam::DVec3;
use std::f64::consts::{PI, TAU};

/// Place tables on a sphere of the given radius. Core-flagged tables pin to
/// the origin; the rest spread evenly via the golden-angle spiral, indexed
/// by their order among non-core tables. No RNG involved.
pub fn galaxy_positions(nodes: &[TableNode], radius: f64) -> Vec<DVec3> {
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    let spread = nodes.iter().filter(|n| !n.is_core).count();

    let mut positions = Vec::with_capacity(nodes.len());
    let mut i = 0usize;
    for node in nodes {
        if node.is_core || spread <= 1 {
            positions.push(DVec3::ZERO);
            continue;
        }
        let y = 1.0 - (i as f64 / (spread - 1) as f64) * 2.0;
        let r = (1.0 - y * y).max(0.0).sqrt();
        let theta = i as f64 * golden_angle;
        positions.push(DVec3::new(
            theta.cos() * r * radius,
            y * radius,
            theta.sin() * r * radius,
        ));
        i += 1;
    }
    positions
}

/// A positioned value from a drilled-in column.
#[derive(Debug, Clone)]
pub struct RadialPoint {
    pub row_id: String,
    pub position: DVec3,
    /// Render size in 0.2-0.8.
    pub size: f64,
    pub severity: HealthStatus,
}

/// Statistics-driven radial layout for one column's values.
///
/// Distance from the origin encodes deviation: numeric values sit at
/// `5 + 3|z|`, categorical values at `4 + 10(1 - f/fmax)` so rare values
/// drift outward. Angular placement is uniform on the sphere and seeded by
/// row identity, so re-fetching the same sample reproduces the view.
pub fn radial_points(values: &[(String, ColumnValue)]) -> Vec<RadialPoint> {
    if values.is_empty() {
        return Vec::new();
    }

    let profile = ColumnProfile::from_values(
        &values.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>(),
    );

    values
        .iter()
        .map(|(row_id, value)| {
            let (radius, size, severity) = polar_attributes(&profile, value);
            let mut rng = SeededRng::from_key(row_id);
            let theta = rng.range(0.0, TAU);
            // acos of a uniform draw in [-1, 1] gives uniform sphere coverage
            let phi = rng.range(-1.0, 1.0).acos();
            RadialPoint {
                row_id: row_id.clone(),
                position: DVec3::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.cos(),
                    radius * phi.sin() * theta.sin(),
                ),
                size,
                severity,
            }
        })
        .collect()
}

fn polar_attributes(profile: &ColumnProfile, value: &ColumnValue) -> (f64, f64, HealthStatus) {
    match (profile, value) {
        (ColumnProfile::Numeric { min, max, .. }, ColumnValue::Number(n)) => {
            let z = profile.z_score(*n);
            let radius = 5.0 + 3.0 * z.abs();
            let span = max - min;
            let size = if span > 0.0 {
                0.2 + 0.6 * ((n - min) / span)
            } else {
                0.5
            };
            let severity = if z.abs() > 2.0 {
                HealthStatus::Critical
            } else if z.abs() > 1.0 {
                HealthStatus::Warning
            } else {
                HealthStatus::Healthy
            };
            (radius, size, severity)
        }
        (ColumnProfile::Categorical { freq, max_freq }, value) => {
            let key = match value {
                ColumnValue::Number(n) => n.to_string(),
                ColumnValue::Text(s) => s.clone(),
            };
            let f = freq.get(&key).copied().unwrap_or(0) as f64;
            let ratio = if *max_freq > 0 {
                f / *max_freq as f64
            } else {
                0.0
            };
            let radius = 4.0 + 10.0 * (1.0 - ratio);
            let size = 0.3 + 0.5 * ratio;
            (radius, size, HealthStatus::Healthy)
        }
        // Numeric profile but a stray text value: park it at the rim.
        (ColumnProfile::Numeric { .. }, ColumnValue::Text(_)) => {
            (15.0, 0.2, HealthStatus::Warning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(n: usize, core_first: bool) -> Vec<TableNode> {
        (0..n)
            .map(|i| {
                let mut node = TableNode::bare(&format!("table_{i}"));
                node.is_core = core_first && i == 0;
                node
            })
            .collect()
    }

    #[test]
    fn galaxy_nodes_sit_on_the_sphere() {
        let nodes = tables(11, true);
        let positions = galaxy_positions(&nodes, 600.0);
        assert_eq!(positions[0], DVec3::ZERO);
        for pos in &positions[1..] {
            let dist = pos.length();
            assert!((dist - 600.0).abs() < 1e-6, "off-sphere distance {dist}");
        }
    }

    #[test]
    fn galaxy_layout_is_deterministic() {
        let nodes = tables(10, true);
        let a = galaxy_positions(&nodes, 600.0);
        let b = galaxy_positions(&nodes, 600.0);
        assert_eq!(a, b);
    }

    #[test]
    fn single_non_core_table_sits_at_origin() {
        let nodes = tables(1, false);
        let positions = galaxy_positions(&nodes, 600.0);
        assert_eq!(positions, vec![DVec3::ZERO]);
    }

    #[test]
    fn empty_input_yields_empty_layout() {
        assert!(galaxy_positions(&[], 600.0).is_empty());
        assert!(radial_points(&[]).is_empty());
    }

    #[test]
    fn radial_layout_reproduces_for_same_rows() {
        let values: Vec<(String, ColumnValue)> = (0..20)
            .map(|i| (format!("row_{i}"), ColumnValue::Number(i as f64)))
            .collect();
        let a = radial_points(&values);
        let b = radial_points(&values);
        for (p, q) in a.iter().zip(&b) {
            assert_eq!(p.position, q.position);
            assert_eq!(p.size, q.size);
        }
    }

    #[test]
    fn numeric_outliers_are_flagged_and_distant() {
        let mut values: Vec<(String, ColumnValue)> = (0..30)
            .map(|i| (format!("r{i}"), ColumnValue::Number(10.0)))
            .collect();
        values.push(("outlier".into(), ColumnValue::Number(1000.0)));
        let points = radial_points(&values);
        let outlier = points.iter().find(|p| p.row_id == "outlier").unwrap();
        let typical = points.iter().find(|p| p.row_id == "r0").unwrap();
        assert_eq!(outlier.severity, HealthStatus::Critical);
        assert!(outlier.position.length() > typical.position.length());
    }

    #[test]
    fn rare_categories_drift_outward() {
        let mut values: Vec<(String, ColumnValue)> = (0..9)
            .map(|i| (format!("c{i}"), ColumnValue::Text("common".into())))
            .collect();
        values.push(("rare".into(), ColumnValue::Text("rare".into())));
        let points = radial_points(&values);
        let rare = points.iter().find(|p| p.row_id == "rare").unwrap();
        let common = points.iter().find(|p| p.row_id == "c0").unwrap();
        assert!(rare.position.length() > common.position.length());
        assert!(rare.size < common.size);
    }
}
