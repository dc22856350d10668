//! SVG snapshots of the scene.
//!
//! Projects the scene through the camera (look-at basis, perspective
//! divide) and emits vector output: radial-gradient node glows, curved
//! edge paths, particles as bright dots. A snapshot is a pure function of
//! scene state, so rendering an unchanged scene twice yields identical
//! bytes.

use crate::camera::CameraRig;
use crate::scene::{ParticleClass, Scene};
use crate::visual::palette;
use glam::DVec3;

/// Anything closer than this to the camera plane is culled.
const NEAR_PLANE: f64 = 1.0;

pub struct SvgRenderer {
    pub width: u32,
    pub height: u32,
}

struct Projector {
    position: DVec3,
    right: DVec3,
    up: DVec3,
    forward: DVec3,
    focal: f64,
    cx: f64,
    cy: f64,
}

impl Projector {
    fn new(camera: &CameraRig, width: u32, height: u32) -> Self {
        let mut forward = (camera.target - camera.position).normalize_or_zero();
        if forward == DVec3::ZERO {
            forward = DVec3::NEG_Z;
        }
        let mut right = forward.cross(DVec3::Y).normalize_or_zero();
        if right == DVec3::ZERO {
            // looking straight up or down
            right = DVec3::X;
        }
        let up = right.cross(forward);
        Self {
            position: camera.position,
            right,
            up,
            forward,
            focal: height as f64 * 1.2,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }

    /// Screen position and view depth, or None when behind the camera.
    fn project(&self, point: DVec3) -> Option<(f64, f64, f64)> {
        let v = point - self.position;
        let z = v.dot(self.forward);
        if z < NEAR_PLANE {
            return None;
        }
        let x = v.dot(self.right) * self.focal / z;
        let y = v.dot(self.up) * self.focal / z;
        Some((self.cx + x, self.cy - y, z))
    }

    /// World-to-screen scale at a given depth.
    fn scale_at(&self, z: f64) -> f64 {
        self.focal / z
    }
}

impl SvgRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn render(&self, scene: &Scene) -> String {
        let projector = Projector::new(&scene.camera, self.width, self.height);

        let defs = self.build_defs(scene);
        let edges = self.draw_edges(scene, &projector);
        let nodes = self.draw_nodes(scene, &projector);
        let formation = self.draw_formation(scene, &projector);
        let particles = self.draw_particles(scene, &projector);

        self.wrap_svg(
            &defs,
            &format!("{edges}\n{nodes}\n{formation}\n{particles}"),
        )
    }

    fn build_defs(&self, scene: &Scene) -> String {
        let mut defs = String::from("<defs>\n");

        defs.push_str(
            "  <radialGradient id=\"vignette\" cx=\"50%\" cy=\"50%\" r=\"70%\">\n\
             \x20\x20\x20\x20<stop offset=\"0%\" stop-color=\"#000000\" stop-opacity=\"0\"/>\n\
             \x20\x20\x20\x20<stop offset=\"65%\" stop-color=\"#000000\" stop-opacity=\"0\"/>\n\
             \x20\x20\x20\x20<stop offset=\"100%\" stop-color=\"#000000\" stop-opacity=\"0.65\"/>\n\
             \x20\x20</radialGradient>\n",
        );

        defs.push_str(
            r#"  <filter id="softGlow" x="-100%" y="-100%" width="300%" height="300%">
    <feGaussianBlur in="SourceGraphic" stdDeviation="6" result="blur"/>
    <feMerge>
      <feMergeNode in="blur"/>
      <feMergeNode in="blur"/>
      <feMergeNode in="SourceGraphic"/>
    </feMerge>
  </filter>
"#,
        );

        for node in &scene.nodes {
            let gradient_id = sanitize(&node.table.id);
            let center = palette::lighten(&node.color, 0.55);
            let halo = palette::lighten(&node.color, 0.25);
            defs.push_str(&format!(
                r#"  <radialGradient id="nodeGrad_{gradient_id}" cx="35%" cy="35%" r="70%">
    <stop offset="0%" stop-color="{center}"/>
    <stop offset="100%" stop-color="{color}"/>
  </radialGradient>
  <radialGradient id="glowGrad_{gradient_id}">
    <stop offset="0%" stop-color="{halo}" stop-opacity="0.45"/>
    <stop offset="60%" stop-color="{halo}" stop-opacity="0.15"/>
    <stop offset="100%" stop-color="{halo}" stop-opacity="0"/>
  </radialGradient>
"#,
                color = node.color,
            ));
        }

        defs.push_str("</defs>");
        defs
    }

    fn draw_edges(&self, scene: &Scene, projector: &Projector) -> String {
        scene
            .edges
            .iter()
            .filter_map(|edge| {
                let start = projector.project(edge.curve.start())?;
                let control = projector.project(edge.curve.control_lifted(edge.bulge))?;
                let end = projector.project(edge.curve.end())?;

                let color = &scene.nodes[edge.source].color;
                let opacity = edge.opacity * edge.weight;
                Some(format!(
                    r#"<path d="M {:.1} {:.1} Q {:.1} {:.1} {:.1} {:.1}" fill="none" stroke="{}" stroke-width="{:.2}" opacity="{:.3}" stroke-linecap="round"/>"#,
                    start.0, start.1, control.0, control.1, end.0, end.1,
                    color, edge.width, opacity,
                ))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw_nodes(&self, scene: &Scene, projector: &Projector) -> String {
        // painter's order: far nodes first
        let mut projected: Vec<(&crate::scene::SceneNode, (f64, f64, f64))> = scene
            .nodes
            .iter()
            .filter_map(|node| projector.project(node.position).map(|p| (node, p)))
            .collect();
        projected.sort_by(|a, b| b.1 .2.total_cmp(&a.1 .2));

        projected
            .iter()
            .flat_map(|(node, (sx, sy, z))| {
                let gradient_id = sanitize(&node.table.id);
                let radius = node.base_size * node.scale * 0.5 * projector.scale_at(*z);
                let glow_radius = radius * (1.2 + node.glow * 0.8);

                let mut elements = vec![
                    format!(
                        r#"<circle cx="{sx:.1}" cy="{sy:.1}" r="{glow_radius:.1}" fill="url(#glowGrad_{gradient_id})" opacity="{:.3}"/>"#,
                        node.opacity * node.emissive.min(1.0),
                    ),
                    format!(
                        r#"<circle cx="{sx:.1}" cy="{sy:.1}" r="{radius:.1}" fill="url(#nodeGrad_{gradient_id})" opacity="{:.3}" filter="url(#softGlow)"/>"#,
                        node.opacity,
                    ),
                ];

                if node.birth_flash > 0.0 {
                    elements.push(format!(
                        r##"<circle cx="{sx:.1}" cy="{sy:.1}" r="{:.1}" fill="#ffffff" opacity="{:.3}"/>"##,
                        radius * 1.3,
                        node.birth_flash * 0.8,
                    ));
                }

                elements
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw_formation(&self, scene: &Scene, projector: &Projector) -> String {
        let Some(id) = scene.selected_id() else {
            return String::new();
        };
        let Some((_, points)) = scene.formation_for(id, 24) else {
            return String::new();
        };
        points
            .iter()
            .filter_map(|point| {
                let (sx, sy, z) = projector.project(*point)?;
                let r = (1.6 * projector.scale_at(z)).max(0.6);
                Some(format!(
                    r#"<circle cx="{sx:.1}" cy="{sy:.1}" r="{r:.1}" fill="{}" opacity="0.7"/>"#,
                    palette::PARTICLE_NORMAL,
                ))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw_particles(&self, scene: &Scene, projector: &Projector) -> String {
        scene
            .particles
            .iter()
            .filter_map(|particle| {
                let (sx, sy, z) = projector.project(particle.position)?;
                let color = match particle.class {
                    ParticleClass::Normal => palette::PARTICLE_NORMAL,
                    ParticleClass::HighTraffic => palette::PARTICLE_HIGH_TRAFFIC,
                    ParticleClass::Anomaly => palette::PARTICLE_ANOMALY,
                };
                let r = (2.2 * projector.scale_at(z)).max(0.8);
                Some(format!(
                    r#"<circle cx="{sx:.1}" cy="{sy:.1}" r="{r:.1}" fill="{color}" opacity="0.9"/>"#,
                ))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn wrap_svg(&self, defs: &str, content: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">
  {defs}
  <rect width="100%" height="100%" fill="{bg}"/>
  {content}
  <rect width="100%" height="100%" fill="url(#vignette)"/>
</svg>"#,
            w = self.width,
            h = self.height,
            defs = defs,
            bg = palette::BG,
            content = content,
        )
    }
}

impl SvgRenderer {
    /// Render a column drill-in: radial points around the origin, colored
    /// by severity, viewed from a fixed vantage.
    pub fn render_drill(&self, points: &[crate::layout::RadialPoint]) -> String {
        use crate::metrics::HealthStatus;

        let camera = CameraRig::new(DVec3::new(0.0, 14.0, 34.0), DVec3::ZERO);
        let projector = Projector::new(&camera, self.width, self.height);

        let mut projected: Vec<(&crate::layout::RadialPoint, (f64, f64, f64))> = points
            .iter()
            .filter_map(|p| projector.project(p.position).map(|s| (p, s)))
            .collect();
        projected.sort_by(|a, b| b.1 .2.total_cmp(&a.1 .2));

        let content = projected
            .iter()
            .map(|(point, (sx, sy, z))| {
                let color = match point.severity {
                    HealthStatus::Critical => palette::PARTICLE_ANOMALY,
                    HealthStatus::Warning => palette::WARNING,
                    HealthStatus::Healthy => palette::DIMENSION,
                };
                let r = (point.size * 1.4 * projector.scale_at(*z)).max(1.0);
                format!(
                    r#"<circle cx="{sx:.1}" cy="{sy:.1}" r="{r:.1}" fill="{color}" opacity="0.85" filter="url(#softGlow)"/>"#,
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let defs = r##"<defs>
  <radialGradient id="vignette" cx="50%" cy="50%" r="70%">
    <stop offset="0%" stop-color="#000000" stop-opacity="0"/>
    <stop offset="65%" stop-color="#000000" stop-opacity="0"/>
    <stop offset="100%" stop-color="#000000" stop-opacity="0.65"/>
  </radialGradient>
  <filter id="softGlow" x="-100%" y="-100%" width="300%" height="300%">
    <feGaussianBlur in="SourceGraphic" stdDeviation="3" result="blur"/>
    <feMerge>
      <feMergeNode in="blur"/>
      <feMergeNode in="SourceGraphic"/>
    </feMerge>
  </filter>
</defs>"##;

        self.wrap_svg(defs, &content)
    }
}

fn sanitize(id: &str) -> String {
    id.replace(|c: char| !c.is_alphanumeric(), "_")
}
