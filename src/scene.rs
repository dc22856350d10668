//! The living scene: per-frame animation and interaction state.
//!
//! A `Scene` owns every node, edge and particle plus the camera, and is
//! advanced by a single cooperative `update(dt)` tick. External callers
//! (pointer events, agent commands) never touch geometry; they dispatch
//! commands into an inbox that the next tick consumes. Within one tick the
//! order is fixed: commands, clock, camera, nodes, edges, particles, spawn.

use crate::camera::CameraRig;
use crate::config::OrreryConfig;
use crate::curve::EdgeCurve;
use crate::layout;
use crate::metrics::{EvolutionSnapshot, RelationKind, SchemaGraph, TableNode};
use crate::rng::SeededRng;
use crate::sound::{Cue, NullSound, SoundService};
use crate::topology::{self, Topology};
use crate::visual;
use glam::DVec3;
use std::collections::{HashMap, HashSet};

/// Highlight state of a node or edge this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightState {
    #[default]
    Idle,
    Hover,
    Related,
    Dimmed,
}

impl HighlightState {
    fn target_opacity(self) -> f64 {
        match self {
            Self::Hover => 1.0,
            Self::Related => 0.85,
            Self::Idle => 0.8,
            Self::Dimmed => 0.18,
        }
    }

    fn target_emissive(self) -> f64 {
        match self {
            Self::Hover => 1.0,
            Self::Related => 0.55,
            Self::Idle => 0.3,
            Self::Dimmed => 0.05,
        }
    }
}

/// A table with its render state. Base position is recomputed only on
/// layout passes; `position` carries the per-frame float offset.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub table: TableNode,
    pub base_position: DVec3,
    pub position: DVec3,
    pub color: String,
    pub base_size: f64,
    pub scale: f64,
    pub opacity: f64,
    pub emissive: f64,
    /// Current glow including the pulse.
    pub glow: f64,
    pub state: HighlightState,
    /// Birth flash progress, 1.0 at birth decaying to 0.
    pub birth_flash: f64,
    glow_metric: f64,
    target_scale: f64,
    age_dim: f64,
}

/// A relationship with its cached curve and animated opacity.
#[derive(Debug, Clone)]
pub struct SceneEdge {
    pub source: usize,
    pub target: usize,
    pub kind: RelationKind,
    pub intensity: f64,
    /// Stroke width from intensity.
    pub width: f64,
    /// Intensity-derived opacity cap; the animated value scales under it.
    pub weight: f64,
    pub curve: EdgeCurve,
    pub opacity: f64,
    /// Breathing lift applied to the curve midpoint while active.
    pub bulge: f64,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleClass {
    Normal,
    HighTraffic,
    Anomaly,
}

/// In-flight activity along one edge's curve.
#[derive(Debug, Clone)]
pub struct Particle {
    pub edge: usize,
    pub progress: f64,
    pub speed: f64,
    pub class: ParticleClass,
    pub position: DVec3,
}

/// The closed command set collaborators may dispatch. Commands only set
/// intent; the next `update` consumes them.
#[derive(Debug, Clone)]
pub enum Command {
    Hover(Option<String>),
    Select(Option<String>),
    TraceLineage(String),
    ClearLineage,
    /// Focus the camera on a table by id or display name.
    HighlightNode(String),
    /// Frame every table matching a cluster, type, or name.
    ZoomToCluster(String),
    SetEvolutionSnapshot(EvolutionSnapshot),
    SetThroughput(f64),
    StartFlow,
    StopFlow,
    ResetView,
}

struct Lineage {
    origin: usize,
    members: HashSet<usize>,
}

pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
    pub particles: Vec<Particle>,
    pub camera: CameraRig,
    config: OrreryConfig,
    index: HashMap<String, usize>,
    neighbors: Vec<HashSet<usize>>,
    inbox: Vec<Command>,
    hovered: Option<usize>,
    selected: Option<usize>,
    lineage: Option<Lineage>,
    flow_enabled: bool,
    throughput: f64,
    time: f64,
    spawn_clock: f64,
    spawn_tally: [usize; 3],
    field_rng: SeededRng,
    sound: Box<dyn SoundService>,
}

impl Scene {
    pub fn new(graph: SchemaGraph, config: OrreryConfig) -> Self {
        let camera = CameraRig::new(
            DVec3::from(config.camera.home_position),
            DVec3::from(config.camera.home_target),
        );
        let mut scene = Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            particles: Vec::new(),
            camera,
            config,
            index: HashMap::new(),
            neighbors: Vec::new(),
            inbox: Vec::new(),
            hovered: None,
            selected: None,
            lineage: None,
            flow_enabled: false,
            throughput: 0.0,
            time: 0.0,
            spawn_clock: 0.0,
            spawn_tally: [0; 3],
            field_rng: SeededRng::from_key("particle-field"),
            sound: Box::new(NullSound),
        };
        scene.load(graph);
        scene
    }

    pub fn with_sound(mut self, sound: Box<dyn SoundService>) -> Self {
        self.sound = sound;
        self.sound.init();
        self
    }

    /// Replace the dataset. Nodes, edges and particles are rebuilt
    /// atomically; no handle from the previous dataset survives.
    pub fn load(&mut self, graph: SchemaGraph) {
        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "loading schema graph"
        );
        let positions = layout::galaxy_positions(&graph.nodes, self.config.layout.galaxy_radius);

        self.index = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        self.nodes = graph
            .nodes
            .into_iter()
            .zip(positions)
            .map(|(table, base_position)| {
                let color = visual::node_color(&table);
                let base_size = visual::node_size(&table);
                let glow_metric = table.node_glow;
                SceneNode {
                    table,
                    base_position,
                    position: base_position,
                    color,
                    base_size,
                    scale: 1.0,
                    opacity: HighlightState::Idle.target_opacity(),
                    emissive: HighlightState::Idle.target_emissive(),
                    glow: glow_metric,
                    state: HighlightState::Idle,
                    birth_flash: 0.0,
                    glow_metric,
                    target_scale: 1.0,
                    age_dim: 1.0,
                }
            })
            .collect();

        self.edges = graph
            .edges
            .iter()
            .map(|edge| {
                let source = self.index[&edge.source];
                let target = self.index[&edge.target];
                let intensity = edge.traffic_intensity * edge.confidence * edge.edge_glow;
                SceneEdge {
                    source,
                    target,
                    kind: edge.kind,
                    intensity,
                    width: visual::edge_width(intensity),
                    weight: visual::edge_opacity(intensity),
                    curve: EdgeCurve::build(
                        self.nodes[source].base_position,
                        self.nodes[target].base_position,
                        &edge.source,
                        &edge.target,
                    ),
                    opacity: 0.15,
                    bulge: 0.0,
                    active: false,
                }
            })
            .collect();

        self.neighbors = vec![HashSet::new(); self.nodes.len()];
        for edge in &self.edges {
            self.neighbors[edge.source].insert(edge.target);
            self.neighbors[edge.target].insert(edge.source);
        }

        self.particles.clear();
        self.hovered = None;
        self.selected = None;
        self.lineage = None;
        self.spawn_clock = 0.0;
        self.spawn_tally = [0; 3];
    }

    /// Particles spawned since the last dataset load, by class
    /// (normal, high-traffic, anomaly).
    pub fn spawn_tally(&self) -> [usize; 3] {
        self.spawn_tally
    }

    /// Queue a command for the next tick.
    pub fn dispatch(&mut self, command: Command) {
        self.inbox.push(command);
    }

    /// Advance one cooperative tick. Fixed order: commands, clock, camera,
    /// nodes, edges, particles, spawner.
    pub fn update(&mut self, dt: f64) {
        for command in std::mem::take(&mut self.inbox) {
            self.apply(command);
        }
        self.time += dt;
        self.camera.update(dt);
        self.update_nodes(dt);
        self.update_edges();
        self.update_particles();
        self.tick_spawner(dt);
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn flow_enabled(&self) -> bool {
        self.flow_enabled
    }

    /// Nearest table hit by a pointer ray, if any.
    pub fn pick(&self, origin: DVec3, direction: DVec3) -> Option<&str> {
        let direction = direction.normalize_or_zero();
        if direction == DVec3::ZERO {
            return None;
        }
        let mut best: Option<(f64, &str)> = None;
        for node in &self.nodes {
            let radius = node.base_size * node.scale * 0.5;
            let to_center = node.position - origin;
            let along = to_center.dot(direction);
            if along < 0.0 {
                continue;
            }
            let off_axis_sq = to_center.length_squared() - along * along;
            if off_axis_sq > radius * radius {
                continue;
            }
            let hit = along - (radius * radius - off_axis_sq).sqrt();
            if best.map(|(t, _)| hit < t).unwrap_or(true) {
                best = Some((hit, node.table.id.as_str()));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Particle-formation geometry around a table, shaped by its degree
    /// topology.
    pub fn formation_for(&self, id: &str, count: usize) -> Option<(Topology, Vec<DVec3>)> {
        let node = self.nodes.get(*self.index.get(id)?)?;
        let class = topology::classify(
            node.table.in_degree.unwrap_or(0),
            node.table.out_degree.unwrap_or(0),
        );
        let radius = node.base_size * 1.5;
        let points = topology::formation_points(class.topology, count, radius)
            .into_iter()
            .map(|p| p + node.position)
            .collect();
        Some((class.topology, points))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.map(|i| self.nodes[i].table.id.as_str())
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Hover(id) => {
                self.hovered = id.and_then(|id| self.index.get(&id).copied());
            }
            Command::Select(id) => {
                self.selected = id.and_then(|id| self.index.get(&id).copied());
                if self.selected.is_some() {
                    self.sound.play(Cue::Select);
                }
            }
            Command::TraceLineage(id) => {
                if let Some(&origin) = self.index.get(&id) {
                    self.lineage = Some(Lineage {
                        origin,
                        members: self.downstream_of(origin),
                    });
                }
            }
            Command::ClearLineage => self.lineage = None,
            Command::HighlightNode(key) => {
                if let Some(i) = self.resolve(&key) {
                    self.selected = Some(i);
                    self.sound.play(Cue::Select);
                    let pos = self.nodes[i].base_position;
                    self.camera.focus_on(
                        pos + DVec3::new(0.0, 60.0, 240.0),
                        pos,
                        self.config.camera.transition_secs,
                    );
                } else {
                    tracing::warn!(%key, "highlight target not found");
                }
            }
            Command::ZoomToCluster(key) => {
                let needle = key.to_lowercase();
                let points: Vec<DVec3> = self
                    .nodes
                    .iter()
                    .filter(|n| {
                        n.table
                            .cluster
                            .as_deref()
                            .is_some_and(|c| c.to_lowercase() == needle)
                            || n.table
                                .table_type
                                .as_deref()
                                .is_some_and(|t| t.to_lowercase() == needle)
                            || n.table.label().to_lowercase() == needle
                    })
                    .map(|n| n.base_position)
                    .collect();
                if points.is_empty() {
                    tracing::warn!(%key, "no tables match cluster");
                } else {
                    self.camera
                        .fit_to(&points, self.config.camera.transition_secs);
                }
            }
            Command::SetEvolutionSnapshot(snapshot) => self.apply_evolution(&snapshot),
            Command::SetThroughput(tps) => self.throughput = tps.max(0.0),
            Command::StartFlow => {
                self.flow_enabled = true;
                self.sound.play(Cue::FlowStart);
            }
            Command::StopFlow => {
                self.flow_enabled = false;
                self.particles.clear();
                self.sound.play(Cue::FlowStop);
            }
            Command::ResetView => {
                self.selected = None;
                self.lineage = None;
                self.camera.reset_view(self.config.camera.transition_secs);
            }
        }
    }

    fn resolve(&self, key: &str) -> Option<usize> {
        if let Some(&i) = self.index.get(key) {
            return Some(i);
        }
        let needle = key.to_lowercase();
        self.nodes
            .iter()
            .position(|n| n.table.label().to_lowercase() == needle)
    }

    fn downstream_of(&self, origin: usize) -> HashSet<usize> {
        let mut members = HashSet::from([origin]);
        let mut frontier = vec![origin];
        while let Some(current) = frontier.pop() {
            for edge in &self.edges {
                if edge.source == current && members.insert(edge.target) {
                    frontier.push(edge.target);
                }
            }
        }
        members
    }

    fn apply_evolution(&mut self, snapshot: &EvolutionSnapshot) {
        let mut any_born = false;
        for node in &mut self.nodes {
            let Some(entry) = snapshot.tables.get(&node.table.id) else {
                continue;
            };
            node.target_scale = entry.relative_size.max(0.05);
            node.glow_metric = entry.node_glow;
            node.age_dim = 0.5 + 0.5 * entry.age_factor.clamp(0.0, 1.0);
            if entry.is_new {
                node.birth_flash = 1.0;
                any_born = true;
            }
        }
        if any_born {
            self.sound.play(Cue::Birth);
        }
    }

    fn update_nodes(&mut self, dt: f64) {
        let states: Vec<HighlightState> =
            (0..self.nodes.len()).map(|i| self.state_for(i)).collect();
        let smoothing = self.config.visual.smoothing;
        let flash_rate = 1.0 / self.config.visual.birth_flash_secs.max(1e-6);
        let base_amplitude = self.config.visual.float_amplitude;
        let time = self.time;

        for (node, state) in self.nodes.iter_mut().zip(states) {
            node.state = state;
            let target_opacity = state.target_opacity() * node.age_dim;
            node.opacity += (target_opacity - node.opacity) * smoothing;
            node.emissive += (state.target_emissive() - node.emissive) * smoothing;
            node.glow = visual::glow_intensity(node.glow_metric, time);

            if node.birth_flash > 0.0 {
                node.birth_flash = (node.birth_flash - dt * flash_rate).max(0.0);
            }
            let scale_target = if node.birth_flash > 0.0 {
                node.target_scale * 2.0
            } else {
                node.target_scale
            };
            node.scale += (scale_target - node.scale) * smoothing;

            let amplitude = visual::float_amplitude(node.glow_metric, base_amplitude);
            let float_y = (time + node.table.id.len() as f64).sin() * amplitude;
            node.position = node.base_position + DVec3::Y * float_y;
        }
    }

    fn state_for(&self, i: usize) -> HighlightState {
        if self.selected == Some(i) {
            return HighlightState::Hover;
        }
        if let Some(lineage) = &self.lineage {
            if lineage.origin == i {
                return HighlightState::Hover;
            }
        }
        if self.hovered == Some(i) {
            return HighlightState::Hover;
        }
        if let Some(h) = self.hovered {
            if self.neighbors[h].contains(&i) {
                return HighlightState::Related;
            }
        }
        if let Some(lineage) = &self.lineage {
            if lineage.members.contains(&i) {
                return HighlightState::Related;
            }
        }
        if self.hovered.is_some() || self.lineage.is_some() {
            return HighlightState::Dimmed;
        }
        HighlightState::Idle
    }

    fn update_edges(&mut self) {
        let smoothing = self.config.visual.smoothing;
        let hovered = self.hovered;
        let selected = self.selected;
        let context_active = hovered.is_some() || self.lineage.is_some();
        let time = self.time;

        for edge in &mut self.edges {
            let endpoint_hot = [hovered, selected]
                .iter()
                .flatten()
                .any(|&i| i == edge.source || i == edge.target);
            let on_lineage_path = self.lineage.as_ref().is_some_and(|l| {
                l.members.contains(&edge.source) && l.members.contains(&edge.target)
            });

            let target = if endpoint_hot || on_lineage_path {
                0.8
            } else if context_active {
                0.05
            } else {
                0.15
            };
            edge.opacity += (target - edge.opacity) * smoothing;
            edge.active = endpoint_hot;
            edge.bulge = if endpoint_hot {
                (time * 3.0).sin() * 4.0
            } else {
                edge.bulge * 0.9
            };
        }
    }

    fn update_particles(&mut self) {
        let edges = &self.edges;
        self.particles.retain_mut(|particle| {
            particle.progress += particle.speed;
            if particle.progress >= 1.0 {
                return false;
            }
            particle.position = edges[particle.edge].curve.point_at(particle.progress);
            true
        });
    }

    fn tick_spawner(&mut self, dt: f64) {
        let interval = self.config.flow.spawn_interval_ms as f64 / 1000.0;
        self.spawn_clock += dt;
        while self.spawn_clock >= interval {
            self.spawn_clock -= interval;
            self.spawn_particle();
        }
    }

    fn spawn_particle(&mut self) {
        if !self.flow_enabled || self.throughput <= 0.0 || self.edges.is_empty() {
            return;
        }
        let edge_idx = self.field_rng.index(self.edges.len());
        let edge = &self.edges[edge_idx];
        let source = &self.nodes[edge.source];

        let flow = &self.config.flow;
        let speed = (source.table.activity() * self.throughput * flow.velocity_scale)
            .clamp(flow.velocity_min, flow.velocity_max);
        let class = if source.table.is_distressed() {
            ParticleClass::Anomaly
        } else if speed > flow.high_traffic_threshold {
            ParticleClass::HighTraffic
        } else {
            ParticleClass::Normal
        };
        self.spawn_tally[match class {
            ParticleClass::Normal => 0,
            ParticleClass::HighTraffic => 1,
            ParticleClass::Anomaly => 2,
        }] += 1;

        self.particles.push(Particle {
            edge: edge_idx,
            progress: 0.0,
            speed,
            class,
            position: edge.curve.point_at(0.0),
        });
    }
}
