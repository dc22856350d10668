//! Backend graph contract and derived schema metrics.
//!
//! The backend ships an opaque JSON graph of tables and relationships. This
//! module decodes it, fills the documented fallback constants for missing
//! numeric fields, drops edges that reference unknown tables, and derives
//! the degree counts the layout and topology passes consume.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use thiserror::Error;

/// Fallback when the backend omits `vitality`.
pub const DEFAULT_VITALITY: f64 = 50.0;
/// Fallback when the backend omits both `size` and `row_count`.
pub const DEFAULT_SIZE: f64 = 40.0;
/// Fallback when the backend omits `traffic_intensity`.
pub const DEFAULT_TRAFFIC_INTENSITY: f64 = 0.3;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to decode graph snapshot: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Health status of a table, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Healthy,
    Warning,
    Critical,
}

/// AI-suggested impact level attached to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Critical,
    High,
    Medium,
    Low,
}

/// Backend-supplied color: either a hex string or a packed 0xRRGGBB value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Hex(String),
    Packed(u32),
}

/// A table in the schema graph with its backend-computed metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableNode {
    /// Stable identifier.
    pub id: String,
    /// Display name; falls back to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// Explicit backend color, used verbatim when present.
    #[serde(default)]
    pub color: Option<ColorSpec>,
    /// Explicit base size, overriding the row-count derivation.
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub row_count: Option<u64>,
    /// Health metric in 0-100.
    #[serde(default = "default_vitality")]
    pub vitality: f64,
    /// Cluster tag used by zoom-to-cluster targeting.
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub table_type: Option<String>,
    #[serde(default)]
    pub entropy: f64,
    #[serde(default)]
    pub gravity: f64,
    #[serde(default)]
    pub in_degree: Option<usize>,
    #[serde(default)]
    pub out_degree: Option<usize>,
    #[serde(default = "default_glow")]
    pub node_glow: f64,
    /// Pins the table to the galaxy center.
    #[serde(default)]
    pub is_core: bool,
    #[serde(default)]
    pub status: HealthStatus,
    #[serde(default)]
    pub impact: Option<Impact>,
}

fn default_vitality() -> f64 {
    DEFAULT_VITALITY
}

fn default_glow() -> f64 {
    1.0
}

impl TableNode {
    /// A node with only an id set; every metric at its documented fallback.
    pub fn bare(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            color: None,
            size: None,
            row_count: None,
            vitality: DEFAULT_VITALITY,
            cluster: None,
            table_type: None,
            entropy: 0.0,
            gravity: 0.0,
            in_degree: None,
            out_degree: None,
            node_glow: 1.0,
            is_core: false,
            status: HealthStatus::Healthy,
            impact: None,
        }
    }

    /// Display name, falling back to the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Activity level normalized to 0.0-1.0, derived from row count.
    pub fn activity(&self) -> f64 {
        let rows = self.row_count.unwrap_or(0) as f64;
        ((rows + 1.0).log10() / 6.0).clamp(0.0, 1.0)
    }

    /// True when the table is in a warning/low-vitality state.
    pub fn is_distressed(&self) -> bool {
        self.status != HealthStatus::Healthy || self.vitality < 30.0
    }
}

/// Category of a relationship between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[default]
    ForeignKey,
    Inferred,
}

/// A directed relationship between two tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub kind: RelationKind,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "default_traffic")]
    pub traffic_intensity: f64,
    #[serde(default = "default_glow")]
    pub edge_glow: f64,
}

fn default_confidence() -> f64 {
    1.0
}

fn default_traffic() -> f64 {
    DEFAULT_TRAFFIC_INTENSITY
}

/// Raw graph payload as shipped by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<TableNode>,
    #[serde(default)]
    pub edges: Vec<RelationEdge>,
}

impl GraphSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Per-table entry of a time-indexed evolution snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionEntry {
    pub relative_size: f64,
    #[serde(default = "default_glow")]
    pub node_glow: f64,
    /// 0.0 = brand new, 1.0 = as old as the schema.
    #[serde(default = "default_age")]
    pub age_factor: f64,
    #[serde(default)]
    pub is_new: bool,
}

fn default_age() -> f64 {
    1.0
}

/// Snapshot of per-table relative size and age at one evolution step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionSnapshot {
    pub tables: HashMap<String, EvolutionEntry>,
}

/// Validated schema graph: every edge references known tables, and degree
/// counts are filled in where the backend left them out.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    pub nodes: Vec<TableNode>,
    pub edges: Vec<RelationEdge>,
}

impl SchemaGraph {
    /// Validate a raw snapshot. Edges referencing unknown ids are skipped,
    /// never rendered dangling.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let ids: HashMap<&str, usize> = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut edges = Vec::with_capacity(snapshot.edges.len());
        for edge in snapshot.edges {
            if !ids.contains_key(edge.source.as_str()) || !ids.contains_key(edge.target.as_str()) {
                tracing::warn!(
                    source = %edge.source,
                    target = %edge.target,
                    "skipping edge with unknown endpoint"
                );
                continue;
            }
            edges.push(edge);
        }

        let mut nodes = snapshot.nodes;
        {
            let (in_degrees, out_degrees) = degrees(&nodes, &edges);
            let in_degrees: HashMap<String, usize> = in_degrees
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            let out_degrees: HashMap<String, usize> = out_degrees
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            for node in &mut nodes {
                if node.in_degree.is_none() {
                    node.in_degree = in_degrees.get(&node.id).copied();
                }
                if node.out_degree.is_none() {
                    node.out_degree = out_degrees.get(&node.id).copied();
                }
            }
        }

        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&TableNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deterministic fingerprint over ids and metrics; same schema, same
    /// fingerprint. Used as the demo-data seed source.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for node in &self.nodes {
            hasher.update(node.id.as_bytes());
            hasher.update(node.vitality.to_le_bytes());
            hasher.update(node.gravity.to_le_bytes());
            hasher.update(node.entropy.to_le_bytes());
            hasher.update(node.row_count.unwrap_or(0).to_le_bytes());
        }
        for edge in &self.edges {
            hasher.update(edge.source.as_bytes());
            hasher.update(edge.target.as_bytes());
            hasher.update(edge.traffic_intensity.to_le_bytes());
        }
        hasher.finalize().into()
    }

    /// Generate a deterministic sample schema for demos and tests.
    pub fn sample(seed: u64) -> Self {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

        let names = [
            "customers",
            "orders",
            "order_items",
            "products",
            "payments",
            "sessions",
            "events",
            "inventory",
            "shipments",
            "audit_log",
        ];

        let nodes: Vec<TableNode> = names
            .iter()
            .enumerate()
            .map(|(i, name)| TableNode {
                row_count: Some(rng.gen_range(100..5_000_000)),
                vitality: rng.gen_range(20.0..100.0),
                cluster: Some((if i < 5 { "commerce" } else { "telemetry" }).to_string()),
                table_type: if *name == "events" || *name == "audit_log" {
                    Some("fact".to_string())
                } else {
                    None
                },
                entropy: rng.gen_range(0.0..4.0),
                gravity: rng.gen_range(0.0..10.0),
                node_glow: rng.gen_range(0.5..2.0),
                is_core: i == 0,
                status: if rng.gen_bool(0.15) {
                    HealthStatus::Warning
                } else {
                    HealthStatus::Healthy
                },
                ..TableNode::bare(name)
            })
            .collect();

        let pairs = [
            ("orders", "customers"),
            ("order_items", "orders"),
            ("order_items", "products"),
            ("payments", "orders"),
            ("sessions", "customers"),
            ("events", "sessions"),
            ("inventory", "products"),
            ("shipments", "orders"),
            ("audit_log", "orders"),
            ("audit_log", "payments"),
        ];

        let edges = pairs
            .iter()
            .map(|(source, target)| RelationEdge {
                source: source.to_string(),
                target: target.to_string(),
                kind: RelationKind::ForeignKey,
                confidence: rng.gen_range(0.6..1.0),
                traffic_intensity: rng.gen_range(0.1..3.0),
                edge_glow: rng.gen_range(0.5..2.0),
            })
            .collect();

        Self::from_snapshot(GraphSnapshot { nodes, edges })
    }
}

/// Count incoming and outgoing edges per table id.
pub fn degrees<'a>(
    nodes: &'a [TableNode],
    edges: &[RelationEdge],
) -> (HashMap<&'a str, usize>, HashMap<&'a str, usize>) {
    let mut in_degrees: HashMap<&str, usize> = HashMap::new();
    let mut out_degrees: HashMap<&str, usize> = HashMap::new();

    for node in nodes {
        in_degrees.insert(node.id.as_str(), 0);
        out_degrees.insert(node.id.as_str(), 0);
    }

    for edge in edges {
        if let Some(count) = out_degrees.get_mut(edge.source.as_str()) {
            *count += 1;
        }
        if let Some(count) = in_degrees.get_mut(edge.target.as_str()) {
            *count += 1;
        }
    }

    (in_degrees, out_degrees)
}

/// One value from a drilled-in column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Number(f64),
    Text(String),
}

/// Distribution statistics for a column, computed once per drill-in.
#[derive(Debug, Clone)]
pub enum ColumnProfile {
    Numeric {
        mean: f64,
        std_dev: f64,
        min: f64,
        max: f64,
    },
    Categorical {
        freq: HashMap<String, usize>,
        max_freq: usize,
    },
}

impl ColumnProfile {
    /// Profile a column. A column is numeric when every value is a number;
    /// anything else is treated as categorical (numbers stringified).
    pub fn from_values(values: &[ColumnValue]) -> Self {
        let numbers: Vec<f64> = values
            .iter()
            .filter_map(|v| match v {
                ColumnValue::Number(n) => Some(*n),
                ColumnValue::Text(_) => None,
            })
            .collect();

        if !values.is_empty() && numbers.len() == values.len() {
            let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
            let variance =
                numbers.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / numbers.len() as f64;
            let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            return Self::Numeric {
                mean,
                std_dev: variance.sqrt(),
                min,
                max,
            };
        }

        let mut freq: HashMap<String, usize> = HashMap::new();
        for value in values {
            let key = match value {
                ColumnValue::Number(n) => n.to_string(),
                ColumnValue::Text(s) => s.clone(),
            };
            *freq.entry(key).or_insert(0) += 1;
        }
        let max_freq = freq.values().copied().max().unwrap_or(0);
        Self::Categorical { freq, max_freq }
    }

    /// Z-score of a numeric value against this profile; zero when the
    /// column has no spread.
    pub fn z_score(&self, value: f64) -> f64 {
        match self {
            Self::Numeric { mean, std_dev, .. } if *std_dev > 0.0 => (value - mean) / std_dev,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_fill_missing_numeric_fields() {
        let json = r#"{
            "nodes": [{"id": "users"}],
            "edges": []
        }"#;
        let snapshot = GraphSnapshot::from_json(json).unwrap();
        let node = &snapshot.nodes[0];
        assert_eq!(node.vitality, DEFAULT_VITALITY);
        assert_eq!(node.node_glow, 1.0);
        assert_eq!(node.status, HealthStatus::Healthy);
        assert!(!node.is_core);
    }

    #[test]
    fn edge_defaults() {
        let json = r#"{
            "nodes": [{"id": "a"}, {"id": "b"}],
            "edges": [{"source": "a", "target": "b"}]
        }"#;
        let snapshot = GraphSnapshot::from_json(json).unwrap();
        let edge = &snapshot.edges[0];
        assert_eq!(edge.traffic_intensity, DEFAULT_TRAFFIC_INTENSITY);
        assert_eq!(edge.confidence, 1.0);
        assert_eq!(edge.kind, RelationKind::ForeignKey);
    }

    #[test]
    fn color_spec_accepts_hex_and_packed() {
        let json = r##"{
            "nodes": [
                {"id": "a", "color": "#ff8800"},
                {"id": "b", "color": 16711680}
            ]
        }"##;
        let snapshot = GraphSnapshot::from_json(json).unwrap();
        assert_eq!(
            snapshot.nodes[0].color,
            Some(ColorSpec::Hex("#ff8800".into()))
        );
        assert_eq!(snapshot.nodes[1].color, Some(ColorSpec::Packed(0xff0000)));
    }

    #[test]
    fn dangling_edges_are_skipped() {
        let json = r#"{
            "nodes": [{"id": "a"}, {"id": "b"}],
            "edges": [
                {"source": "a", "target": "b"},
                {"source": "a", "target": "ghost"},
                {"source": "phantom", "target": "b"}
            ]
        }"#;
        let snapshot = GraphSnapshot::from_json(json).unwrap();
        let graph = SchemaGraph::from_snapshot(snapshot);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].target, "b");
    }

    #[test]
    fn degrees_derived_from_surviving_edges() {
        let graph = SchemaGraph::from_snapshot(GraphSnapshot {
            nodes: vec![
                TableNode::bare("a"),
                TableNode::bare("b"),
                TableNode::bare("c"),
            ],
            edges: vec![edge("a", "b"), edge("c", "b"), edge("b", "a")],
        });
        let b = graph.node("b").unwrap();
        assert_eq!(b.in_degree, Some(2));
        assert_eq!(b.out_degree, Some(1));
    }

    #[test]
    fn empty_snapshot_is_fine() {
        let graph = SchemaGraph::from_snapshot(GraphSnapshot::default());
        assert!(graph.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn sample_is_deterministic() {
        let a = SchemaGraph::sample(7);
        let b = SchemaGraph::sample(7);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn numeric_column_profile() {
        let values: Vec<ColumnValue> = [10.0, 12.0, 8.0, 10.0]
            .iter()
            .map(|n| ColumnValue::Number(*n))
            .collect();
        let profile = ColumnProfile::from_values(&values);
        match &profile {
            ColumnProfile::Numeric { mean, min, max, .. } => {
                assert_eq!(*mean, 10.0);
                assert_eq!(*min, 8.0);
                assert_eq!(*max, 12.0);
            }
            _ => panic!("expected numeric profile"),
        }
        assert!(profile.z_score(10.0).abs() < 1e-9);
    }

    #[test]
    fn mixed_column_is_categorical() {
        let values = vec![
            ColumnValue::Text("eu".into()),
            ColumnValue::Text("eu".into()),
            ColumnValue::Number(3.0),
        ];
        match ColumnProfile::from_values(&values) {
            ColumnProfile::Categorical { freq, max_freq } => {
                assert_eq!(max_freq, 2);
                assert_eq!(freq["eu"], 2);
            }
            _ => panic!("expected categorical profile"),
        }
    }

    fn edge(source: &str, target: &str) -> RelationEdge {
        RelationEdge {
            source: source.into(),
            target: target.into(),
            kind: RelationKind::ForeignKey,
            confidence: 1.0,
            traffic_intensity: DEFAULT_TRAFFIC_INTENSITY,
            edge_glow: 1.0,
        }
    }
}
