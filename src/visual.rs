//! Visual attribute mapping.
//!
//! Maps backend metrics (row counts, vitality, glow, impact) to color,
//! size, opacity and glow intensity through fixed formulas, so the same
//! table always renders the same way.

use crate::metrics::{ColorSpec, HealthStatus, Impact, TableNode};

/// Fixed role colors and color helpers.
pub mod palette {
    /// Scene background.
    pub const BG: &str = "#05060f";

    /// Core/hub tables pinned at the galaxy center.
    pub const CORE: &str = "#f5c542";
    /// Warning / anomalous tables.
    pub const WARNING: &str = "#ff6b4a";
    /// Fact-like tables (events, transactions, logs).
    pub const FACT: &str = "#4aa8ff";
    /// Everything else: dimension tables.
    pub const DIMENSION: &str = "#8a7fd8";

    /// Particle tints by classification.
    pub const PARTICLE_NORMAL: &str = "#9ad1ff";
    pub const PARTICLE_HIGH_TRAFFIC: &str = "#ffb347";
    pub const PARTICLE_ANOMALY: &str = "#ff4a4a";

    /// Parse a `#rrggbb` string; falls back to the dimension color on
    /// malformed input.
    pub fn parse_hex(hex: &str) -> (u8, u8, u8) {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return parse_hex(DIMENSION);
        }
        match u32::from_str_radix(hex, 16) {
            Ok(packed) => unpack(packed),
            Err(_) => parse_hex(DIMENSION),
        }
    }

    pub fn unpack(packed: u32) -> (u8, u8, u8) {
        (
            ((packed >> 16) & 0xff) as u8,
            ((packed >> 8) & 0xff) as u8,
            (packed & 0xff) as u8,
        )
    }

    pub fn to_hex(r: u8, g: u8, b: u8) -> String {
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Blend a color toward white; `amount` 0.0 keeps it, 1.0 whites out.
    pub fn lighten(hex: &str, amount: f64) -> String {
        let (r, g, b) = parse_hex(hex);
        let amount = amount.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f64 + (255.0 - c as f64) * amount) as u8;
        to_hex(mix(r), mix(g), mix(b))
    }
}

/// Hard ceiling for glow so pulsing never runs away.
pub const MAX_GLOW: f64 = 3.0;

/// Resolve a table's color. First match wins: core flag, explicit backend
/// color, warning status, fact-like type keyword, dimension default.
pub fn node_color(node: &TableNode) -> String {
    if node.is_core {
        return palette::CORE.to_string();
    }
    if let Some(color) = &node.color {
        return match color {
            ColorSpec::Hex(hex) => hex.clone(),
            ColorSpec::Packed(packed) => {
                let (r, g, b) = palette::unpack(*packed);
                palette::to_hex(r, g, b)
            }
        };
    }
    if node.status != HealthStatus::Healthy {
        return palette::WARNING.to_string();
    }
    if is_fact_like(node) {
        return palette::FACT.to_string();
    }
    palette::DIMENSION.to_string()
}

const FACT_KEYWORDS: &[&str] = &["fact", "event", "transaction", "log", "history"];

fn is_fact_like(node: &TableNode) -> bool {
    let matches = |s: &str| {
        let s = s.to_lowercase();
        FACT_KEYWORDS.iter().any(|k| s.contains(k))
    };
    node.table_type.as_deref().is_some_and(matches) || matches(node.label())
}

/// Resolve a table's base render size: the backend's explicit size, else a
/// log scale of the row count, with AI-impact multipliers layered on.
pub fn node_size(node: &TableNode) -> f64 {
    let base = match (node.size, node.row_count) {
        (Some(size), _) => size,
        (None, Some(rows)) => 16.0 + ((rows + 1) as f64).log10() * 12.0,
        (None, None) => crate::metrics::DEFAULT_SIZE,
    };
    base * impact_multiplier(node.impact)
}

fn impact_multiplier(impact: Option<Impact>) -> f64 {
    match impact {
        Some(Impact::Critical) => 1.5,
        Some(Impact::High) => 1.3,
        _ => 1.0,
    }
}

/// Glow intensity at a point in time: the backend glow metric plus a
/// sinusoidal pulse whose frequency and amplitude both scale with the
/// metric, clamped so stacked glows can't blow out the scene.
pub fn glow_intensity(node_glow: f64, time: f64) -> f64 {
    let pulse = (time * (0.8 + node_glow * 0.6)).sin() * 0.25 * node_glow;
    (node_glow + pulse).clamp(0.0, MAX_GLOW)
}

/// Vertical float amplitude grows with the glow metric.
pub fn float_amplitude(node_glow: f64, base_amplitude: f64) -> f64 {
    base_amplitude * (0.5 + node_glow * 0.5)
}

/// Edge stroke width from its traffic/confidence intensity.
pub fn edge_width(intensity: f64) -> f64 {
    (intensity * 1.5).clamp(1.5, 6.0)
}

/// Edge baseline opacity from its traffic/confidence intensity.
pub fn edge_opacity(intensity: f64) -> f64 {
    (intensity * 0.2).clamp(0.4, 0.9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn core_flag_beats_explicit_color() {
        let mut node = TableNode::bare("hub");
        node.is_core = true;
        node.color = Some(ColorSpec::Hex("#123456".into()));
        assert_eq!(node_color(&node), palette::CORE);
    }

    #[test]
    fn explicit_color_beats_warning_status() {
        let mut node = TableNode::bare("t");
        node.color = Some(ColorSpec::Hex("#123456".into()));
        node.status = HealthStatus::Warning;
        assert_eq!(node_color(&node), "#123456");
    }

    #[test]
    fn packed_color_is_formatted_as_hex() {
        let mut node = TableNode::bare("t");
        node.color = Some(ColorSpec::Packed(0x00ff88));
        assert_eq!(node_color(&node), "#00ff88");
    }

    #[test]
    fn warning_beats_fact_heuristic() {
        let mut node = TableNode::bare("events");
        node.status = HealthStatus::Critical;
        assert_eq!(node_color(&node), palette::WARNING);
    }

    #[test]
    fn fact_keyword_matches_type_and_name() {
        let mut by_type = TableNode::bare("t");
        by_type.table_type = Some("fact".into());
        assert_eq!(node_color(&by_type), palette::FACT);

        let by_name = TableNode::bare("page_events");
        assert_eq!(node_color(&by_name), palette::FACT);

        let plain = TableNode::bare("customers");
        assert_eq!(node_color(&plain), palette::DIMENSION);
    }

    #[test]
    fn size_prefers_backend_then_rows_then_default() {
        let mut node = TableNode::bare("t");
        node.size = Some(25.0);
        assert_eq!(node_size(&node), 25.0);

        node.size = None;
        node.row_count = Some(999_999);
        let derived = node_size(&node);
        assert!(derived > 80.0 && derived < 90.0, "derived {derived}");

        node.row_count = None;
        assert_eq!(node_size(&node), crate::metrics::DEFAULT_SIZE);
    }

    #[test]
    fn impact_multiplies_size() {
        let mut node = TableNode::bare("t");
        node.size = Some(40.0);
        node.impact = Some(Impact::Critical);
        assert_eq!(node_size(&node), 60.0);
        node.impact = Some(Impact::High);
        assert_eq!(node_size(&node), 52.0);
        node.impact = Some(Impact::Low);
        assert_eq!(node_size(&node), 40.0);
    }

    #[test]
    fn glow_never_exceeds_ceiling() {
        for step in 0..200 {
            let time = step as f64 * 0.1;
            let glow = glow_intensity(2.9, time);
            assert!((0.0..=MAX_GLOW).contains(&glow));
        }
    }

    #[test]
    fn edge_weight_clamps() {
        assert_eq!(edge_width(0.0), 1.5);
        assert_eq!(edge_width(2.0), 3.0);
        assert_eq!(edge_width(100.0), 6.0);
        assert_eq!(edge_opacity(0.5), 0.4);
        assert_eq!(edge_opacity(3.0), 0.6);
        assert_eq!(edge_opacity(100.0), 0.9);
    }

    #[test]
    fn lighten_moves_toward_white() {
        assert_eq!(palette::lighten("#000000", 1.0), "#ffffff");
        assert_eq!(palette::lighten("#102030", 0.0), "#102030");
    }
}
