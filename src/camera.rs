//! Camera transitions.
//!
//! One rig, at most one active transition. Retargeting mid-flight captures
//! the current interpolated pose as the new start, so the camera glides
//! instead of jumping.

use glam::DVec3;

pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone)]
struct Transition {
    start_position: DVec3,
    start_target: DVec3,
    end_position: DVec3,
    end_target: DVec3,
    elapsed: f64,
    duration: f64,
}

/// Camera position + look-at target with eased transitions.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub position: DVec3,
    pub target: DVec3,
    home_position: DVec3,
    home_target: DVec3,
    transition: Option<Transition>,
}

impl CameraRig {
    pub fn new(home_position: DVec3, home_target: DVec3) -> Self {
        Self {
            position: home_position,
            target: home_target,
            home_position,
            home_target,
            transition: None,
        }
    }

    /// Start (or replace) a transition toward the given pose. The current
    /// interpolated pose becomes the new start.
    pub fn focus_on(&mut self, position: DVec3, target: DVec3, duration: f64) {
        if duration <= 0.0 {
            self.position = position;
            self.target = target;
            self.transition = None;
            return;
        }
        self.transition = Some(Transition {
            start_position: self.position,
            start_target: self.target,
            end_position: position,
            end_target: target,
            elapsed: 0.0,
            duration,
        });
    }

    /// Glide back to the home pose.
    pub fn reset_view(&mut self, duration: f64) {
        self.focus_on(self.home_position, self.home_target, duration);
    }

    /// Frame a set of points: look at the bounding-box center from an
    /// offset scaled by the box's largest dimension. An empty set resets.
    pub fn fit_to(&mut self, points: &[DVec3], duration: f64) {
        if points.is_empty() {
            self.reset_view(duration);
            return;
        }
        let mut min = points[0];
        let mut max = points[0];
        for p in &points[1..] {
            min = min.min(*p);
            max = max.max(*p);
        }
        let center = (min + max) * 0.5;
        let extent = (max - min).max_element().max(1.0);
        let offset = DVec3::new(0.0, 0.45, 1.0).normalize() * extent * 1.6;
        self.focus_on(center + offset, center, duration);
    }

    /// Advance the active transition, if any. Position and target land
    /// exactly on the end pose once elapsed reaches the duration.
    pub fn update(&mut self, dt: f64) {
        let Some(transition) = &mut self.transition else {
            return;
        };
        transition.elapsed += dt;
        let progress = (transition.elapsed / transition.duration).min(1.0);
        let ease = ease_out_cubic(progress);
        self.position = transition
            .start_position
            .lerp(transition.end_position, ease);
        self.target = transition.start_target.lerp(transition.end_target, ease);
        if progress >= 1.0 {
            self.transition = None;
        }
    }

    pub fn is_moving(&self) -> bool {
        self.transition.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn converges_exactly_after_duration() {
        let mut rig = CameraRig::new(DVec3::new(0.0, 0.0, 900.0), DVec3::ZERO);
        let end = DVec3::new(100.0, 50.0, 200.0);
        rig.focus_on(end, DVec3::new(10.0, 0.0, 0.0), 1.5);
        for _ in 0..100 {
            rig.update(0.016);
        }
        assert_eq!(rig.position, end);
        assert_eq!(rig.target, DVec3::new(10.0, 0.0, 0.0));
        assert!(!rig.is_moving());
    }

    #[test]
    fn retarget_captures_interpolated_pose() {
        let mut rig = CameraRig::new(DVec3::ZERO, DVec3::ZERO);
        rig.focus_on(DVec3::new(100.0, 0.0, 0.0), DVec3::ZERO, 1.0);
        rig.update(0.5);
        let mid = rig.position;
        assert!(mid.x > 0.0 && mid.x < 100.0);

        rig.focus_on(DVec3::new(0.0, 100.0, 0.0), DVec3::ZERO, 1.0);
        // pose is unchanged until the next update; no jump on retarget
        assert_eq!(rig.position, mid);
        rig.update(0.001);
        assert!(rig.position.distance(mid) < 1.0);
    }

    #[test]
    fn only_one_transition_at_a_time() {
        let mut rig = CameraRig::new(DVec3::ZERO, DVec3::ZERO);
        rig.focus_on(DVec3::X * 10.0, DVec3::ZERO, 1.0);
        rig.focus_on(DVec3::Y * 10.0, DVec3::ZERO, 1.0);
        for _ in 0..200 {
            rig.update(0.02);
        }
        // second transition superseded the first
        assert_eq!(rig.position, DVec3::Y * 10.0);
    }

    #[test]
    fn fit_to_frames_the_bounds() {
        let mut rig = CameraRig::new(DVec3::ZERO, DVec3::ZERO);
        let points = [
            DVec3::new(-100.0, 0.0, 0.0),
            DVec3::new(100.0, 0.0, 0.0),
            DVec3::new(0.0, 50.0, 0.0),
        ];
        rig.fit_to(&points, 0.0);
        assert_eq!(rig.target, DVec3::new(0.0, 25.0, 0.0));
        assert!(rig.position.distance(rig.target) >= 200.0);
    }

    #[test]
    fn fit_to_empty_resets() {
        let home = DVec3::new(0.0, 260.0, 900.0);
        let mut rig = CameraRig::new(home, DVec3::ZERO);
        rig.focus_on(DVec3::X, DVec3::X, 0.0);
        rig.fit_to(&[], 0.0);
        assert_eq!(rig.position, home);
    }

    #[test]
    fn ease_hits_one_at_one() {
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(0.0), 0.0);
    }
}
