use std::f32::consts::TAU;

/// 2D observation in pixel coordinates, origin at the upper-left pixel center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Whether an observation was made in a distorted or undistorted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistortionState {
    #[default]
    Unknown,
    Distorted,
    Undistorted,
    Invalid,
}

impl DistortionState {
    pub fn from_undistorted_flag(frame_is_undistorted: bool) -> Self {
        if frame_is_undistorted {
            DistortionState::Undistorted
        } else {
            DistortionState::Distorted
        }
    }
}

/// Detected point with a scalar strength.
///
/// The observation is fixed at construction; only the strength can be refined.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointFeature {
    observation: Point2,
    distortion_state: DistortionState,
    strength: f32,
}

impl PointFeature {
    pub fn new(observation: Point2, distortion_state: DistortionState, strength: f32) -> Self {
        Self {
            observation,
            distortion_state,
            strength,
        }
    }

    pub fn observation(&self) -> Point2 {
        self.observation
    }

    pub fn distortion_state(&self) -> DistortionState {
        self.distortion_state
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength;
    }
}

/// Point feature with an orientation in radians, range [0, 2π).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrientedPointFeature {
    point: PointFeature,
    orientation: f32,
}

impl OrientedPointFeature {
    pub fn new(point: PointFeature, orientation: f32) -> Self {
        debug_assert!((0.0..TAU).contains(&orientation), "orientation {orientation} out of range");
        Self { point, orientation }
    }

    pub fn point(&self) -> &PointFeature {
        &self.point
    }

    pub fn point_mut(&mut self) -> &mut PointFeature {
        &mut self.point
    }

    pub fn observation(&self) -> Point2 {
        self.point.observation
    }

    pub fn strength(&self) -> f32 {
        self.point.strength
    }

    pub fn orientation(&self) -> f32 {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: f32) {
        debug_assert!((0.0..TAU).contains(&orientation), "orientation {orientation} out of range");
        self.orientation = orientation;
    }
}

impl From<PointFeature> for OrientedPointFeature {
    fn from(point: PointFeature) -> Self {
        Self::new(point, 0.0)
    }
}

/// Wraps any angle into [0, 2π).
pub fn normalize_angle(angle: f32) -> f32 {
    let mut wrapped = angle % TAU;
    if wrapped < 0.0 {
        wrapped += TAU;
    }
    // f32 rounding can land exactly on TAU after the addition
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Matched feature pair: index into the forward set and index into the backward set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Correspondence {
    pub forward: usize,
    pub backward: usize,
}

impl Correspondence {
    pub const fn new(forward: usize, backward: usize) -> Self {
        Self { forward, backward }
    }
}
