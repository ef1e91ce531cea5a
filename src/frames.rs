use itertools::{izip, Itertools};
use serde::Deserialize;

use crate::{
    error::{Result, StructuralError},
    util::cross,
};

//------------------------------------------------------------------------------
// Reference frames
//------------------------------------------------------------------------------

/// Named reference frames, chained airfoil → blade → azimuth → hub → yaw → wind.
/// The profile frame is the airfoil frame with x and y swapped and is only
/// used for section geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frame {
    Profile,
    Airfoil,
    Blade,
    Azimuth,
    Hub,
    Yaw,
    Wind,
}

/// Coordinate axis a frame transform rotates about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Indices (a, b) of the two components that rotate, ordered so that
    /// a' = c*a + s*b and b' = -s*a + c*b.
    fn plane(self) -> (usize, usize) {
        match self {
            Axis::X => (1, 2),
            Axis::Y => (2, 0),
            Axis::Z => (0, 1),
        }
    }
}

/// How to get from one frame to an adjacent one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Rotation about an axis by `sign * angle`
    Rotation { axis: Axis, sign: f64 },
    /// Exchange of the x and y components
    SwapXY,
}

/// Forward transforms; the reverse of each entry negates the angle.
const TRANSFORM_TABLE: [(Frame, Frame, Transform); 6] = [
    (Frame::Airfoil, Frame::Profile, Transform::SwapXY),
    (
        Frame::Airfoil,
        Frame::Blade,
        Transform::Rotation {
            axis: Axis::Z,
            sign: 1.,
        },
    ),
    (
        Frame::Blade,
        Frame::Azimuth,
        Transform::Rotation {
            axis: Axis::Y,
            sign: 1.,
        },
    ),
    (
        Frame::Azimuth,
        Frame::Hub,
        Transform::Rotation {
            axis: Axis::X,
            sign: -1.,
        },
    ),
    (
        Frame::Hub,
        Frame::Yaw,
        Transform::Rotation {
            axis: Axis::Y,
            sign: -1.,
        },
    ),
    (
        Frame::Yaw,
        Frame::Wind,
        Transform::Rotation {
            axis: Axis::Z,
            sign: -1.,
        },
    ),
];

impl Frame {
    /// Transform taking vectors from `self` to the adjacent frame `to`.
    pub fn transform_to(self, to: Frame) -> Result<Transform> {
        TRANSFORM_TABLE
            .iter()
            .find_map(|&(a, b, t)| match t {
                _ if a == self && b == to => Some(t),
                Transform::Rotation { axis, sign } if a == to && b == self => {
                    Some(Transform::Rotation { axis, sign: -sign })
                }
                Transform::SwapXY if a == to && b == self => Some(t),
                _ => None,
            })
            .ok_or(StructuralError::NoTransform { from: self, to })
    }
}

//------------------------------------------------------------------------------
// Direction vector
//------------------------------------------------------------------------------

/// Three component vector tagged with the frame its components are in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub frame: Frame,
}

impl DirectionVector {
    pub fn new(x: f64, y: f64, z: f64, frame: Frame) -> Self {
        Self { x, y, z, frame }
    }

    pub fn from_array(v: [f64; 3], frame: Frame) -> Self {
        Self::new(v[0], v[1], v[2], frame)
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Moves the vector to the adjacent frame `to`; `angle` is in degrees and
    /// ignored for the profile swap.
    pub fn to_frame(&self, to: Frame, angle: f64) -> Result<Self> {
        let v = self.as_array();
        let v = match self.frame.transform_to(to)? {
            Transform::SwapXY => [v[1], v[0], v[2]],
            Transform::Rotation { axis, sign } => {
                let (s, c) = (sign * angle).to_radians().sin_cos();
                let (a, b) = axis.plane();
                let mut w = v;
                w[a] = c * v[a] + s * v[b];
                w[b] = -s * v[a] + c * v[b];
                w
            }
        };
        Ok(Self::from_array(v, to))
    }

    /// Applies a sequence of adjacent-frame transforms.
    pub fn through(&self, path: &[(Frame, f64)]) -> Result<Self> {
        path.iter()
            .try_fold(*self, |v, &(frame, angle)| v.to_frame(frame, angle))
    }

    pub fn cross(&self, other: &Self) -> Result<Self> {
        self.check_frame(other)?;
        Ok(Self::from_array(
            cross(&self.as_array(), &other.as_array()),
            self.frame,
        ))
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_frame(other)?;
        Ok(Self::new(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.frame,
        ))
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::new(factor * self.x, factor * self.y, factor * self.z, self.frame)
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn check_frame(&self, other: &Self) -> Result<()> {
        if self.frame == other.frame {
            Ok(())
        } else {
            Err(StructuralError::FrameMismatch {
                expected: self.frame,
                found: other.frame,
            })
        }
    }
}

//------------------------------------------------------------------------------
// Distributed load
//------------------------------------------------------------------------------

/// Force per unit length at each station, all components in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributedLoad {
    pub frame: Frame,
    pub px: Vec<f64>,
    pub py: Vec<f64>,
    pub pz: Vec<f64>,
}

impl DistributedLoad {
    pub fn new(frame: Frame, px: Vec<f64>, py: Vec<f64>, pz: Vec<f64>) -> Self {
        Self { frame, px, py, pz }
    }

    pub fn zeros(frame: Frame, n: usize) -> Self {
        Self::new(frame, vec![0.; n], vec![0.; n], vec![0.; n])
    }

    pub fn len(&self) -> usize {
        self.px.len()
    }

    pub fn is_empty(&self) -> bool {
        self.px.is_empty()
    }

    pub fn vectors(&self) -> Vec<DirectionVector> {
        izip!(self.px.iter(), self.py.iter(), self.pz.iter())
            .map(|(&x, &y, &z)| DirectionVector::new(x, y, z, self.frame))
            .collect_vec()
    }

    pub fn from_vectors(frame: Frame, vectors: &[DirectionVector]) -> Result<Self> {
        let mut load = Self::zeros(frame, vectors.len());
        for (i, v) in vectors.iter().enumerate() {
            if v.frame != frame {
                return Err(StructuralError::FrameMismatch {
                    expected: frame,
                    found: v.frame,
                });
            }
            load.px[i] = v.x;
            load.py[i] = v.y;
            load.pz[i] = v.z;
        }
        Ok(load)
    }

    /// Moves every station to the adjacent frame `to` using the per-station
    /// angle in degrees.
    pub fn to_frame(&self, to: Frame, angles: &[f64]) -> Result<Self> {
        let own = self.vectors();
        let vectors = izip!(own.iter(), angles.iter())
            .map(|(v, &angle)| v.to_frame(to, angle))
            .collect::<Result<Vec<_>>>()?;
        Self::from_vectors(to, &vectors)
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        let (a, b) = (self.vectors(), other.vectors());
        let vectors = izip!(a.iter(), b.iter())
            .map(|(a, b)| a.add(b))
            .collect::<Result<Vec<_>>>()?;
        Self::from_vectors(self.frame, &vectors)
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ADJACENT: [(Frame, Frame); 6] = [
        (Frame::Airfoil, Frame::Profile),
        (Frame::Airfoil, Frame::Blade),
        (Frame::Blade, Frame::Azimuth),
        (Frame::Azimuth, Frame::Hub),
        (Frame::Hub, Frame::Yaw),
        (Frame::Yaw, Frame::Wind),
    ];

    /// Deterministic spread of angles over [0, 360)
    fn angles() -> Vec<f64> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        (0..50)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % 360_000) as f64 / 1000.
            })
            .collect_vec()
    }

    #[test]
    fn test_round_trip() {
        let v = DirectionVector::new(1.3, -2.7, 0.4, Frame::Airfoil);
        for &(a, b) in ADJACENT.iter() {
            for angle in angles() {
                let start = DirectionVector { frame: a, ..v };
                let back = start.to_frame(b, angle).unwrap().to_frame(a, angle).unwrap();
                assert_eq!(back.frame, a);
                let scale = start.magnitude();
                assert!((back.x - start.x).abs() <= 1e-10 * scale);
                assert!((back.y - start.y).abs() <= 1e-10 * scale);
                assert!((back.z - start.z).abs() <= 1e-10 * scale);
            }
        }
    }

    #[test]
    fn test_rotation_preserves_magnitude() {
        let v = DirectionVector::new(3., 4., 12., Frame::Blade);
        let w = v
            .through(&[(Frame::Azimuth, 17.), (Frame::Hub, 250.), (Frame::Yaw, 5.)])
            .unwrap();
        assert_eq!(w.frame, Frame::Yaw);
        assert_relative_eq!(w.magnitude(), 13., epsilon = 1e-12);
    }

    #[test]
    fn test_airfoil_to_blade() {
        let v = DirectionVector::new(1., 0., 0., Frame::Airfoil);
        let w = v.to_frame(Frame::Blade, 90.).unwrap();
        assert_relative_eq!(w.x, 0., epsilon = 1e-15);
        assert_relative_eq!(w.y, -1., epsilon = 1e-15);
        assert_relative_eq!(w.z, 0., epsilon = 1e-15);
    }

    #[test]
    fn test_gravity_chain_at_zero_angles() {
        // With every angle zero the yaw z-axis lines up with the blade z-axis
        let g = DirectionVector::new(0., 0., -9.81, Frame::Yaw);
        let b = g
            .through(&[(Frame::Hub, 0.), (Frame::Azimuth, 0.), (Frame::Blade, 0.)])
            .unwrap();
        assert_eq!(b.as_array(), [0., 0., -9.81]);
    }

    #[test]
    fn test_profile_swap() {
        let v = DirectionVector::new(1., 2., 3., Frame::Airfoil);
        assert_eq!(v.to_frame(Frame::Profile, 0.).unwrap().as_array(), [2., 1., 3.]);
    }

    #[test]
    fn test_non_adjacent_frames() {
        let v = DirectionVector::new(1., 2., 3., Frame::Airfoil);
        assert_eq!(
            v.to_frame(Frame::Hub, 10.).unwrap_err(),
            StructuralError::NoTransform {
                from: Frame::Airfoil,
                to: Frame::Hub
            }
        );
    }

    #[test]
    fn test_frame_mismatch() {
        let a = DirectionVector::new(1., 0., 0., Frame::Blade);
        let b = DirectionVector::new(0., 1., 0., Frame::Azimuth);
        assert!(a.cross(&b).is_err());
        assert!(a.add(&b).is_err());
        let c = a.cross(&DirectionVector { frame: Frame::Blade, ..b }).unwrap();
        assert_eq!(c.as_array(), [0., 0., 1.]);
    }
}
