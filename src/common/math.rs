// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software
// and associated documentation files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::ops::Neg;

use cgmath::{InnerSpace, Vector3, Zero};

/// Distance from a plane within which a point counts as lying on it.
pub const PLANE_EPSILON: f32 = 0.0001;

/// The side of a hyperplane a single point falls on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PointSide {
    Front,
    Back,
    On,
}

impl Neg for PointSide {
    type Output = PointSide;

    fn neg(self) -> Self::Output {
        match self {
            PointSide::Front => PointSide::Back,
            PointSide::Back => PointSide::Front,
            PointSide::On => PointSide::On,
        }
    }
}

impl PointSide {
    pub fn from_dist(dist: f32) -> PointSide {
        if dist > PLANE_EPSILON {
            PointSide::Front
        } else if dist < -PLANE_EPSILON {
            PointSide::Back
        } else {
            PointSide::On
        }
    }
}

/// The relation of a whole polygon to a hyperplane.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PolygonSide {
    Front,
    Back,
    OnPlane,
    Spanning,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Alignment {
    Axis(Axis),
    Normal(Vector3<f32>),
}

/// A plane in point-normal form, with signed distance `dot(normal, p) - dist`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hyperplane {
    alignment: Alignment,
    dist: f32,
}

impl Neg for Hyperplane {
    type Output = Self;

    fn neg(self) -> Self::Output {
        let normal = match self.alignment {
            Alignment::Axis(a) => {
                let mut n = Vector3::zero();
                n[a as usize] = -1.0;
                n
            }
            Alignment::Normal(n) => -n,
        };

        Hyperplane::from_normal(normal, -self.dist)
    }
}

impl Hyperplane {
    /// Creates a new hyperplane aligned along the given normal, `dist` units away from the origin.
    ///
    /// Positive unit axis normals are stored as an axis so that point comparisons only read one
    /// component.
    pub fn new(normal: Vector3<f32>, dist: f32) -> Hyperplane {
        match normal {
            n if n == Vector3::unit_x() => Self::axis(Axis::X, dist),
            n if n == Vector3::unit_y() => Self::axis(Axis::Y, dist),
            n if n == Vector3::unit_z() => Self::axis(Axis::Z, dist),
            _ => Self::from_normal(normal.normalize(), dist),
        }
    }

    pub fn axis(axis: Axis, dist: f32) -> Hyperplane {
        Hyperplane {
            alignment: Alignment::Axis(axis),
            dist,
        }
    }

    /// Creates a hyperplane with the given normal, stored as-is.
    ///
    /// The normal is expected to be of unit length already.
    pub fn from_normal(normal: Vector3<f32>, dist: f32) -> Hyperplane {
        Hyperplane {
            alignment: Alignment::Normal(normal),
            dist,
        }
    }

    /// Creates the hyperplane with unit normal `normal` that contains `point`.
    pub fn through_point(normal: Vector3<f32>, point: Vector3<f32>) -> Hyperplane {
        Hyperplane::from_normal(normal, point.dot(normal))
    }

    /// Returns the surface normal of this plane.
    pub fn normal(&self) -> Vector3<f32> {
        match self.alignment {
            Alignment::Axis(ax) => match ax {
                Axis::X => Vector3::unit_x(),
                Axis::Y => Vector3::unit_y(),
                Axis::Z => Vector3::unit_z(),
            },
            Alignment::Normal(normal) => normal,
        }
    }

    pub fn dist(&self) -> f32 {
        self.dist
    }

    /// Calculates the signed distance between this hyperplane and the given point.
    pub fn point_dist(&self, point: Vector3<f32>) -> f32 {
        match self.alignment {
            Alignment::Axis(a) => point[a as usize] - self.dist,
            Alignment::Normal(n) => point.dot(n) - self.dist,
        }
    }

    /// Calculates which side of this hyperplane the given point belongs to.
    pub fn point_side(&self, point: Vector3<f32>) -> PointSide {
        PointSide::from_dist(self.point_dist(point))
    }

    /// Classifies a polygon by its vertices.
    ///
    /// Vertices within `PLANE_EPSILON` of the plane count as lying on it. A polygon is `Front`,
    /// `Back` or `OnPlane` only when all of its vertices agree, and `Spanning` otherwise.
    pub fn classify<'a, I>(&self, points: I) -> PolygonSide
    where
        I: IntoIterator<Item = &'a Vector3<f32>>,
    {
        let mut sides = points.into_iter().map(|p| self.point_side(*p));
        let first = match sides.next() {
            Some(s) => s,
            None => return PolygonSide::OnPlane,
        };

        if sides.any(|s| s != first) {
            return PolygonSide::Spanning;
        }

        match first {
            PointSide::Front => PolygonSide::Front,
            PointSide::Back => PolygonSide::Back,
            PointSide::On => PolygonSide::OnPlane,
        }
    }
}

/// Converts a Y-up position or direction into the Z-up space interiors use.
pub fn y_up_to_z_up(v: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, -v.z, v.y)
}

/// Inverse of `y_up_to_z_up`.
pub fn z_up_to_y_up(v: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, v.z, -v.y)
}
