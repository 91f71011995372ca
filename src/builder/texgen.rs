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

//! Texture generation equations from per-vertex texture coordinates.
//!
//! An interior surface carries no texture coordinates of its own. Instead each surface refers to
//! a pair of planes whose distance from a point gives that point's U and V. Given a triangle and
//! its UVs, finding those planes means solving two 3×3 linear systems, one per axis:
//!
//! ```text
//! [ x0 y0 z0 ]   ( a )   ( u0 )
//! [ x1 y1 z1 ] × ( b ) = ( u1 )
//! [ x2 y2 z2 ]   ( c )   ( u2 )
//! ```
//!
//! The planes pass through the origin, so the plane offsets are always zero.

use crate::dif::{interior::TexGenEq, types::PlaneF};

use cgmath::{Vector2, Vector3};

/// Matrix entries closer than this to zero are treated as zero.
const ZERO_EPSILON: f32 = 0.0001;

/// Pivots closer than this to zero are left unscaled.
const PIVOT_EPSILON: f32 = 0.00001;

type Row = [f32; 4];

fn near_zero(x: f32, epsilon: f32) -> bool {
    x.abs() < epsilon
}

fn add_row(m: &mut [Row; 3], dest: usize, src: usize, factor: f32) {
    for c in 0..4 {
        m[dest][c] += m[src][c] * factor;
    }
}

fn scale_row(m: &mut [Row; 3], row: usize, factor: f32) {
    for c in m[row].iter_mut() {
        *c *= factor;
    }
}

/// Solves the augmented system `m` by Gaussian elimination.
///
/// Singular systems do not fail: eliminations and scalings with a zero pivot are skipped and the
/// back substitution runs on whatever is left, which yields a zero for any unconstrained unknown.
pub fn solve(mut m: [Row; 3]) -> Vector3<f32> {
    for row in m.iter_mut() {
        for c in row.iter_mut() {
            if near_zero(*c, ZERO_EPSILON) {
                *c = 0.0;
            }
        }
    }

    if near_zero(m[0][0], ZERO_EPSILON) {
        if near_zero(m[1][0], ZERO_EPSILON) {
            m.swap(0, 2);
        } else {
            m.swap(0, 1);
        }
    }

    if !near_zero(m[0][0], ZERO_EPSILON) {
        if !near_zero(m[1][0], ZERO_EPSILON) {
            let f = -m[1][0] / m[0][0];
            add_row(&mut m, 1, 0, f);
        }
        if !near_zero(m[2][0], ZERO_EPSILON) {
            let f = -m[2][0] / m[0][0];
            add_row(&mut m, 2, 0, f);
        }
    }

    if near_zero(m[1][1], ZERO_EPSILON) {
        m.swap(1, 2);
    }

    if !near_zero(m[1][1], ZERO_EPSILON) && !near_zero(m[2][1], ZERO_EPSILON) {
        let f = -m[2][1] / m[1][1];
        add_row(&mut m, 2, 1, f);
    }

    for i in 0..3 {
        if !near_zero(m[i][i], PIVOT_EPSILON) {
            let f = 1.0 / m[i][i];
            scale_row(&mut m, i, f);
        }
    }

    let z = m[2][3];
    let y = m[1][3] - z * m[1][2];
    let x = m[0][3] - y * m[0][1] - z * m[0][2];
    Vector3::new(x, y, z)
}

/// Finds the texture generation equation mapping each of `points` to the matching entry of `uvs`.
pub fn tex_gen_from_points(points: &[Vector3<f32>; 3], uvs: &[Vector2<f32>; 3]) -> TexGenEq {
    let rows = |axis: usize| -> [Row; 3] {
        let mut m = [[0.0; 4]; 3];
        for i in 0..3 {
            m[i] = [points[i].x, points[i].y, points[i].z, uvs[i][axis]];
        }
        m
    };

    let x = solve(rows(0));
    let y = solve(rows(1));

    let eq = TexGenEq {
        plane_x: PlaneF { normal: x, d: 0.0 },
        plane_y: PlaneF { normal: y, d: 0.0 },
    };

    for (p, uv) in points.iter().zip(uvs.iter()) {
        let (u, v) = eq.uv(*p);
        if (u - uv.x).abs() > 0.001 || (v - uv.y).abs() > 0.001 {
            trace!(
                "texgen misses {:?}: wanted ({}, {}), got ({}, {})",
                p,
                uv.x,
                uv.y,
                u,
                v
            );
        }
    }

    eq
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_reproduces(points: &[Vector3<f32>; 3], uvs: &[Vector2<f32>; 3]) {
        let eq = tex_gen_from_points(points, uvs);
        assert_eq!(eq.plane_x.d, 0.0);
        assert_eq!(eq.plane_y.d, 0.0);
        for (p, uv) in points.iter().zip(uvs.iter()) {
            let (u, v) = eq.uv(*p);
            assert!((u - uv.x).abs() < 0.001, "u {} != {}", u, uv.x);
            assert!((v - uv.y).abs() < 0.001, "v {} != {}", v, uv.y);
        }
    }

    #[test]
    fn test_axis_triangle_needs_both_swaps() {
        let points = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let uvs = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
        ];
        let eq = tex_gen_from_points(&points, &uvs);
        assert_eq!(eq.plane_x.normal, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(eq.plane_y.normal, Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_general_triangle() {
        let points = [
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 1.0, 0.0),
            Vector3::new(2.0, 5.0, 1.0),
        ];
        let planar = |p: Vector3<f32>| {
            Vector2::new(
                0.5 * p.x - 0.25 * p.y + 0.125 * p.z,
                -0.75 * p.x + 0.5 * p.z,
            )
        };
        let uvs = [planar(points[0]), planar(points[1]), planar(points[2])];
        assert_reproduces(&points, &uvs);
    }

    #[test]
    fn test_zero_first_column_swaps_rows() {
        let points = [
            Vector3::new(0.0, 2.0, 1.0),
            Vector3::new(0.0, 1.0, 3.0),
            Vector3::new(2.0, 1.0, 1.0),
        ];
        let uvs = [
            Vector2::new(3.0, -1.0),
            Vector2::new(4.0, 2.0),
            Vector2::new(1.5, 0.5),
        ];
        assert_reproduces(&points, &uvs);
    }

    #[test]
    fn test_collinear_points_do_not_produce_nan() {
        let points = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(2.0, 2.0, 2.0),
        ];
        let uvs = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(2.0, 2.0),
        ];
        let eq = tex_gen_from_points(&points, &uvs);
        for c in 0..3 {
            assert!(eq.plane_x.normal[c].is_finite());
            assert!(eq.plane_y.normal[c].is_finite());
        }
    }

    #[test]
    fn test_tiny_entries_are_zeroed() {
        let m = [
            [1.0, 0.00001, 0.0, 2.0],
            [0.0, 1.0, 0.0, 3.0],
            [0.0, 0.0, 1.0, 4.0],
        ];
        assert_eq!(solve(m), Vector3::new(2.0, 3.0, 4.0));
    }
}
