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

//! Emit strings for convex hull points.
//!
//! The collision code walks a hull from one of its points and needs to know the local
//! neighborhood: which points, edges and faces surround it. Each hull point therefore carries an
//! emit string, a byte string laid out as
//!
//! ```text
//! point count, hull point index...
//! edge count, (low, high) emit point index pair...
//! polygon count, (point count, hull polygon index, emit point index...)...
//! ```
//!
//! Hull point indices are positions in the hull's own point list. Emit point indices are
//! positions in the string's own point list. Every count and index must fit in a byte.

use std::collections::BTreeSet;

use crate::dif::{error::DifError, io::narrow};

/// A hull polygon, as exported point and plane indices.
#[derive(Clone, Debug, PartialEq)]
pub struct HullPolygon {
    pub points: Vec<u32>,
    pub plane: u16,
}

fn byte(value: usize, field: &'static str) -> Result<u8, DifError> {
    narrow(value as u64, field)
}

/// Builds the emit string for exported point `point` of a hull.
///
/// `hull_points` is the hull's point list, in which a point may appear more than once; the first
/// occurrence is the one referred to. The polygons emitted are those touching `point`, followed
/// by every other polygon lying in one of their planes.
pub fn emit_string(
    hull_points: &[u32],
    polygons: &[HullPolygon],
    point: u32,
) -> Result<Vec<u8>, DifError> {
    let mut emit_polys: Vec<usize> = (0..polygons.len())
        .filter(|&j| polygons[j].points.contains(&point))
        .collect();
    let planes: BTreeSet<u16> = emit_polys.iter().map(|&j| polygons[j].plane).collect();
    for j in 0..polygons.len() {
        if !emit_polys.contains(&j) && planes.contains(&polygons[j].plane) {
            emit_polys.push(j);
        }
    }

    let emit_points: Vec<u32> = emit_polys
        .iter()
        .flat_map(|&j| polygons[j].points.iter().cloned())
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();

    // emit_points is sorted, so a binary search finds each point's emit index
    let local = |p: u32| emit_points.binary_search(&p).unwrap_or(0);

    let mut out = Vec::new();
    out.push(byte(emit_points.len(), "emit string point count")?);
    for p in emit_points.iter() {
        let hull_index = hull_points.iter().position(|h| h == p).unwrap_or(0);
        out.push(byte(hull_index, "emit string point")?);
    }

    let mut edges = BTreeSet::new();
    for &j in emit_polys.iter() {
        let points = &polygons[j].points;
        for k in 0..points.len() {
            let a = local(points[k]);
            let b = local(points[(k + 1) % points.len()]);
            edges.insert((a.min(b), a.max(b)));
        }
    }

    out.push(byte(edges.len(), "emit string edge count")?);
    for (a, b) in edges {
        out.push(byte(a, "emit string edge")?);
        out.push(byte(b, "emit string edge")?);
    }

    out.push(byte(emit_polys.len(), "emit string polygon count")?);
    for &j in emit_polys.iter() {
        let points = &polygons[j].points;
        out.push(byte(points.len(), "emit string polygon size")?);
        out.push(byte(j, "emit string polygon")?);
        for &p in points.iter() {
            out.push(byte(local(p), "emit string polygon point")?);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::dif::error::DifErrorKind;

    fn quad(second_plane: u16) -> (Vec<u32>, Vec<HullPolygon>) {
        let polygons = vec![
            HullPolygon {
                points: vec![10, 11, 12],
                plane: 0,
            },
            HullPolygon {
                points: vec![12, 11, 13],
                plane: second_plane,
            },
        ];
        let hull_points = polygons
            .iter()
            .flat_map(|p| p.points.iter().cloned())
            .collect();
        (hull_points, polygons)
    }

    #[test]
    fn test_coplanar_neighbors_included() {
        let (hull_points, polygons) = quad(0);
        let s = emit_string(&hull_points, &polygons, 10).unwrap();
        assert_eq!(
            s,
            vec![
                4, 0, 1, 2, 5, // points
                5, 0, 1, 0, 2, 1, 2, 1, 3, 2, 3, // edges
                2, 3, 0, 0, 1, 2, 3, 1, 2, 1, 3, // polygons
            ]
        );
    }

    #[test]
    fn test_other_planes_excluded() {
        let (hull_points, polygons) = quad(1);
        let s = emit_string(&hull_points, &polygons, 10).unwrap();
        assert_eq!(s, vec![3, 0, 1, 2, 3, 0, 1, 0, 2, 1, 2, 1, 3, 0, 0, 1, 2]);
    }

    #[test]
    fn test_shared_point_emits_both_polygons() {
        let (hull_points, polygons) = quad(1);
        let s = emit_string(&hull_points, &polygons, 11).unwrap();
        // both polygons touch point 11, so all four points are emitted
        assert_eq!(&s[..5], &[4, 0, 1, 2, 5]);
        assert_eq!(s[s.len() - 11], 2);
    }

    #[test]
    fn test_too_many_points_fail() {
        let polygons: Vec<HullPolygon> = (0..200)
            .map(|i| HullPolygon {
                points: vec![0, 3 * i + 1, 3 * i + 2],
                plane: 0,
            })
            .collect();
        let hull_points: Vec<u32> = polygons
            .iter()
            .flat_map(|p| p.points.iter().cloned())
            .collect();
        let err = emit_string(&hull_points, &polygons, 0).unwrap_err();
        match err.kind() {
            DifErrorKind::ValueTooWide { .. } => (),
            k => panic!("unexpected error {:?}", k),
        }
    }
}
