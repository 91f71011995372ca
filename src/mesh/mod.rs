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

//! Conversion between interiors and plain triangle meshes.

pub mod obj;

use crate::dif::{
    error::{DifError, DifErrorKind},
    interior::Interior,
    io::check_index,
};

use cgmath::{InnerSpace, Vector2, Vector3};

/// Below this, a UV parallelogram is treated as having no area.
const DEGENERATE_UV_AREA: f32 = 1e-8;

/// A drawable triangle recovered from an interior surface.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshTriangle {
    pub positions: [Vector3<f32>; 3],
    pub uvs: [Vector2<f32>; 3],
    pub normal: Vector3<f32>,
    /// Unit vector along increasing U, perpendicular to `normal`.
    pub tangent: Vector3<f32>,
    pub material: String,
}

/// Any unit vector perpendicular to `normal`.
fn perpendicular(normal: Vector3<f32>) -> Vector3<f32> {
    let axis = if normal.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let t = axis - normal * normal.dot(axis);
    if t.magnitude2() == 0.0 {
        axis
    } else {
        t.normalize()
    }
}

/// The direction of increasing U across a triangle, orthogonalized against `normal`.
pub fn tangent(
    positions: &[Vector3<f32>; 3],
    uvs: &[Vector2<f32>; 3],
    normal: Vector3<f32>,
) -> Vector3<f32> {
    let e1 = positions[1] - positions[0];
    let e2 = positions[2] - positions[0];
    let d1 = uvs[1] - uvs[0];
    let d2 = uvs[2] - uvs[0];

    let det = d1.x * d2.y - d1.y * d2.x;
    if det.abs() < DEGENERATE_UV_AREA {
        return perpendicular(normal);
    }

    let t = (e1 * d2.y - e2 * d1.y) / det;
    let t = t - normal * normal.dot(t);
    if t.magnitude2() < DEGENERATE_UV_AREA {
        perpendicular(normal)
    } else {
        t.normalize()
    }
}

/// Reconstructs the triangles of every surface of `interior`.
///
/// Windings are triangle strips: starting from the third index, each index closes a triangle
/// with the two before it, and every other triangle is reversed to keep the facing consistent.
pub fn interior_triangles(interior: &Interior) -> Result<Vec<MeshTriangle>, DifError> {
    let mut out = Vec::new();

    for surface in interior.surfaces.iter() {
        let end = surface.winding_start as u64 + surface.winding_count as u64;
        if end > interior.indices.len() as u64 {
            return Err(DifErrorKind::WindingOutOfRange {
                start: surface.winding_start,
                count: surface.winding_count,
                len: interior.indices.len(),
            }
            .into());
        }

        check_index(surface.plane_index, interior.planes.len(), "surface plane")?;
        let plane = &interior.planes[surface.plane_index as usize];
        check_index(plane.normal_index, interior.normals.len(), "plane normal")?;
        check_index(surface.tex_gen_index, interior.tex_gen_eqs.len(), "surface texgen")?;
        check_index(
            surface.texture_index,
            interior.material_names.len(),
            "surface material",
        )?;

        let mut normal = interior.normals[plane.normal_index as usize];
        if surface.plane_flipped {
            normal = -normal;
        }
        let eq = &interior.tex_gen_eqs[surface.tex_gen_index as usize];
        let material = &interior.material_names[surface.texture_index as usize];

        let winding = surface.winding();
        for j in winding.start + 2..winding.end {
            let corners = if (j - winding.start) % 2 == 0 {
                [j - 2, j - 1, j]
            } else {
                [j, j - 1, j - 2]
            };

            let mut positions = [Vector3::new(0.0, 0.0, 0.0); 3];
            let mut uvs = [Vector2::new(0.0, 0.0); 3];
            for (k, &c) in corners.iter().enumerate() {
                let index = interior.indices[c];
                check_index(index, interior.points.len(), "winding point")?;
                positions[k] = interior.points[index as usize];
                let (u, v) = eq.uv(positions[k]);
                uvs[k] = Vector2::new(u, v);
            }

            out.push(MeshTriangle {
                positions,
                uvs,
                normal,
                tangent: tangent(&positions, &uvs, normal),
                material: material.clone(),
            });
        }
    }

    debug!(
        "recovered {} triangles from {} surfaces",
        out.len(),
        interior.surfaces.len()
    );
    Ok(out)
}
