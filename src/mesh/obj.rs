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

//! Wavefront OBJ import into a [`DifBuilder`] and export of [`MeshTriangle`]s.
//!
//! OBJ files are Y-up with counter-clockwise front faces; interiors are Z-up with clockwise front
//! faces. Import and export convert in opposite directions, so a mesh survives a round trip.

use std::{fs, io::Write, path::Path};

use crate::{
    builder::{DifBuilder, Triangle, Vertex},
    common::{
        math::{y_up_to_z_up, z_up_to_y_up},
        parse::obj::{Obj, ObjVertex},
    },
    mesh::MeshTriangle,
};

use cgmath::{Vector2, Vector3, Zero};
use failure::Error;

fn vertex(obj: &Obj, v: &ObjVertex) -> Result<Vertex, Error> {
    let position = obj
        .positions
        .get(v.position)
        .ok_or_else(|| format_err!("position {} out of range", v.position))?;

    let normal = match v.normal {
        Some(i) => {
            let n = obj
                .normals
                .get(i)
                .ok_or_else(|| format_err!("normal {} out of range", i))?;
            y_up_to_z_up(*n)
        }
        None => Vector3::zero(),
    };

    let uv = match v.tex_coord {
        Some(i) => {
            let t = obj
                .tex_coords
                .get(i)
                .ok_or_else(|| format_err!("texture coordinate {} out of range", i))?;
            Vector2::new(t.x, -t.y)
        }
        None => Vector2::zero(),
    };

    Ok(Vertex::new(y_up_to_z_up(*position), normal, uv))
}

/// Adds every face of `obj` to `builder`, fan-triangulated.
///
/// Returns the number of triangles added.
pub fn add_obj(builder: &mut DifBuilder, obj: &Obj) -> Result<usize, Error> {
    let triangles = obj.triangles();
    for (corners, material) in triangles.iter() {
        let a = vertex(obj, &corners[0])?;
        let b = vertex(obj, &corners[1])?;
        let c = vertex(obj, &corners[2])?;
        builder.add_triangle(Triangle::new(c, b, a), material);
    }
    Ok(triangles.len())
}

/// Reads the OBJ file at `path` into a new builder.
pub fn load_obj<P>(path: P) -> Result<DifBuilder, Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let src = fs::read_to_string(path)
        .map_err(|e| format_err!("couldn't read {}: {}", path.display(), e))?;
    let obj = Obj::parse(&src)?;

    let mut builder = DifBuilder::new();
    let count = add_obj(&mut builder, &obj)?;
    debug!(
        "loaded {} triangles in {} materials from {}",
        count,
        builder.materials().len(),
        path.display()
    );
    Ok(builder)
}

/// Writes `triangles` as an OBJ model with one group per material.
///
/// Vertices are not shared: each triangle gets its own three positions, texture coordinates and
/// a single normal.
pub fn write_obj<W>(writer: &mut W, triangles: &[MeshTriangle]) -> Result<(), Error>
where
    W: Write,
{
    let mut materials: Vec<&str> = Vec::new();
    for t in triangles.iter() {
        if !materials.contains(&t.material.as_str()) {
            materials.push(&t.material);
        }
    }

    let mut written = 0;
    for material in materials {
        writeln!(writer, "g {}", material)?;
        writeln!(writer, "usemtl {}", material)?;

        for t in triangles.iter().filter(|t| t.material == material) {
            for (p, uv) in t.positions.iter().zip(t.uvs.iter()) {
                let p = z_up_to_y_up(*p);
                writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
                writeln!(writer, "vt {} {}", uv.x, -uv.y)?;
            }
            let n = z_up_to_y_up(t.normal);
            writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;

            let v = 3 * written + 1;
            let vn = written + 1;
            writeln!(
                writer,
                "f {}/{}/{} {}/{}/{} {}/{}/{}",
                v + 2,
                v + 2,
                vn,
                v + 1,
                v + 1,
                vn,
                v,
                v,
                vn
            )?;
            written += 1;
        }
    }

    Ok(())
}
