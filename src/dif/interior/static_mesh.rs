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

use std::io::{Read, Seek, Write};

use crate::dif::{
    error::{DifError, DifErrorKind},
    io::{Readable, Writable},
    types::{BoxF, PlaneF},
    version::Version,
};

use cgmath::{Matrix4, SquareMatrix, Vector2, Vector3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Primitive {
    pub alpha: u8,
    pub tex_s: u32,
    pub tex_t: u32,
    pub diffuse_index: i32,
    pub light_map_index: i32,
    pub start: u32,
    pub count: u32,
    pub light_map_equation_x: PlaneF,
    pub light_map_equation_y: PlaneF,
    pub light_map_offset: Vector2<i32>,
    pub light_map_size: Vector2<i32>,
}

impl Readable for Primitive {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(Primitive {
            alpha: u8::read(reader, version)?,
            tex_s: u32::read(reader, version)?,
            tex_t: u32::read(reader, version)?,
            diffuse_index: i32::read(reader, version)?,
            light_map_index: i32::read(reader, version)?,
            start: u32::read(reader, version)?,
            count: u32::read(reader, version)?,
            light_map_equation_x: PlaneF::read(reader, version)?,
            light_map_equation_y: PlaneF::read(reader, version)?,
            light_map_offset: Vector2::read(reader, version)?,
            light_map_size: Vector2::read(reader, version)?,
        })
    }
}

impl Writable for Primitive {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.alpha.write(writer, version)?;
        self.tex_s.write(writer, version)?;
        self.tex_t.write(writer, version)?;
        self.diffuse_index.write(writer, version)?;
        self.light_map_index.write(writer, version)?;
        self.start.write(writer, version)?;
        self.count.write(writer, version)?;
        self.light_map_equation_x.write(writer, version)?;
        self.light_map_equation_y.write(writer, version)?;
        self.light_map_offset.write(writer, version)?;
        self.light_map_size.write(writer, version)
    }
}

/// A mesh embedded in newer interiors.
///
/// Meshes that carry their own material list cannot be decoded and fail the read.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticMesh {
    pub primitives: Vec<Primitive>,
    pub indices: Vec<u16>,
    pub vertices: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub diffuse_uvs: Vec<Vector2<f32>>,
    pub lightmap_uvs: Vec<Vector2<f32>>,
    pub has_solid: u8,
    pub has_translucency: u8,
    pub bounds: BoxF,
    pub transform: Matrix4<f32>,
    pub scale: Vector3<f32>,
}

impl Default for StaticMesh {
    fn default() -> Self {
        StaticMesh {
            primitives: Vec::new(),
            indices: Vec::new(),
            vertices: Vec::new(),
            normals: Vec::new(),
            diffuse_uvs: Vec::new(),
            lightmap_uvs: Vec::new(),
            has_solid: 0,
            has_translucency: 0,
            bounds: BoxF::default(),
            transform: Matrix4::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Readable for StaticMesh {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let primitives = Vec::read(reader, version)?;
        let indices = Vec::read(reader, version)?;
        let vertices = Vec::read(reader, version)?;
        let normals = Vec::read(reader, version)?;
        let diffuse_uvs = Vec::read(reader, version)?;
        let lightmap_uvs = Vec::read(reader, version)?;

        if u8::read(reader, version)? != 0 {
            return Err(DifErrorKind::StaticMeshMaterialListUnsupported.into());
        }

        Ok(StaticMesh {
            primitives,
            indices,
            vertices,
            normals,
            diffuse_uvs,
            lightmap_uvs,
            has_solid: u8::read(reader, version)?,
            has_translucency: u8::read(reader, version)?,
            bounds: BoxF::read(reader, version)?,
            transform: Matrix4::read(reader, version)?,
            scale: Vector3::read(reader, version)?,
        })
    }
}

impl Writable for StaticMesh {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.primitives.write(writer, version)?;
        self.indices.write(writer, version)?;
        self.vertices.write(writer, version)?;
        self.normals.write(writer, version)?;
        self.diffuse_uvs.write(writer, version)?;
        self.lightmap_uvs.write(writer, version)?;
        0u8.write(writer, version)?;
        self.has_solid.write(writer, version)?;
        self.has_translucency.write(writer, version)?;
        self.bounds.write(writer, version)?;
        self.transform.write(writer, version)?;
        self.scale.write(writer, version)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    #[test]
    fn test_material_list_rejected() {
        let mut out = Vec::new();
        StaticMesh::default()
            .write(&mut out, &Version::default())
            .unwrap();
        // six empty lists, then the material list flag
        assert_eq!(out[24], 0);
        out[24] = 1;

        let mut version = Version::default();
        let err = StaticMesh::read(&mut Cursor::new(out), &mut version).unwrap_err();
        assert_eq!(err.kind(), DifErrorKind::StaticMeshMaterialListUnsupported);
    }

    #[test]
    fn test_round_trip() {
        let mesh = StaticMesh {
            indices: vec![0, 1, 2],
            vertices: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ],
            has_solid: 1,
            ..Default::default()
        };
        let mut out = Vec::new();
        mesh.write(&mut out, &Version::default()).unwrap();
        let mut version = Version::default();
        let back = StaticMesh::read(&mut Cursor::new(out), &mut version).unwrap();
        assert_eq!(back, mesh);
    }
}
