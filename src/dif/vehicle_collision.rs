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
    error::DifError,
    interior::{ConvexHull, NullSurface, WindingIndex},
    io::{read_vec_with, Readable, Writable},
    types::PlaneF,
    version::Version,
};

use cgmath::Vector3;

/// Simplified collision geometry used for vehicles.
///
/// The block's own version number is kept in [`Version::vehicle_collision`]. Its index lists are
/// always stored at their natural widths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VehicleCollision {
    pub convex_hulls: Vec<ConvexHull>,
    pub convex_hull_emit_string_characters: Vec<u8>,
    pub hull_indices: Vec<u32>,
    pub hull_plane_indices: Vec<u16>,
    pub hull_emit_string_indices: Vec<u32>,
    pub hull_surface_indices: Vec<u32>,
    pub poly_list_plane_indices: Vec<u16>,
    pub poly_list_point_indices: Vec<u32>,
    pub poly_list_string_characters: Vec<u8>,
    pub null_surfaces: Vec<NullSurface>,
    pub points: Vec<Vector3<f32>>,
    pub planes: Vec<PlaneF>,
    pub windings: Vec<u32>,
    pub winding_indices: Vec<WindingIndex>,
}

impl Readable for VehicleCollision {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        version.vehicle_collision.version = u32::read(reader, version)?;

        Ok(VehicleCollision {
            convex_hulls: read_vec_with(reader, version, ConvexHull::read_base)?,
            convex_hull_emit_string_characters: Vec::read(reader, version)?,
            hull_indices: Vec::read(reader, version)?,
            hull_plane_indices: Vec::read(reader, version)?,
            hull_emit_string_indices: Vec::read(reader, version)?,
            hull_surface_indices: Vec::read(reader, version)?,
            poly_list_plane_indices: Vec::read(reader, version)?,
            poly_list_point_indices: Vec::read(reader, version)?,
            poly_list_string_characters: Vec::read(reader, version)?,
            null_surfaces: read_vec_with(reader, version, NullSurface::read_wide)?,
            points: Vec::read(reader, version)?,
            planes: Vec::read(reader, version)?,
            windings: Vec::read(reader, version)?,
            winding_indices: Vec::read(reader, version)?,
        })
    }
}

impl Writable for VehicleCollision {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        version.vehicle_collision.version.write(writer, version)?;

        (self.convex_hulls.len() as u32).write(writer, version)?;
        for hull in self.convex_hulls.iter() {
            hull.write_base(writer, version)?;
        }
        self.convex_hull_emit_string_characters
            .write(writer, version)?;
        self.hull_indices.write(writer, version)?;
        self.hull_plane_indices.write(writer, version)?;
        self.hull_emit_string_indices.write(writer, version)?;
        self.hull_surface_indices.write(writer, version)?;
        self.poly_list_plane_indices.write(writer, version)?;
        self.poly_list_point_indices.write(writer, version)?;
        self.poly_list_string_characters.write(writer, version)?;

        (self.null_surfaces.len() as u32).write(writer, version)?;
        for ns in self.null_surfaces.iter() {
            ns.write_wide(writer, version)?;
        }
        self.points.write(writer, version)?;
        self.planes.write(writer, version)?;
        self.windings.write(writer, version)?;
        self.winding_indices.write(writer, version)
    }
}
