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
    io::{Readable, Writable},
    types::BoxF,
    version::Version,
};

use cgmath::Vector3;

/// Interior version from which hulls carry a static mesh flag.
pub const HULL_STATIC_MESH_VERSION: u32 = 12;

/// Side length of the coordinate bin grid.
pub const COORD_BIN_DIM: usize = 16;

/// Total number of coordinate bins, stored without a count prefix.
pub const COORD_BIN_COUNT: usize = COORD_BIN_DIM * COORD_BIN_DIM;

/// A convex collision volume described by ranges into the interior's hull index lists.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ConvexHull {
    pub hull_start: u32,
    pub hull_count: u16,
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub surface_start: u32,
    pub surface_count: u16,
    pub plane_start: u32,
    pub poly_list_plane_start: u32,
    pub poly_list_point_start: u32,
    pub poly_list_string_start: u32,
    pub static_mesh: u8,
}

impl ConvexHull {
    pub fn bounds(&self) -> BoxF {
        BoxF {
            min: Vector3::new(self.min_x, self.min_y, self.min_z),
            max: Vector3::new(self.max_x, self.max_y, self.max_z),
        }
    }

    pub fn set_bounds(&mut self, b: &BoxF) {
        self.min_x = b.min.x;
        self.min_y = b.min.y;
        self.min_z = b.min.z;
        self.max_x = b.max.x;
        self.max_y = b.max.y;
        self.max_z = b.max.z;
    }

    /// Reads the fields common to interior and vehicle collision hulls.
    pub(crate) fn read_base<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(ConvexHull {
            hull_start: u32::read(reader, version)?,
            hull_count: u16::read(reader, version)?,
            min_x: f32::read(reader, version)?,
            max_x: f32::read(reader, version)?,
            min_y: f32::read(reader, version)?,
            max_y: f32::read(reader, version)?,
            min_z: f32::read(reader, version)?,
            max_z: f32::read(reader, version)?,
            surface_start: u32::read(reader, version)?,
            surface_count: u16::read(reader, version)?,
            plane_start: u32::read(reader, version)?,
            poly_list_plane_start: u32::read(reader, version)?,
            poly_list_point_start: u32::read(reader, version)?,
            poly_list_string_start: u32::read(reader, version)?,
            static_mesh: 0,
        })
    }

    pub(crate) fn write_base<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.hull_start.write(writer, version)?;
        self.hull_count.write(writer, version)?;
        self.min_x.write(writer, version)?;
        self.max_x.write(writer, version)?;
        self.min_y.write(writer, version)?;
        self.max_y.write(writer, version)?;
        self.min_z.write(writer, version)?;
        self.max_z.write(writer, version)?;
        self.surface_start.write(writer, version)?;
        self.surface_count.write(writer, version)?;
        self.plane_start.write(writer, version)?;
        self.poly_list_plane_start.write(writer, version)?;
        self.poly_list_point_start.write(writer, version)?;
        self.poly_list_string_start.write(writer, version)
    }
}

impl Readable for ConvexHull {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let mut hull = ConvexHull::read_base(reader, version)?;
        if version.interior.version >= HULL_STATIC_MESH_VERSION {
            hull.static_mesh = u8::read(reader, version)?;
        }
        Ok(hull)
    }
}

impl Writable for ConvexHull {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.write_base(writer, version)?;
        if version.interior.version >= HULL_STATIC_MESH_VERSION {
            self.static_mesh.write(writer, version)?;
        }
        Ok(())
    }
}

/// A range of the coordinate bin index list.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CoordBin {
    pub bin_start: u32,
    pub bin_count: u32,
}

impl Readable for CoordBin {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(CoordBin {
            bin_start: u32::read(reader, version)?,
            bin_count: u32::read(reader, version)?,
        })
    }
}

impl Writable for CoordBin {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.bin_start.write(writer, version)?;
        self.bin_count.write(writer, version)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use crate::dif::version::InteriorType;

    #[test]
    fn test_static_mesh_byte() {
        let hull = ConvexHull {
            hull_count: 4,
            static_mesh: 1,
            ..Default::default()
        };

        let mut old = Vec::new();
        hull.write(&mut old, &Version::with_interior(0, InteriorType::Tge))
            .unwrap();
        let mut new = Vec::new();
        hull.write(&mut new, &Version::with_interior(12, InteriorType::Tgea))
            .unwrap();
        assert_eq!(new.len(), old.len() + 1);

        let mut version = Version::with_interior(12, InteriorType::Tgea);
        let back = ConvexHull::read(&mut Cursor::new(new), &mut version).unwrap();
        assert_eq!(back, hull);
    }

    #[test]
    fn test_bounds_order() {
        let mut hull = ConvexHull::default();
        hull.set_bounds(&BoxF {
            min: Vector3::new(-1.0, -2.0, -3.0),
            max: Vector3::new(1.0, 2.0, 3.0),
        });

        let mut out = Vec::new();
        hull.write(&mut out, &Version::default()).unwrap();
        // hull start (4) and count (2), then min x, max x
        assert_eq!(&out[6..10], &(-1.0f32).to_le_bytes());
        assert_eq!(&out[10..14], &1.0f32.to_le_bytes());
        assert_eq!(hull.bounds().max.z, 3.0);
    }
}
