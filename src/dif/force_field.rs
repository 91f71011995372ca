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
    interior::BspSolidLeaf,
    io::{Readable, Writable},
    types::{BoxF, ColorI, SphereF},
    version::Version,
};

use cgmath::Vector3;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ForceFieldPlane {
    pub normal_index: u32,
    pub plane_distance: f32,
}

impl Readable for ForceFieldPlane {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(ForceFieldPlane {
            normal_index: u32::read(reader, version)?,
            plane_distance: f32::read(reader, version)?,
        })
    }
}

impl Writable for ForceFieldPlane {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.normal_index.write(writer, version)?;
        self.plane_distance.write(writer, version)
    }
}

/// Force field BSP nodes store raw child words with no plane reference.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ForceFieldBspNode {
    pub front_index: u16,
    pub back_index: u16,
}

impl Readable for ForceFieldBspNode {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(ForceFieldBspNode {
            front_index: u16::read(reader, version)?,
            back_index: u16::read(reader, version)?,
        })
    }
}

impl Writable for ForceFieldBspNode {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.front_index.write(writer, version)?;
        self.back_index.write(writer, version)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ForceFieldSurface {
    pub winding_start: u32,
    pub winding_count: u8,
    pub plane_index: u16,
    pub surface_flags: u8,
    pub fan_mask: u32,
}

impl Readable for ForceFieldSurface {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(ForceFieldSurface {
            winding_start: u32::read(reader, version)?,
            winding_count: u8::read(reader, version)?,
            plane_index: u16::read(reader, version)?,
            surface_flags: u8::read(reader, version)?,
            fan_mask: u32::read(reader, version)?,
        })
    }
}

impl Writable for ForceFieldSurface {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.winding_start.write(writer, version)?;
        self.winding_count.write(writer, version)?;
        self.plane_index.write(writer, version)?;
        self.surface_flags.write(writer, version)?;
        self.fan_mask.write(writer, version)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForceField {
    pub version: u32,
    pub name: String,
    pub triggers: Vec<String>,
    pub bounding_box: BoxF,
    pub bounding_sphere: SphereF,
    pub normals: Vec<Vector3<f32>>,
    pub planes: Vec<ForceFieldPlane>,
    pub bsp_nodes: Vec<ForceFieldBspNode>,
    pub bsp_solid_leaves: Vec<BspSolidLeaf>,
    pub indices: Vec<u32>,
    pub surfaces: Vec<ForceFieldSurface>,
    pub solid_leaf_surfaces: Vec<u32>,
    pub color: ColorI,
}

impl Readable for ForceField {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(ForceField {
            version: u32::read(reader, version)?,
            name: String::read(reader, version)?,
            triggers: Vec::read(reader, version)?,
            bounding_box: BoxF::read(reader, version)?,
            bounding_sphere: SphereF::read(reader, version)?,
            normals: Vec::read(reader, version)?,
            planes: Vec::read(reader, version)?,
            bsp_nodes: Vec::read(reader, version)?,
            bsp_solid_leaves: Vec::read(reader, version)?,
            indices: Vec::read(reader, version)?,
            surfaces: Vec::read(reader, version)?,
            solid_leaf_surfaces: Vec::read(reader, version)?,
            color: ColorI::read(reader, version)?,
        })
    }
}

impl Writable for ForceField {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.version.write(writer, version)?;
        self.name.write(writer, version)?;
        self.triggers.write(writer, version)?;
        self.bounding_box.write(writer, version)?;
        self.bounding_sphere.write(writer, version)?;
        self.normals.write(writer, version)?;
        self.planes.write(writer, version)?;
        self.bsp_nodes.write(writer, version)?;
        self.bsp_solid_leaves.write(writer, version)?;
        self.indices.write(writer, version)?;
        self.surfaces.write(writer, version)?;
        self.solid_leaf_surfaces.write(writer, version)?;
        self.color.write(writer, version)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    #[test]
    fn test_surface_record_size() {
        let mut out = Vec::new();
        ForceFieldSurface {
            winding_start: 1,
            winding_count: 4,
            plane_index: 2,
            surface_flags: 0,
            fan_mask: 0xF,
        }
        .write(&mut out, &Version::default())
        .unwrap();
        assert_eq!(out.len(), 12);
    }

    #[test]
    fn test_round_trip() {
        let ff = ForceField {
            version: 0,
            name: "gate".to_owned(),
            triggers: vec!["gateTrigger".to_owned()],
            bounding_box: BoxF::default(),
            bounding_sphere: SphereF::default(),
            normals: vec![Vector3::new(0.0, 1.0, 0.0)],
            planes: vec![ForceFieldPlane {
                normal_index: 0,
                plane_distance: 2.0,
            }],
            bsp_nodes: vec![ForceFieldBspNode {
                front_index: 0x8000,
                back_index: 0xC000,
            }],
            bsp_solid_leaves: Vec::new(),
            indices: vec![0, 1, 2],
            surfaces: Vec::new(),
            solid_leaf_surfaces: Vec::new(),
            color: ColorI::new(255, 0, 0, 128),
        };

        let mut out = Vec::new();
        ff.write(&mut out, &Version::default()).unwrap();
        let mut version = Version::default();
        let back = ForceField::read(&mut Cursor::new(out), &mut version).unwrap();
        assert_eq!(back, ff);
    }
}
