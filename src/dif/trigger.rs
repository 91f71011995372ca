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
    types::{Dictionary, PlaneF},
    version::{DifType, Version},
};

use cgmath::Vector3;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PolyhedronEdge {
    pub faces: [u32; 2],
    pub vertices: [u32; 2],
}

impl Readable for PolyhedronEdge {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let faces = [u32::read(reader, version)?, u32::read(reader, version)?];
        let vertices = [u32::read(reader, version)?, u32::read(reader, version)?];
        Ok(PolyhedronEdge { faces, vertices })
    }
}

impl Writable for PolyhedronEdge {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.faces[0].write(writer, version)?;
        self.faces[1].write(writer, version)?;
        self.vertices[0].write(writer, version)?;
        self.vertices[1].write(writer, version)
    }
}

/// The convex volume of a trigger.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polyhedron {
    pub points: Vec<Vector3<f32>>,
    pub planes: Vec<PlaneF>,
    pub edges: Vec<PolyhedronEdge>,
}

impl Readable for Polyhedron {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(Polyhedron {
            points: Vec::read(reader, version)?,
            planes: Vec::read(reader, version)?,
            edges: Vec::read(reader, version)?,
        })
    }
}

impl Writable for Polyhedron {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.points.write(writer, version)?;
        self.planes.write(writer, version)?;
        self.edges.write(writer, version)
    }
}

/// A named trigger volume.
///
/// Property dictionaries are only stored by the MBG lineage; other files read back with an empty
/// dictionary and never write one.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    pub name: String,
    pub datablock: String,
    pub properties: Dictionary,
    pub polyhedron: Polyhedron,
    pub offset: Vector3<f32>,
}

impl Default for Trigger {
    fn default() -> Self {
        Trigger {
            name: String::new(),
            datablock: String::new(),
            properties: Dictionary::new(),
            polyhedron: Polyhedron::default(),
            offset: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

impl Readable for Trigger {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let name = String::read(reader, version)?;
        let datablock = String::read(reader, version)?;
        let properties = if version.dif.ty == DifType::Mbg {
            Dictionary::read(reader, version)?
        } else {
            Dictionary::new()
        };
        Ok(Trigger {
            name,
            datablock,
            properties,
            polyhedron: Polyhedron::read(reader, version)?,
            offset: Vector3::read(reader, version)?,
        })
    }
}

impl Writable for Trigger {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.name.write(writer, version)?;
        self.datablock.write(writer, version)?;
        if version.dif.ty == DifType::Mbg {
            self.properties.write(writer, version)?;
        }
        self.polyhedron.write(writer, version)?;
        self.offset.write(writer, version)
    }
}
