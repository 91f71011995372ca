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

//! Small value types shared across the schema.

use std::io::{Read, Seek, Write};

use crate::dif::{
    error::{DifError, DifErrorKind},
    io::{Readable, Writable},
    version::Version,
};

use byteorder::ReadBytesExt;
use cgmath::{InnerSpace, Vector3};
use failure::ResultExt;

/// The last eight bytes of every PNG stream (the IEND chunk and its CRC).
pub const PNG_TRAILER: [u8; 8] = [0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82];

/// An axis-aligned box, stored as all three minimums followed by all three maximums.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoxF {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl BoxF {
    /// A box that any point will expand.
    pub fn empty() -> BoxF {
        BoxF {
            min: Vector3::new(1e8, 1e8, 1e8),
            max: Vector3::new(-1e8, -1e8, -1e8),
        }
    }

    pub fn from_points<'a, I>(points: I) -> BoxF
    where
        I: IntoIterator<Item = &'a Vector3<f32>>,
    {
        let mut b = BoxF::empty();
        for p in points {
            b.extend(*p);
        }
        b
    }

    pub fn extend(&mut self, p: Vector3<f32>) {
        for c in 0..3 {
            self.min[c] = self.min[c].min(p[c]);
            self.max[c] = self.max[c].max(p[c]);
        }
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) / 2.0
    }

    pub fn extents(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Whether the XY footprints of the two boxes touch.
    pub fn overlaps_xy(&self, other: &BoxF) -> bool {
        !(self.min.x > other.max.x
            || self.max.x < other.min.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }
}

impl Default for BoxF {
    fn default() -> Self {
        BoxF {
            min: Vector3::new(0.0, 0.0, 0.0),
            max: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

impl Readable for BoxF {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let min = Vector3::read(reader, version)?;
        let max = Vector3::read(reader, version)?;
        Ok(BoxF { min, max })
    }
}

impl Writable for BoxF {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.min.write(writer, version)?;
        self.max.write(writer, version)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SphereF {
    pub origin: Vector3<f32>,
    pub radius: f32,
}

impl SphereF {
    /// The sphere centered on `b` that passes through its corners.
    pub fn enclosing(b: &BoxF) -> SphereF {
        let origin = b.center();
        SphereF {
            origin,
            radius: (b.max - origin).magnitude(),
        }
    }
}

impl Default for SphereF {
    fn default() -> Self {
        SphereF {
            origin: Vector3::new(0.0, 0.0, 0.0),
            radius: 0.0,
        }
    }
}

impl Readable for SphereF {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let origin = Vector3::read(reader, version)?;
        let radius = f32::read(reader, version)?;
        Ok(SphereF { origin, radius })
    }
}

impl Writable for SphereF {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.origin.write(writer, version)?;
        self.radius.write(writer, version)
    }
}

/// A plane in `ax + by + cz + d = 0` form.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneF {
    pub normal: Vector3<f32>,
    pub d: f32,
}

impl PlaneF {
    pub fn new(x: f32, y: f32, z: f32, d: f32) -> PlaneF {
        PlaneF {
            normal: Vector3::new(x, y, z),
            d,
        }
    }

    pub fn distance(&self, p: Vector3<f32>) -> f32 {
        self.normal.dot(p) + self.d
    }
}

impl Default for PlaneF {
    fn default() -> Self {
        PlaneF::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl Readable for PlaneF {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let normal = Vector3::read(reader, version)?;
        let d = f32::read(reader, version)?;
        Ok(PlaneF { normal, d })
    }
}

impl Writable for PlaneF {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.normal.write(writer, version)?;
        self.d.write(writer, version)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ColorI {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorI {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> ColorI {
        ColorI { r, g, b, a }
    }
}

impl Readable for ColorI {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(ColorI {
            r: u8::read(reader, version)?,
            g: u8::read(reader, version)?,
            b: u8::read(reader, version)?,
            a: u8::read(reader, version)?,
        })
    }
}

impl Writable for ColorI {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.r.write(writer, version)?;
        self.g.write(writer, version)?;
        self.b.write(writer, version)?;
        self.a.write(writer, version)
    }
}

/// An embedded PNG image, kept as opaque bytes.
///
/// No length is stored, so reading scans forward until the stream has produced the PNG trailer.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Png {
    pub data: Vec<u8>,
}

impl Png {
    pub fn is_terminated(&self) -> bool {
        self.data.ends_with(&PNG_TRAILER)
    }
}

impl Readable for Png {
    fn read<R>(reader: &mut R, _: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let mut data = Vec::new();
        while !data.ends_with(&PNG_TRAILER) {
            data.push(reader.read_u8().context(DifErrorKind::Io)?);
        }
        Ok(Png { data })
    }
}

impl Writable for Png {
    fn write<W>(&self, writer: &mut W, _: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        if !self.is_terminated() {
            return Err(DifErrorKind::UnterminatedPng.into());
        }
        writer.write_all(&self.data).context(DifErrorKind::Io)?;
        Ok(())
    }
}

/// An ordered list of key/value string pairs.
///
/// Order is part of the format, so entries are kept in insertion order and duplicate keys are
/// allowed to survive a round trip.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Dictionary {
    entries: Vec<(String, String)>,
}

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary::default()
    }

    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key`, replacing the first existing entry or appending a new one.
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Readable for Dictionary {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(Dictionary {
            entries: Vec::read(reader, version)?,
        })
    }
}

impl Writable for Dictionary {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.entries.write(writer, version)
    }
}
