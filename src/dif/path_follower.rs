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
    types::Dictionary,
    version::Version,
};

use cgmath::{Quaternion, Vector3};
use chrono::Duration;
use num::FromPrimitive;

#[derive(Copy, Clone, Debug, Eq, FromPrimitive, PartialEq)]
pub enum Smoothing {
    Linear = 0,
    Accelerate = 1,
    Spline = 2,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WayPoint {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub ms_to_next: u32,
    pub smoothing_type: u32,
}

impl WayPoint {
    pub fn time_to_next(&self) -> Duration {
        Duration::milliseconds(self.ms_to_next as i64)
    }

    /// The interpolation mode, or `None` for a value no known engine uses.
    pub fn smoothing(&self) -> Option<Smoothing> {
        Smoothing::from_u32(self.smoothing_type)
    }
}

impl Readable for WayPoint {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(WayPoint {
            position: Vector3::read(reader, version)?,
            rotation: Quaternion::read(reader, version)?,
            ms_to_next: u32::read(reader, version)?,
            smoothing_type: u32::read(reader, version)?,
        })
    }
}

impl Writable for WayPoint {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.position.write(writer, version)?;
        self.rotation.write(writer, version)?;
        self.ms_to_next.write(writer, version)?;
        self.smoothing_type.write(writer, version)
    }
}

/// Moves one of the container's sub-object interiors along a path of way points.
#[derive(Clone, Debug, PartialEq)]
pub struct InteriorPathFollower {
    pub name: String,
    pub datablock: String,
    pub interior_res_index: u32,
    pub offset: Vector3<f32>,
    pub properties: Dictionary,
    pub trigger_ids: Vec<u32>,
    pub way_points: Vec<WayPoint>,
    pub total_ms: u32,
}

impl InteriorPathFollower {
    pub fn total_time(&self) -> Duration {
        Duration::milliseconds(self.total_ms as i64)
    }
}

impl Readable for InteriorPathFollower {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(InteriorPathFollower {
            name: String::read(reader, version)?,
            datablock: String::read(reader, version)?,
            interior_res_index: u32::read(reader, version)?,
            offset: Vector3::read(reader, version)?,
            properties: Dictionary::read(reader, version)?,
            trigger_ids: Vec::read(reader, version)?,
            way_points: Vec::read(reader, version)?,
            total_ms: u32::read(reader, version)?,
        })
    }
}

impl Writable for InteriorPathFollower {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.name.write(writer, version)?;
        self.datablock.write(writer, version)?;
        self.interior_res_index.write(writer, version)?;
        self.offset.write(writer, version)?;
        self.properties.write(writer, version)?;
        self.trigger_ids.write(writer, version)?;
        self.way_points.write(writer, version)?;
        self.total_ms.write(writer, version)
    }
}
