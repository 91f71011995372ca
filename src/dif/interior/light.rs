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
    types::Png,
    version::Version,
};

/// A baked lightmap image.
///
/// Only the non-TGE lineages store a direction map beside each lightmap; for the others it stays
/// empty.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LightMap {
    pub light_map: Png,
    pub light_dir_map: Png,
    pub keep_light_map: u8,
}

impl Readable for LightMap {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let light_map = Png::read(reader, version)?;
        let light_dir_map = if version.interior.is_tge() {
            Png::default()
        } else {
            Png::read(reader, version)?
        };
        let keep_light_map = u8::read(reader, version)?;
        Ok(LightMap {
            light_map,
            light_dir_map,
            keep_light_map,
        })
    }
}

impl Writable for LightMap {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.light_map.write(writer, version)?;
        if !version.interior.is_tge() {
            self.light_dir_map.write(writer, version)?;
        }
        self.keep_light_map.write(writer, version)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct AnimatedLight {
    pub name_index: u32,
    pub state_index: u32,
    pub state_count: u16,
    pub flags: u16,
    pub duration: u32,
}

impl Readable for AnimatedLight {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(AnimatedLight {
            name_index: u32::read(reader, version)?,
            state_index: u32::read(reader, version)?,
            state_count: u16::read(reader, version)?,
            flags: u16::read(reader, version)?,
            duration: u32::read(reader, version)?,
        })
    }
}

impl Writable for AnimatedLight {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.name_index.write(writer, version)?;
        self.state_index.write(writer, version)?;
        self.state_count.write(writer, version)?;
        self.flags.write(writer, version)?;
        self.duration.write(writer, version)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LightState {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub active_time: u32,
    pub data_index: u32,
    pub data_count: u16,
}

impl Readable for LightState {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(LightState {
            red: u8::read(reader, version)?,
            green: u8::read(reader, version)?,
            blue: u8::read(reader, version)?,
            active_time: u32::read(reader, version)?,
            data_index: u32::read(reader, version)?,
            data_count: u16::read(reader, version)?,
        })
    }
}

impl Writable for LightState {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.red.write(writer, version)?;
        self.green.write(writer, version)?;
        self.blue.write(writer, version)?;
        self.active_time.write(writer, version)?;
        self.data_index.write(writer, version)?;
        self.data_count.write(writer, version)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StateData {
    pub surface_index: u32,
    pub map_index: u32,
    pub light_state_index: u16,
}

impl Readable for StateData {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(StateData {
            surface_index: u32::read(reader, version)?,
            map_index: u32::read(reader, version)?,
            light_state_index: u16::read(reader, version)?,
        })
    }
}

impl Writable for StateData {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.surface_index.write(writer, version)?;
        self.map_index.write(writer, version)?;
        self.light_state_index.write(writer, version)
    }
}
