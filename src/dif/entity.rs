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

use cgmath::Vector3;

/// A named navigation point for AI.
#[derive(Clone, Debug, PartialEq)]
pub struct AiSpecialNode {
    pub name: String,
    pub position: Vector3<f32>,
}

impl Readable for AiSpecialNode {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(AiSpecialNode {
            name: String::read(reader, version)?,
            position: Vector3::read(reader, version)?,
        })
    }
}

impl Writable for AiSpecialNode {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.name.write(writer, version)?;
        self.position.write(writer, version)
    }
}

/// A game object placed by the interior, such as an item or a gem.
#[derive(Clone, Debug, PartialEq)]
pub struct GameEntity {
    pub datablock: String,
    pub game_class: String,
    pub position: Vector3<f32>,
    pub properties: Dictionary,
}

impl Readable for GameEntity {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(GameEntity {
            datablock: String::read(reader, version)?,
            game_class: String::read(reader, version)?,
            position: Vector3::read(reader, version)?,
            properties: Dictionary::read(reader, version)?,
        })
    }
}

impl Writable for GameEntity {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.datablock.write(writer, version)?;
        self.game_class.write(writer, version)?;
        self.position.write(writer, version)?;
        self.properties.write(writer, version)
    }
}
