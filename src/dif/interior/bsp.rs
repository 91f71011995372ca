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
    version::Version,
};

/// Interior version from which child references are stored as `u32` with widened flag bits.
pub const WIDE_CHILD_VERSION: u32 = 14;

pub const LEAF_FLAG: u16 = 0x8000;
pub const SOLID_FLAG: u16 = 0x4000;
pub const WIDE_LEAF_FLAG: u32 = 0x8_0000;
pub const WIDE_SOLID_FLAG: u32 = 0x4_0000;

/// A child reference of a BSP node: either another node or a (solid or empty) leaf.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BspIndex {
    pub index: u32,
    pub leaf: bool,
    pub solid: bool,
}

impl BspIndex {
    pub fn node(index: u32) -> BspIndex {
        BspIndex {
            index,
            leaf: false,
            solid: false,
        }
    }

    pub fn solid_leaf(index: u32) -> BspIndex {
        BspIndex {
            index,
            leaf: true,
            solid: true,
        }
    }

    pub fn empty_leaf(index: u32) -> BspIndex {
        BspIndex {
            index,
            leaf: true,
            solid: false,
        }
    }

    /// Decodes a legacy 16-bit child reference.
    pub fn from_narrow(raw: u16) -> BspIndex {
        BspIndex {
            index: (raw & !(LEAF_FLAG | SOLID_FLAG)) as u32,
            leaf: raw & LEAF_FLAG != 0,
            solid: raw & SOLID_FLAG != 0,
        }
    }

    /// Decodes a 32-bit child reference as written from version 14 on.
    ///
    /// Only the wide flag bits are read. Bits 14 and 15 are part of the index here.
    pub fn from_wide(raw: u32) -> BspIndex {
        BspIndex {
            index: raw & !(WIDE_LEAF_FLAG | WIDE_SOLID_FLAG),
            leaf: raw & WIDE_LEAF_FLAG != 0,
            solid: raw & WIDE_SOLID_FLAG != 0,
        }
    }

    pub fn to_narrow(&self) -> Result<u16, DifError> {
        if self.index >= SOLID_FLAG as u32 {
            return Err(DifErrorKind::ValueTooWide {
                field: "bspNode child",
                value: self.index as u64,
            }
            .into());
        }

        let mut raw = self.index as u16;
        if self.leaf {
            raw |= LEAF_FLAG;
        }
        if self.solid {
            raw |= SOLID_FLAG;
        }
        Ok(raw)
    }

    pub fn to_wide(&self) -> Result<u32, DifError> {
        if self.index >= WIDE_SOLID_FLAG {
            return Err(DifErrorKind::ValueTooWide {
                field: "bspNode child",
                value: self.index as u64,
            }
            .into());
        }

        let mut raw = self.index;
        if self.leaf {
            raw |= WIDE_LEAF_FLAG;
        }
        if self.solid {
            raw |= WIDE_SOLID_FLAG;
        }
        Ok(raw)
    }
}

impl Readable for BspIndex {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        if version.interior.version >= WIDE_CHILD_VERSION {
            Ok(BspIndex::from_wide(u32::read(reader, version)?))
        } else {
            Ok(BspIndex::from_narrow(u16::read(reader, version)?))
        }
    }
}

impl Writable for BspIndex {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        if version.interior.version >= WIDE_CHILD_VERSION {
            self.to_wide()?.write(writer, version)
        } else {
            self.to_narrow()?.write(writer, version)
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BspNode {
    pub plane_index: u16,
    pub front: BspIndex,
    pub back: BspIndex,
}

impl Readable for BspNode {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(BspNode {
            plane_index: u16::read(reader, version)?,
            front: BspIndex::read(reader, version)?,
            back: BspIndex::read(reader, version)?,
        })
    }
}

impl Writable for BspNode {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.plane_index.write(writer, version)?;
        self.front.write(writer, version)?;
        self.back.write(writer, version)
    }
}

/// A range of the solid leaf surface list.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BspSolidLeaf {
    pub surface_index: u32,
    pub surface_count: u16,
}

impl Readable for BspSolidLeaf {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(BspSolidLeaf {
            surface_index: u32::read(reader, version)?,
            surface_count: u16::read(reader, version)?,
        })
    }
}

impl Writable for BspSolidLeaf {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.surface_index.write(writer, version)?;
        self.surface_count.write(writer, version)
    }
}
