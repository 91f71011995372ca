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

//! The version descriptor that steers every conditional field in the format.
//!
//! A `Version` starts out mostly unknown when reading: the reader fills in the declared version
//! numbers as it meets them and narrows the type tags as it works out which producer wrote the
//! file. When writing, the caller fixes all four parts up front.

use strum_macros::{Display, EnumString};

/// The container version every supported file declares.
pub const DIF_VERSION: u32 = 44;

/// The newest interior version this crate understands.
pub const MAX_INTERIOR_VERSION: u32 = 14;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DifType {
    Unknown,
    Mbg,
    Tge,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum InteriorType {
    Unknown,
    Mbg,
    Tge,
    Tgea,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DifVersion {
    pub version: u32,
    pub ty: DifType,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InteriorVersion {
    pub version: u32,
    pub ty: InteriorType,
}

impl InteriorVersion {
    /// Whether this interior uses the older surface and lightmap layout shared by the TGE and MBG
    /// producers.
    pub fn is_tge(&self) -> bool {
        match self.ty {
            InteriorType::Tge | InteriorType::Mbg => true,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MaterialListVersion {
    pub version: u8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VehicleCollisionVersion {
    pub version: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Version {
    pub dif: DifVersion,
    pub interior: InteriorVersion,
    pub material: MaterialListVersion,
    pub vehicle_collision: VehicleCollisionVersion,
}

impl Version {
    /// Returns a descriptor for writing files of the given interior version and lineage.
    pub fn with_interior(version: u32, ty: InteriorType) -> Version {
        let mut v = Version::default();
        v.interior = InteriorVersion { version, ty };
        v.dif.ty = match ty {
            InteriorType::Mbg => DifType::Mbg,
            InteriorType::Unknown => DifType::Unknown,
            _ => DifType::Tge,
        };
        v
    }
}

impl Default for Version {
    fn default() -> Self {
        Version {
            dif: DifVersion {
                version: DIF_VERSION,
                ty: DifType::Unknown,
            },
            interior: InteriorVersion {
                version: 0,
                ty: InteriorType::Unknown,
            },
            material: MaterialListVersion { version: 1 },
            vehicle_collision: VehicleCollisionVersion { version: 0 },
        }
    }
}
