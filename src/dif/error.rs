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

use std::fmt::{self, Display};

use failure::{Backtrace, Context, Fail};

#[derive(Debug)]
pub struct DifError {
    inner: Context<DifErrorKind>,
}

impl DifError {
    pub fn kind(&self) -> DifErrorKind {
        self.inner.get_context().clone()
    }
}

impl From<DifErrorKind> for DifError {
    fn from(kind: DifErrorKind) -> Self {
        DifError {
            inner: Context::new(kind),
        }
    }
}

impl From<Context<DifErrorKind>> for DifError {
    fn from(inner: Context<DifErrorKind>) -> Self {
        DifError { inner }
    }
}

impl Fail for DifError {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl Display for DifError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum DifErrorKind {
    #[fail(display = "I/O error")]
    Io,
    #[fail(display = "Bad container version: expected 44, found {}", found)]
    InvalidMagic { found: u32 },
    #[fail(display = "Unsupported interior version {}", version)]
    UnsupportedInteriorVersion { version: u32 },
    #[fail(display = "{} index {} out of range (len {})", field, index, len)]
    IndexOutOfRange {
        field: &'static str,
        index: u64,
        len: usize,
    },
    #[fail(
        display = "Winding {}+{} runs past the end of the index buffer (len {})",
        start, count, len
    )]
    WindingOutOfRange { start: u32, count: u32, len: usize },
    #[fail(display = "Interior declares {} sub-objects, which are not supported", count)]
    SubObjectsUnsupported { count: u32 },
    #[fail(display = "Static mesh material lists are not supported")]
    StaticMeshMaterialListUnsupported,
    #[fail(display = "Surfaces failed to parse in both version 0 layouts")]
    LegacyFallbackFailed,
    #[fail(display = "Value {} does not fit the on-disk width of {}", value, field)]
    ValueTooWide { field: &'static str, value: u64 },
    #[fail(display = "String of {} bytes exceeds the 255 byte limit", len)]
    StringTooLong { len: usize },
    #[fail(display = "String contains characters that cannot be stored as single bytes")]
    StringNotLatin1,
    #[fail(display = "PNG data is missing its IEND trailer")]
    UnterminatedPng,
    #[fail(display = "List of {} elements is too long to encode", count)]
    CountOverflow { count: usize },
}
