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

//! Typed binary I/O for the container format.
//!
//! Every serializable type implements [`Readable`] and [`Writable`]. Scalars are little-endian,
//! strings carry a one-byte length and lists a four-byte count. A handful of index lists use the
//! dual-width encoding handled by [`read_vec_as`] and [`write_vec_as`], where the top bit of the
//! count selects a narrower element type for some call sites.
//!
//! Any failure aborts the enclosing read. Partially decoded lists are dropped with the error.

use std::{
    convert::TryFrom,
    io::{Read, Seek, Write},
};

use crate::dif::{
    error::{DifError, DifErrorKind},
    version::Version,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use cgmath::{Matrix4, Quaternion, Vector2, Vector3, Zero};
use failure::ResultExt;

/// Set in a list count when an extra parameter byte follows and the list may use its alternate
/// element type.
pub const ALTERNATE_COUNT_FLAG: u32 = 0x8000_0000;

/// Caps the up-front allocation for a list so a corrupt count cannot exhaust memory before the
/// stream runs dry.
const MAX_PREALLOCATION: usize = 4096;

pub trait Readable: Sized {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek;
}

pub trait Writable {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write;
}

macro_rules! impl_scalar {
    ($ty:ty, $read:ident, $write:ident) => {
        impl Readable for $ty {
            fn read<R>(reader: &mut R, _: &mut Version) -> Result<Self, DifError>
            where
                R: Read + Seek,
            {
                Ok(reader.$read::<LittleEndian>().context(DifErrorKind::Io)?)
            }
        }

        impl Writable for $ty {
            fn write<W>(&self, writer: &mut W, _: &Version) -> Result<(), DifError>
            where
                W: Write,
            {
                writer
                    .$write::<LittleEndian>(*self)
                    .context(DifErrorKind::Io)?;
                Ok(())
            }
        }
    };
}

impl_scalar!(u16, read_u16, write_u16);
impl_scalar!(u32, read_u32, write_u32);
impl_scalar!(i16, read_i16, write_i16);
impl_scalar!(i32, read_i32, write_i32);
impl_scalar!(f32, read_f32, write_f32);

impl Readable for u8 {
    fn read<R>(reader: &mut R, _: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(reader.read_u8().context(DifErrorKind::Io)?)
    }
}

impl Writable for u8 {
    fn write<W>(&self, writer: &mut W, _: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        writer.write_u8(*self).context(DifErrorKind::Io)?;
        Ok(())
    }
}

/// Strings are stored as raw bytes behind a `u8` length. Each byte maps to the `char` with the
/// same value, so any byte sequence survives a round trip.
impl Readable for String {
    fn read<R>(reader: &mut R, _: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let len = reader.read_u8().context(DifErrorKind::Io)? as usize;
        let mut bytes = vec![0; len];
        reader.read_exact(&mut bytes).context(DifErrorKind::Io)?;
        Ok(bytes.into_iter().map(|b| b as char).collect())
    }
}

impl Writable for String {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        write_str(writer, version, self)
    }
}

pub fn write_str<W>(writer: &mut W, _: &Version, s: &str) -> Result<(), DifError>
where
    W: Write,
{
    let mut bytes = Vec::with_capacity(s.len());
    for c in s.chars() {
        let code = c as u32;
        if code > 0xFF {
            return Err(DifErrorKind::StringNotLatin1.into());
        }
        bytes.push(code as u8);
    }

    if bytes.len() > 0xFF {
        return Err(DifErrorKind::StringTooLong { len: bytes.len() }.into());
    }

    writer.write_u8(bytes.len() as u8).context(DifErrorKind::Io)?;
    writer.write_all(&bytes).context(DifErrorKind::Io)?;
    Ok(())
}

impl Readable for Vector3<f32> {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let x = f32::read(reader, version)?;
        let y = f32::read(reader, version)?;
        let z = f32::read(reader, version)?;
        Ok(Vector3::new(x, y, z))
    }
}

impl Writable for Vector3<f32> {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.x.write(writer, version)?;
        self.y.write(writer, version)?;
        self.z.write(writer, version)
    }
}

impl Readable for Vector2<f32> {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let x = f32::read(reader, version)?;
        let y = f32::read(reader, version)?;
        Ok(Vector2::new(x, y))
    }
}

impl Writable for Vector2<f32> {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.x.write(writer, version)?;
        self.y.write(writer, version)
    }
}

impl Readable for Vector2<i32> {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let x = i32::read(reader, version)?;
        let y = i32::read(reader, version)?;
        Ok(Vector2::new(x, y))
    }
}

impl Writable for Vector2<i32> {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.x.write(writer, version)?;
        self.y.write(writer, version)
    }
}

/// Quaternions are stored scalar part first.
impl Readable for Quaternion<f32> {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let w = f32::read(reader, version)?;
        let x = f32::read(reader, version)?;
        let y = f32::read(reader, version)?;
        let z = f32::read(reader, version)?;
        Ok(Quaternion::new(w, x, y, z))
    }
}

impl Writable for Quaternion<f32> {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.s.write(writer, version)?;
        self.v.write(writer, version)
    }
}

/// Matrices are stored row by row.
impl Readable for Matrix4<f32> {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let mut m = Matrix4::zero();
        for row in 0..4 {
            for col in 0..4 {
                m[col][row] = f32::read(reader, version)?;
            }
        }
        Ok(m)
    }
}

impl Writable for Matrix4<f32> {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        for row in 0..4 {
            for col in 0..4 {
                self[col][row].write(writer, version)?;
            }
        }
        Ok(())
    }
}

impl<A, B> Readable for (A, B)
where
    A: Readable,
    B: Readable,
{
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let a = A::read(reader, version)?;
        let b = B::read(reader, version)?;
        Ok((a, b))
    }
}

impl<A, B> Writable for (A, B)
where
    A: Writable,
    B: Writable,
{
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.0.write(writer, version)?;
        self.1.write(writer, version)
    }
}

impl<T> Readable for Vec<T>
where
    T: Readable,
{
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        read_vec_with(reader, version, |r, v| T::read(r, v))
    }
}

impl<T> Writable for Vec<T>
where
    T: Writable,
{
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        write_slice(writer, version, self)
    }
}

pub fn write_slice<W, T>(writer: &mut W, version: &Version, items: &[T]) -> Result<(), DifError>
where
    W: Write,
    T: Writable,
{
    write_count(writer, version, items.len())?;
    for item in items {
        item.write(writer, version)?;
    }
    Ok(())
}

fn write_count<W>(writer: &mut W, version: &Version, count: usize) -> Result<(), DifError>
where
    W: Write,
{
    if count as u64 >= ALTERNATE_COUNT_FLAG as u64 {
        return Err(DifErrorKind::CountOverflow { count }.into());
    }
    (count as u32).write(writer, version)
}

/// Reads a counted list, handing each element to `read_elem`.
///
/// This is for elements whose decoding needs context from outside the element itself, such as
/// the sizes of sibling tables to check indices against.
pub fn read_vec_with<R, T, F>(
    reader: &mut R,
    version: &mut Version,
    mut read_elem: F,
) -> Result<Vec<T>, DifError>
where
    R: Read + Seek,
    F: FnMut(&mut R, &mut Version) -> Result<T, DifError>,
{
    let count = u32::read(reader, version)? as usize;
    let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATION));
    for _ in 0..count {
        items.push(read_elem(reader, version)?);
    }
    Ok(items)
}

/// Reads a dual-width list.
///
/// If the count has [`ALTERNATE_COUNT_FLAG`] set, the flag is cleared and a parameter byte
/// follows. `use_alternate(flag, param)` then decides for the whole list whether elements are
/// stored as `A` rather than `T`.
pub fn read_vec_as<R, T, A, F>(
    reader: &mut R,
    version: &mut Version,
    use_alternate: F,
) -> Result<Vec<T>, DifError>
where
    R: Read + Seek,
    T: Readable,
    A: Readable + Into<T>,
    F: Fn(bool, u8) -> bool,
{
    let mut count = u32::read(reader, version)?;
    let mut flag = false;
    let mut param = 0;

    if count & ALTERNATE_COUNT_FLAG != 0 {
        count &= !ALTERNATE_COUNT_FLAG;
        flag = true;
        param = u8::read(reader, version)?;
    }

    let alternate = use_alternate(flag, param);
    let count = count as usize;
    let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATION));
    for _ in 0..count {
        let item = if alternate {
            A::read(reader, version)?.into()
        } else {
            T::read(reader, version)?
        };
        items.push(item);
    }

    Ok(items)
}

/// Writes a dual-width list.
///
/// `param` of `None` writes a plain count, `Some(p)` sets [`ALTERNATE_COUNT_FLAG`] and writes `p`
/// after the count. Elements are then written as `A` or `T` following the same predicate the
/// reader will apply, so reading back with that predicate yields the same values either way.
/// Values that do not fit `A` are rejected.
pub fn write_vec_as<W, T, A, F>(
    writer: &mut W,
    version: &Version,
    items: &[T],
    use_alternate: F,
    param: Option<u8>,
    field: &'static str,
) -> Result<(), DifError>
where
    W: Write,
    T: Writable + Copy + Into<u64>,
    A: Writable + TryFrom<T>,
    F: Fn(bool, u8) -> bool,
{
    if items.len() as u64 >= ALTERNATE_COUNT_FLAG as u64 {
        return Err(DifErrorKind::CountOverflow { count: items.len() }.into());
    }

    let (flag, p) = match param {
        Some(p) => (true, p),
        None => (false, 0),
    };

    let mut count = items.len() as u32;
    if flag {
        count |= ALTERNATE_COUNT_FLAG;
    }
    count.write(writer, version)?;
    if flag {
        p.write(writer, version)?;
    }

    if use_alternate(flag, p) {
        for item in items {
            narrow::<T, A>(*item, field)?.write(writer, version)?;
        }
    } else {
        for item in items {
            item.write(writer, version)?;
        }
    }

    Ok(())
}

/// Reads a list whose count is followed by an extra value before the elements.
pub fn read_vec_extra<R, E, T>(
    reader: &mut R,
    version: &mut Version,
) -> Result<(E, Vec<T>), DifError>
where
    R: Read + Seek,
    E: Readable,
    T: Readable,
{
    let count = u32::read(reader, version)? as usize;
    let extra = E::read(reader, version)?;
    let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATION));
    for _ in 0..count {
        items.push(T::read(reader, version)?);
    }
    Ok((extra, items))
}

pub fn write_vec_extra<W, E, T>(
    writer: &mut W,
    version: &Version,
    extra: &E,
    items: &[T],
) -> Result<(), DifError>
where
    W: Write,
    E: Writable,
    T: Writable,
{
    write_count(writer, version, items.len())?;
    extra.write(writer, version)?;
    for item in items {
        item.write(writer, version)?;
    }
    Ok(())
}

/// Converts `value` to a narrower on-disk type, failing if it does not fit.
pub fn narrow<T, U>(value: T, field: &'static str) -> Result<U, DifError>
where
    T: Copy + Into<u64>,
    U: TryFrom<T>,
{
    U::try_from(value).map_err(|_| {
        DifErrorKind::ValueTooWide {
            field,
            value: value.into(),
        }
        .into()
    })
}

/// Checks that `index` addresses one of `len` elements.
pub fn check_index<T>(index: T, len: usize, field: &'static str) -> Result<(), DifError>
where
    T: Into<u64>,
{
    let index = index.into();
    if index >= len as u64 {
        return Err(DifErrorKind::IndexOutOfRange { field, index, len }.into());
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use rand::{Rng, SeedableRng, XorShiftRng};

    fn read_back<T>(bytes: Vec<u8>) -> T
    where
        T: Readable,
    {
        let mut version = Version::default();
        T::read(&mut Cursor::new(bytes), &mut version).unwrap()
    }

    #[test]
    fn test_scalars_little_endian() {
        let mut out = Vec::new();
        0x1234_5678u32.write(&mut out, &Version::default()).unwrap();
        0xABCDu16.write(&mut out, &Version::default()).unwrap();
        assert_eq!(out, vec![0x78, 0x56, 0x34, 0x12, 0xCD, 0xAB]);
    }

    #[test]
    fn test_short_read_fails() {
        let mut version = Version::default();
        let err = u32::read(&mut Cursor::new(vec![1, 2]), &mut version).unwrap_err();
        assert_eq!(err.kind(), DifErrorKind::Io);
    }

    #[test]
    fn test_string() {
        let s: String = read_back(vec![3, b'a', b'b', 0xE9]);
        assert_eq!(s, "ab\u{e9}");

        let mut out = Vec::new();
        s.write(&mut out, &Version::default()).unwrap();
        assert_eq!(out, vec![3, b'a', b'b', 0xE9]);
    }

    #[test]
    fn test_string_limits() {
        let mut out = Vec::new();
        let long: String = std::iter::repeat('x').take(256).collect();
        let err = long.write(&mut out, &Version::default()).unwrap_err();
        assert_eq!(err.kind(), DifErrorKind::StringTooLong { len: 256 });

        let err = "\u{263a}"
            .to_owned()
            .write(&mut out, &Version::default())
            .unwrap_err();
        assert_eq!(err.kind(), DifErrorKind::StringNotLatin1);
    }

    #[test]
    fn test_vec_partial_read_fails() {
        // claims three elements, carries two
        let bytes = vec![3, 0, 0, 0, 1, 0, 2, 0];
        let mut version = Version::default();
        let result = Vec::<u16>::read(&mut Cursor::new(bytes), &mut version);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_as_flagged_narrow() {
        // count 2 with the flag set, param 0, then two u16 elements
        let bytes = vec![2, 0, 0, 0x80, 0, 7, 0, 9, 0];
        let mut version = Version::default();
        let items = read_vec_as::<_, u32, u16, _>(
            &mut Cursor::new(bytes),
            &mut version,
            |flag, _| flag,
        )
        .unwrap();
        assert_eq!(items, vec![7, 9]);
    }

    #[test]
    fn test_read_as_unflagged_natural() {
        let bytes = vec![1, 0, 0, 0, 7, 0, 0, 0];
        let mut version = Version::default();
        let items = read_vec_as::<_, u32, u16, _>(
            &mut Cursor::new(bytes),
            &mut version,
            |flag, _| flag,
        )
        .unwrap();
        assert_eq!(items, vec![7]);
    }

    #[test]
    fn test_read_as_param_predicate() {
        // flagged but param 0: the index list predicate keeps the natural width
        let bytes = vec![1, 0, 0, 0x80, 0, 5, 0, 0, 0];
        let mut version = Version::default();
        let items = read_vec_as::<_, u32, u16, _>(
            &mut Cursor::new(bytes),
            &mut version,
            |_, param| param != 0,
        )
        .unwrap();
        assert_eq!(items, vec![5]);
    }

    #[test]
    fn test_write_as_rejects_wide_values() {
        let mut out = Vec::new();
        let err = write_vec_as::<_, u32, u16, _>(
            &mut out,
            &Version::default(),
            &[0x1_0000],
            |flag, _| flag,
            Some(0),
            "hullIndex",
        )
        .unwrap_err();
        assert_eq!(
            err.kind(),
            DifErrorKind::ValueTooWide {
                field: "hullIndex",
                value: 0x1_0000
            }
        );
    }

    fn flag_set(flag: bool, _: u8) -> bool {
        flag
    }

    fn param_nonzero(_: bool, param: u8) -> bool {
        param != 0
    }

    fn flag_and_zero(flag: bool, param: u8) -> bool {
        flag && param == 0
    }

    #[test]
    fn test_variable_width_law() {
        let mut rng = XorShiftRng::from_seed([0x1234, 0x5678, 0x9abc, 0xdef0]);
        let predicates: [fn(bool, u8) -> bool; 3] = [flag_set, param_nonzero, flag_and_zero];

        for pred in predicates.iter() {
            for _ in 0..32 {
                let len = rng.gen_range(0, 64);
                let values: Vec<u32> = (0..len).map(|_| rng.gen_range(0, 0x1_0000)).collect();

                for &param in [None, Some(0u8), Some(1u8)].iter() {
                    let mut out = Vec::new();
                    write_vec_as::<_, u32, u16, _>(
                        &mut out,
                        &Version::default(),
                        &values,
                        *pred,
                        param,
                        "test",
                    )
                    .unwrap();

                    let mut version = Version::default();
                    let back = read_vec_as::<_, u32, u16, _>(
                        &mut Cursor::new(out),
                        &mut version,
                        *pred,
                    )
                    .unwrap();
                    assert_eq!(back, values);
                }
            }
        }
    }

    #[test]
    fn test_vec_extra() {
        let mut out = Vec::new();
        write_vec_extra(&mut out, &Version::default(), &0xAAu32, &[1u8, 2, 3]).unwrap();
        assert_eq!(out, vec![3, 0, 0, 0, 0xAA, 0, 0, 0, 1, 2, 3]);

        let mut version = Version::default();
        let (flags, items): (u32, Vec<u8>) =
            read_vec_extra(&mut Cursor::new(out), &mut version).unwrap();
        assert_eq!(flags, 0xAA);
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_quaternion_order() {
        let q: Quaternion<f32> = {
            let mut out = Vec::new();
            for f in [1.0f32, 2.0, 3.0, 4.0].iter() {
                f.write(&mut out, &Version::default()).unwrap();
            }
            read_back(out)
        };
        assert_eq!(q.s, 1.0);
        assert_eq!(q.v, Vector3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn test_matrix_row_major() {
        let mut out = Vec::new();
        for i in 0..16 {
            (i as f32).write(&mut out, &Version::default()).unwrap();
        }
        let m: Matrix4<f32> = read_back(out);
        // second value on disk is row 0, column 1
        assert_eq!(m[1][0], 1.0);
        assert_eq!(m[0][1], 4.0);
    }
}
