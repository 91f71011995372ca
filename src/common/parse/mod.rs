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

//! Text format parsers built on `nom`.

pub mod obj;

use cgmath::{Vector2, Vector3};
use nom::{
    character::complete::{char, digit1, space1},
    combinator::{map, map_res, opt, recognize},
    number::complete::float,
    sequence::{pair, preceded, tuple},
};

/// An optionally negative decimal integer.
pub fn integer(input: &str) -> nom::IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i64>()
    })(input)
}

// "u v"
pub fn vector2(input: &str) -> nom::IResult<&str, Vector2<f32>> {
    map(pair(float, preceded(space1, float)), |(x, y)| {
        Vector2::new(x, y)
    })(input)
}

// "x y z"
pub fn vector3(input: &str) -> nom::IResult<&str, Vector3<f32>> {
    map(
        tuple((float, preceded(space1, float), preceded(space1, float))),
        |(x, y, z)| Vector3::new(x, y, z),
    )(input)
}
