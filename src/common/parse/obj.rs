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

//! Wavefront OBJ geometry.
//!
//! Only the statements needed to recover textured triangles are understood: `v`, `vt`, `vn`, `f`,
//! `usemtl`, `o` and `g`. Everything else, including material libraries and smoothing groups, is
//! skipped.

use crate::common::parse::{integer, vector2, vector3};

use cgmath::{Vector2, Vector3};
use failure::Error;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, one_of, space1},
    combinator::{map, opt, rest},
    multi::separated_nonempty_list,
    number::complete::float,
    sequence::{pair, preceded, tuple},
};

const DEFAULT_MATERIAL: &str = "default";

/// A face corner as written in the file: 1-based or negative relative indices.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawVertex {
    pub position: i64,
    pub tex_coord: Option<i64>,
    pub normal: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement<'a> {
    Position(Vector3<f32>),
    TexCoord(Vector2<f32>),
    Normal(Vector3<f32>),
    Face(Vec<RawVertex>),
    UseMaterial(&'a str),
    Group(&'a str),
}

// "1", "1/2", "1//3", "1/2/3"
pub fn face_vertex(input: &str) -> nom::IResult<&str, RawVertex> {
    map(
        tuple((
            integer,
            opt(preceded(char('/'), opt(integer))),
            opt(preceded(char('/'), integer)),
        )),
        |(position, tex_coord, normal)| RawVertex {
            position,
            tex_coord: tex_coord.and_then(|t| t),
            normal,
        },
    )(input)
}

fn name(input: &str) -> nom::IResult<&str, &str> {
    map(rest, str::trim)(input)
}

pub fn statement(input: &str) -> nom::IResult<&str, Statement> {
    alt((
        map(preceded(pair(tag("vt"), space1), texture_coordinate), Statement::TexCoord),
        map(preceded(pair(tag("vn"), space1), vector3), Statement::Normal),
        map(preceded(pair(tag("v"), space1), vector3), Statement::Position),
        map(
            preceded(
                pair(tag("f"), space1),
                separated_nonempty_list(space1, face_vertex),
            ),
            Statement::Face,
        ),
        map(preceded(pair(tag("usemtl"), space1), name), Statement::UseMaterial),
        map(preceded(pair(one_of("og"), space1), name), Statement::Group),
    ))(input)
}

// "u" or "u v"; a missing v is 0
fn texture_coordinate(input: &str) -> nom::IResult<&str, Vector2<f32>> {
    alt((vector2, map(float, |u| Vector2::new(u, 0.0))))(input)
}

/// A face corner resolved to 0-based indices into the model's attribute lists.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ObjVertex {
    pub position: usize,
    pub tex_coord: Option<usize>,
    pub normal: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjFace {
    pub vertices: Vec<ObjVertex>,
    pub material: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Obj {
    pub positions: Vec<Vector3<f32>>,
    pub tex_coords: Vec<Vector2<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub faces: Vec<ObjFace>,
}

/// Resolves a 1-based or negative OBJ index against a list of `len` elements.
fn resolve(index: i64, len: usize, what: &str) -> Result<usize, Error> {
    let resolved = if index < 0 {
        len as i64 + index
    } else {
        index - 1
    };

    ensure!(
        index != 0 && resolved >= 0 && (resolved as usize) < len,
        "{} index {} out of range ({} defined)",
        what,
        index,
        len
    );
    Ok(resolved as usize)
}

impl Obj {
    pub fn parse(src: &str) -> Result<Obj, Error> {
        let mut obj = Obj::default();
        let mut material: Option<String> = None;
        let mut group: Option<String> = None;

        for (n, line) in src.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let keyword = line.split_whitespace().next().unwrap_or("");
            let stmt = match statement(line) {
                Ok((_, s)) => s,
                Err(_) => match keyword {
                    "v" | "vt" | "vn" | "f" => {
                        bail!("line {}: malformed `{}` statement", n + 1, keyword)
                    }
                    _ => {
                        trace!("line {}: skipping `{}`", n + 1, keyword);
                        continue;
                    }
                },
            };

            match stmt {
                Statement::Position(p) => obj.positions.push(p),
                Statement::TexCoord(t) => obj.tex_coords.push(t),
                Statement::Normal(v) => obj.normals.push(v),
                Statement::UseMaterial(m) => material = Some(m.to_owned()),
                Statement::Group(g) => group = Some(g.to_owned()),
                Statement::Face(raw) => {
                    ensure!(
                        raw.len() >= 3,
                        "line {}: face has only {} vertices",
                        n + 1,
                        raw.len()
                    );

                    let mut vertices = Vec::with_capacity(raw.len());
                    for r in raw {
                        vertices.push(obj.resolve_vertex(r).map_err(|e| {
                            format_err!("line {}: {}", n + 1, e)
                        })?);
                    }

                    let material = material
                        .as_ref()
                        .or_else(|| group.as_ref())
                        .map(String::as_str)
                        .unwrap_or(DEFAULT_MATERIAL)
                        .to_owned();
                    obj.faces.push(ObjFace { vertices, material });
                }
            }
        }

        debug!(
            "parsed OBJ: {} positions, {} texture coordinates, {} normals, {} faces",
            obj.positions.len(),
            obj.tex_coords.len(),
            obj.normals.len(),
            obj.faces.len()
        );

        Ok(obj)
    }

    fn resolve_vertex(&self, raw: RawVertex) -> Result<ObjVertex, Error> {
        Ok(ObjVertex {
            position: resolve(raw.position, self.positions.len(), "position")?,
            tex_coord: match raw.tex_coord {
                Some(t) => Some(resolve(t, self.tex_coords.len(), "texture coordinate")?),
                None => None,
            },
            normal: match raw.normal {
                Some(v) => Some(resolve(v, self.normals.len(), "normal")?),
                None => None,
            },
        })
    }

    /// Splits every face into a fan of triangles around its first vertex.
    pub fn triangles(&self) -> Vec<([ObjVertex; 3], &str)> {
        let mut out = Vec::new();
        for face in self.faces.iter() {
            let v = &face.vertices;
            for i in 1..v.len().saturating_sub(1) {
                out.push(([v[0], v[i], v[i + 1]], face.material.as_str()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_faces_yield_no_triangles() {
        let corner = |position| ObjVertex {
            position,
            tex_coord: None,
            normal: None,
        };
        let obj = Obj {
            faces: vec![
                ObjFace {
                    vertices: vec![],
                    material: "x".to_owned(),
                },
                ObjFace {
                    vertices: vec![corner(0), corner(1)],
                    material: "x".to_owned(),
                },
            ],
            ..Default::default()
        };
        assert!(obj.triangles().is_empty());
    }

    #[test]
    fn test_face_vertex_forms() {
        let v = |position, tex_coord, normal| RawVertex {
            position,
            tex_coord,
            normal,
        };
        assert_eq!(face_vertex("1"), Ok(("", v(1, None, None))));
        assert_eq!(face_vertex("1/2"), Ok(("", v(1, Some(2), None))));
        assert_eq!(face_vertex("1//3"), Ok(("", v(1, None, Some(3)))));
        assert_eq!(face_vertex("1/2/3"), Ok(("", v(1, Some(2), Some(3)))));
        assert_eq!(face_vertex("-1/-2/-3"), Ok(("", v(-1, Some(-2), Some(-3)))));
    }

    #[test]
    fn test_statements() {
        assert_eq!(
            statement("v 1 2 3"),
            Ok(("", Statement::Position(Vector3::new(1.0, 2.0, 3.0))))
        );
        assert_eq!(
            statement("vt 0.5"),
            Ok(("", Statement::TexCoord(Vector2::new(0.5, 0.0))))
        );
        assert_eq!(
            statement("usemtl brick wall "),
            Ok(("", Statement::UseMaterial("brick wall")))
        );
        assert_eq!(statement("g walls"), Ok(("", Statement::Group("walls"))));
        assert!(statement("s off").is_err());
    }

    #[test]
    fn test_face_trailing_space() {
        match statement("f 1 2 3 ") {
            Ok((_, Statement::Face(vs))) => assert_eq!(vs.len(), 3),
            other => panic!("unexpected parse {:?}", other),
        }
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve(1, 3, "position").unwrap(), 0);
        assert_eq!(resolve(-1, 3, "position").unwrap(), 2);
        assert!(resolve(0, 3, "position").is_err());
        assert!(resolve(4, 3, "position").is_err());
        assert!(resolve(-4, 3, "position").is_err());
    }

    const QUAD: &str = "# a quad
mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
s off
f 1/1/1 2/2/1 3/3/1 4/4/1
usemtl stone
f -4//1 -3//1 -2//1
";

    #[test]
    fn test_parse_quad() {
        let obj = Obj::parse(QUAD).unwrap();
        assert_eq!(obj.positions.len(), 4);
        assert_eq!(obj.tex_coords.len(), 4);
        assert_eq!(obj.normals.len(), 1);
        assert_eq!(obj.faces.len(), 2);

        assert_eq!(obj.faces[0].material, "quad");
        assert_eq!(obj.faces[1].material, "stone");
        assert_eq!(
            obj.faces[1].vertices[0],
            ObjVertex {
                position: 0,
                tex_coord: None,
                normal: Some(0),
            }
        );

        let tris = obj.triangles();
        assert_eq!(tris.len(), 3);
        let positions: Vec<_> = tris[1].0.iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![0, 2, 3]);
        assert_eq!(tris[2].1, "stone");
    }

    #[test]
    fn test_default_material() {
        let obj = Obj::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(obj.faces[0].material, "default");
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = Obj::parse("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"), "{}", err);

        let err = Obj::parse("v 0 0\n").unwrap_err();
        assert!(err.to_string().contains("`v`"), "{}", err);

        assert!(Obj::parse("v 0 0 0\nf 1 1\n").is_err());
    }
}
