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

extern crate difforge;
extern crate docopt;
extern crate env_logger;
#[macro_use]
extern crate serde_derive;

use std::process::exit;

use difforge::dif::{Dif, Interior};

use docopt::Docopt;

#[derive(Deserialize)]
struct Args {
    arg_file: String,
    flag_h: bool,
    flag_help: bool,
    flag_version: bool,
}

const USAGE: &'static str = "
Usage: difinfo <file>

Options:
    -h, --help     Show this message and exit.
        --version  Print version information and exit.
";

const VERSION: &'static str = "
difinfo 0.1
Copyright © 2018 Cormac O'Brien
Released under the terms of the MIT License
";

fn print_interior(label: &str, interior: &Interior) {
    println!("{}:", label);
    let rows: [(&str, usize); 14] = [
        ("surfaces", interior.surfaces.len()),
        ("planes", interior.planes.len()),
        ("normals", interior.normals.len()),
        ("points", interior.points.len()),
        ("indices", interior.indices.len()),
        ("texgen equations", interior.tex_gen_eqs.len()),
        ("materials", interior.material_names.len()),
        ("BSP nodes", interior.bsp_nodes.len()),
        ("solid leaves", interior.bsp_solid_leaves.len()),
        ("zones", interior.zones.len()),
        ("portals", interior.portals.len()),
        ("convex hulls", interior.convex_hulls.len()),
        ("lightmaps", interior.light_maps.len()),
        ("static meshes", interior.static_meshes.len()),
    ];
    for (name, count) in rows.iter() {
        println!("    {:<18}{}", name, count);
    }
}

fn main() {
    env_logger::init();

    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if args.flag_help || args.flag_h {
        println!("{}", USAGE);
        exit(0);
    }

    if args.flag_version {
        println!("{}", VERSION);
        exit(0);
    }

    let (dif, version) = match Dif::load(&args.arg_file) {
        Ok(d) => d,
        Err(why) => {
            println!("Couldn't load {}: {}", args.arg_file, why);
            exit(1);
        }
    };

    println!("{}", args.arg_file);
    println!(
        "dif {} ({}), interior {} ({}), material list {}, vehicle collision {}",
        version.dif.version,
        version.dif.ty,
        version.interior.version,
        version.interior.ty,
        version.material.version,
        version.vehicle_collision.version
    );
    println!(
        "{} triggers, {} path followers, {} force fields, {} AI nodes, {} game entities",
        dif.triggers.len(),
        dif.path_followers.len(),
        dif.force_fields.len(),
        dif.ai_special_nodes.len(),
        dif.game_entities.len()
    );
    if dif.vehicle_collision.is_some() {
        println!("has vehicle collision");
    }
    if dif.preview.is_some() {
        println!("has preview image");
    }

    for (i, interior) in dif.interiors.iter().enumerate() {
        print_interior(&format!("interior {}", i), interior);
    }
    for (i, interior) in dif.sub_objects.iter().enumerate() {
        print_interior(&format!("sub-object {}", i), interior);
    }
}
