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

use std::path::PathBuf;
use std::process::exit;

use difforge::{
    builder::{BuildConfig, SplitMode},
    dif::{InteriorType, Version},
    mesh::obj::load_obj,
};

use docopt::Docopt;

#[derive(Deserialize)]
struct Args {
    arg_file: String,
    flag_output: Option<String>,
    flag_flip: bool,
    flag_fast: bool,
    flag_scale: f32,
    flag_type: String,
    flag_h: bool,
    flag_help: bool,
    flag_version: bool,
}

const USAGE: &'static str = "
Usage: obj2dif [options] <file>

Options:
    -o, --output=<out>  Write to <out> instead of <file> with a .dif extension.
        --flip          Reverse the winding and normal of every triangle.
        --fast          Pick BSP splitting planes without scoring them.
        --scale=<s>     Scale every vertex position by <s>. [default: 1.0]
        --type=<t>      Interior lineage to write: mbg, tge or tgea. [default: tge]

    -h, --help          Show this message and exit.
        --version       Print version information and exit.
";

const VERSION: &'static str = "
obj2dif 0.1
Copyright © 2018 Cormac O'Brien
Released under the terms of the MIT License
";

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

    let ty: InteriorType = match args.flag_type.parse() {
        Ok(t) => t,
        Err(_) => {
            println!("Unknown interior type {}", args.flag_type);
            exit(1);
        }
    };

    let builder = match load_obj(&args.arg_file) {
        Ok(b) => b,
        Err(why) => {
            println!("Couldn't load {}: {}", args.arg_file, why);
            exit(1);
        }
    };

    let config = BuildConfig {
        flip_normals: args.flag_flip,
        split_mode: if args.flag_fast {
            SplitMode::Fast
        } else {
            SplitMode::Quality
        },
        scale: args.flag_scale,
        ..Default::default()
    };

    let dif = match builder.build(&config) {
        Ok(d) => d,
        Err(why) => {
            println!("Couldn't build interior: {}", why);
            exit(1);
        }
    };

    let output = match args.flag_output {
        Some(o) => PathBuf::from(o),
        None => PathBuf::from(&args.arg_file).with_extension("dif"),
    };

    if let Err(why) = dif.save(&output, &Version::with_interior(0, ty)) {
        println!("Couldn't write {}: {}", output.display(), why);
        exit(1);
    }

    println!(
        "{}: {} triangles, {} materials",
        output.display(),
        builder.triangle_count(),
        builder.materials().len()
    );
}
