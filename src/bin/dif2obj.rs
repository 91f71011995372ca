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

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::exit;

use difforge::{
    dif::Dif,
    mesh::{interior_triangles, obj::write_obj},
};

use docopt::Docopt;

#[derive(Deserialize)]
struct Args {
    arg_file: String,
    flag_output: Option<String>,
    flag_interior: usize,
    flag_h: bool,
    flag_help: bool,
    flag_version: bool,
}

const USAGE: &'static str = "
Usage: dif2obj [options] <file>

Options:
    -o, --output=<out>  Write to <out> instead of <file> with a .obj extension.
        --interior=<n>  Index of the interior to export. [default: 0]

    -h, --help          Show this message and exit.
        --version       Print version information and exit.
";

const VERSION: &'static str = "
dif2obj 0.1
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

    let (dif, _) = match Dif::load(&args.arg_file) {
        Ok(d) => d,
        Err(why) => {
            println!("Couldn't load {}: {}", args.arg_file, why);
            exit(1);
        }
    };

    let interior = match dif.interiors.get(args.flag_interior) {
        Some(i) => i,
        None => {
            println!(
                "{} has {} interiors, no interior {}",
                args.arg_file,
                dif.interiors.len(),
                args.flag_interior
            );
            exit(1);
        }
    };

    let triangles = match interior_triangles(interior) {
        Ok(t) => t,
        Err(why) => {
            println!("Couldn't read interior {}: {}", args.flag_interior, why);
            exit(1);
        }
    };

    let output = match args.flag_output {
        Some(o) => PathBuf::from(o),
        None => PathBuf::from(&args.arg_file).with_extension("obj"),
    };

    let file = match File::create(&output) {
        Ok(f) => f,
        Err(why) => {
            println!("Couldn't open {}: {}", output.display(), why);
            exit(1);
        }
    };

    if let Err(why) = write_obj(&mut BufWriter::new(file), &triangles) {
        println!("Couldn't write to {}: {}", output.display(), why);
        exit(1);
    }
}
