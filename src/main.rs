// Copyright 2020 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::env;
use std::error::Error as _;
use std::path::Path;
use std::process::ExitCode;

use fcmp::files::compress_file;
use fcmp::files::decompress_file;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let progname = args.first().copied().unwrap_or("fcmp");

    let result = match args.get(1..).unwrap_or_default() {
        ["compress", path] => compress_file(Path::new(path)),
        ["decompress", path] => decompress_file(Path::new(path)),
        ["image", _] => {
            eprintln!("error: image recompression is not supported by this build");
            return ExitCode::from(1);
        }
        _ => {
            print_usage(progname);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let mut message = err.to_string();
            let mut cause = err.source();
            while let Some(inner) = cause {
                message.push_str(": ");
                message.push_str(&inner.to_string());
                cause = inner.source();
            }
            eprintln!("error: {}", message);
            ExitCode::from(1)
        }
    }
}

fn print_usage(progname: &str) {
    eprintln!("incorrect arguments");
    eprintln!("usage: {} compress <path>", progname);
    eprintln!("       {} decompress <path>", progname);
    eprintln!("       {} image <path>", progname);
}
