// build.rs

use chrono::Utc;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    let dest_path = Path::new(&out_dir).join("build_info.rs");

    // shown on the splash screen and in the startup log
    let build_date = Utc::now().format("%Y-%m-%d").to_string();

    fs::write(
        &dest_path,
        format!("pub const BUILD_DATE: &str = \"{}\";", build_date),
    ).expect("unable to write build_info.rs");

    println!("cargo:rerun-if-changed=build.rs");
}
