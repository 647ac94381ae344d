//! Generates the demo message types into `OUT_DIR`.

use lcm_gen::LcmGen;
use lcm_gen::config::{RustLayout, RustOptions};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    LcmGen::new()
        .add_directory("types")?
        .rust_options(RustOptions {
            output: out_dir,
            module_root: "crate::generated".to_string(),
            layout: RustLayout::Single,
            ..RustOptions::default()
        })
        .cargo_messages(true)
        .run()?;

    println!("cargo:rerun-if-changed=types");
    Ok(())
}
