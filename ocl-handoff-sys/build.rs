#![allow(unreachable_code)]
use std::env;

pub fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OPENCL_LIB_DIR");

    // Without the feature nothing references the extern blocks, so there is
    // nothing to link.
    #[cfg(not(feature = "opencl"))]
    return;

    if let Some(lib_dir) = env::var_os("OPENCL_LIB_DIR") {
        println!(
            "cargo:rustc-link-search=native={}",
            std::path::Path::new(&lib_dir).display()
        );
    }

    #[cfg(target_os = "macos")]
    println!("cargo:rustc-link-lib=framework=OpenCL");
    #[cfg(not(target_os = "macos"))]
    println!("cargo:rustc-link-lib=dylib=OpenCL");
}
