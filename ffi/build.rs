use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let header = PathBuf::from(&crate_dir).join("include").join("yourls.h");

    let bindings = match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("YOURLS_H")
        .generate()
    {
        Ok(bindings) => bindings,
        Err(e) => {
            println!("cargo:warning=skipping C header generation: {e}");
            return;
        }
    };

    if let Some(dir) = header.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            println!("cargo:warning=cannot create {}: {e}", dir.display());
            return;
        }
    }
    bindings.write_to_file(&header);
}
