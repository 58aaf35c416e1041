//! Link configuration for the vendor SBIGUDrv driver.
//!
//! Nothing is linked unless the `sbig-sdk` feature is enabled, so the
//! workspace builds on machines without the vendor driver installed.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SBIGUDRV_LIB_DIR");

    if std::env::var_os("CARGO_FEATURE_SBIG_SDK").is_none() {
        return;
    }

    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    match target_os.as_str() {
        "macos" => {
            println!("cargo:rustc-link-search=framework=/Library/Frameworks");
            println!("cargo:rustc-link-lib=framework=SBIGUDrv");
        }
        "linux" => {
            println!("cargo:rustc-link-lib=dylib=sbigudrv");
        }
        "windows" => {
            if let Ok(dir) = std::env::var("SBIGUDRV_LIB_DIR") {
                println!("cargo:rustc-link-search=native={dir}");
            }
            println!("cargo:rustc-link-lib=dylib=SBIGUDrv");
        }
        other => panic!("no SBIGUDrv link configuration for target OS {other}"),
    }
}
