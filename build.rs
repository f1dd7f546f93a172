fn main() {
    // CoreBluetooth refuses to scan from a binary without an Info.plist that
    // declares NSBluetoothAlwaysUsageDescription.  A CLI tool has no bundle,
    // so link the plist into the `__TEXT,__info_plist` section instead.
    //
    // CARGO_CFG_TARGET_OS is the target, so this also applies when
    // cross-compiling for macOS.
    println!("cargo:rerun-if-changed=build.rs");
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("macos") {
        return;
    }
    let Ok(dir) = std::env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR unset, Info.plist not embedded");
        return;
    };

    for arg in ["-sectcreate", "__TEXT", "__info_plist"] {
        println!("cargo:rustc-link-arg={arg}");
    }
    println!("cargo:rustc-link-arg={dir}/Info.plist");
    println!("cargo:rerun-if-changed=Info.plist");
}
