// build.rs - Build script for TrayShot
//
// Without a per-monitor-v2 manifest Windows virtualizes DPI for the process:
// EnumDisplayMonitors and GetWindowRect return scaled bounds while BitBlt copies
// physical pixels, and captures on scaled monitors come out cropped. The manifest
// and the version resource are compiled into the executable here.

use semver::Version;

const RESOURCE_SCRIPT: &str = "TrayShot.exe.rc";
const MANIFEST: &str = "TrayShot.exe.manifest";

fn main() {
    println!("cargo:rerun-if-changed={}", RESOURCE_SCRIPT);
    println!("cargo:rerun-if-changed={}", MANIFEST);

    // Resources only mean something in a Windows executable
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }

    let version = Version::parse(env!("CARGO_PKG_VERSION")).expect("Invalid version format in Cargo.toml");
    let defines = [
        format!("CARGO_PKG_VERSION=\"{}\"", version),
        format!("CARGO_PKG_VERSION_MAJOR={}", version.major),
        format!("CARGO_PKG_VERSION_MINOR={}", version.minor),
        format!("CARGO_PKG_VERSION_PATCH={}", version.patch),
    ];

    #[cfg(windows)]
    {
        if let Err(e) = embed_resource::compile(RESOURCE_SCRIPT, &defines).manifest_required() {
            panic!("Failed to compile Windows resources (DPI manifest is mandatory): {}", e);
        }
    }

    #[cfg(not(windows))]
    println!(
        "cargo:warning=Cross-compiling without embed-resource; {} and its DPI manifest are not embedded ({} defines skipped)",
        RESOURCE_SCRIPT,
        defines.len()
    );
}
