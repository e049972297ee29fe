use std::env;
use std::error::Error;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

const SHADERS: [(&str, &str); 2] = [("vertex12", "vs_5_0"), ("pixel12", "ps_5_0")];

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let source_dir = manifest_dir.join("shaders");
    for (stem, _) in SHADERS {
        println!("cargo:rerun-if-changed={}", source_dir.join(format!("{stem}.hlsl")).display());
    }

    if env::var("CARGO_CFG_TARGET_OS")? != "windows" {
        return Ok(());
    }

    // target/<profile>/build/<package>-<hash>/out
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let Some(built_exe_dir) = out_dir.ancestors().nth(3) else {
        println!("cargo:warning=Cannot locate the executable directory from {}", out_dir.display());
        return Ok(());
    };
    let shader_dir = built_exe_dir.join("shaders");
    std::fs::create_dir_all(&shader_dir)?;

    for (stem, profile) in SHADERS {
        compile(&source_dir, &shader_dir, stem, profile);
    }
    Ok(())
}

/// Runs `fxc`. A missing compiler only warns, since the binaries can be
/// built by hand and passed with `--shader-dir`.
fn compile(source_dir: &Path, shader_dir: &Path, stem: &str, profile: &str) {
    let source = source_dir.join(format!("{stem}.hlsl"));
    let output = shader_dir.join(format!("{stem}.cso"));
    let status = Command::new("fxc")
        .args(["/nologo", "/T", profile, "/E", "main", "/Fo"])
        .arg(&output)
        .arg(&source)
        .status();
    match status {
        Ok(status) if status.success() => {}
        Ok(status) => println!("cargo:warning=fxc exited with {status} for {}", source.display()),
        Err(e) => println!(
            "cargo:warning=fxc unavailable ({e}); run `fxc /T {profile} /E main /Fo {} {}`",
            output.display(),
            source.display()
        ),
    }
}
