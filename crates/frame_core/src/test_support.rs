use std::path::PathBuf;

use crate::headless::write_shader_binaries;

/// A fresh directory under the system temp dir holding stand-in shaders.
pub fn write_shaders(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("frame_core_tests")
        .join(format!("{name}_{}", std::process::id()));
    write_shader_binaries(&dir).unwrap();
    dir
}
