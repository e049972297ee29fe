use std::path::PathBuf;

use tracing::debug;

use crate::frame_renderer::DEFAULT_CLEAR_COLOR;

/// Renderer settings, built from defaults and process arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub use_warp_device: bool,
    pub debug_layer: bool,
    /// Passed to every present; 0 disables vsync.
    pub sync_interval: u32,
    pub clear_color: [f32; 4],
    pub shader_dir: PathBuf,
    pub vertex_shader: String,
    pub pixel_shader: String,
    pub window_size: (u32, u32),
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            use_warp_device: false,
            debug_layer: cfg!(debug_assertions),
            sync_interval: 1,
            clear_color: DEFAULT_CLEAR_COLOR,
            shader_dir: default_shader_dir(),
            vertex_shader: "vertex12.cso".to_owned(),
            pixel_shader: "pixel12.cso".to_owned(),
            window_size: (1280, 720),
            title: "Spinning Triangle".to_owned(),
        }
    }
}

/// `<exeDir>/shaders`, or `shaders` relative to the working directory when
/// the executable path is unknown.
pub fn default_shader_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("shaders")))
        .unwrap_or_else(|| PathBuf::from("shaders"))
}

impl RendererConfig {
    /// Builds a config from the process arguments.
    pub fn from_env() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    /// Recognizes `-warp` / `/warp`, `--no-vsync` and `--shader-dir <path>`.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            if arg.eq_ignore_ascii_case("-warp") || arg.eq_ignore_ascii_case("/warp") {
                config.use_warp_device = true;
            } else if arg == "--no-vsync" {
                config.sync_interval = 0;
            } else if arg == "--shader-dir" {
                match args.next() {
                    Some(dir) => config.shader_dir = PathBuf::from(dir),
                    None => debug!("--shader-dir given without a path"),
                }
            } else {
                debug!(%arg, "Ignoring unknown argument");
            }
        }
        config
    }

    /// Window title, marked when running on the software adapter.
    pub fn window_title(&self) -> String {
        if self.use_warp_device {
            format!("{} (WARP)", self.title)
        } else {
            self.title.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warp_flag_is_case_insensitive() {
        for flag in ["-warp", "/WARP", "-Warp"] {
            assert!(RendererConfig::from_args([flag]).use_warp_device);
        }
        assert!(!RendererConfig::from_args(["--warp"]).use_warp_device);
    }

    #[test]
    fn parses_vsync_and_shader_dir() {
        let config = RendererConfig::from_args(["--no-vsync", "--shader-dir", "C:/shaders", "extra"]);
        assert_eq!(config.sync_interval, 0);
        assert_eq!(config.shader_dir, PathBuf::from("C:/shaders"));
        assert!(!config.use_warp_device);
    }

    #[test]
    fn defaults_match_the_sample() {
        let config = RendererConfig::default();
        assert_eq!(config.window_size, (1280, 720));
        assert_eq!(config.sync_interval, 1);
        assert_eq!(config.vertex_shader, "vertex12.cso");
        assert!(config.shader_dir.ends_with("shaders"));
        assert_eq!(
            RendererConfig::from_args(["-warp"]).window_title(),
            "Spinning Triangle (WARP)"
        );
    }
}
