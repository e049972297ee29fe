use frame_core::StartupError;

pub type MyResult<T, E = MyReport> = core::result::Result<T, E>;

pub struct MyReport {
    inner: eyre::Report,
}
impl From<eyre::Report> for MyReport {
    fn from(report: eyre::Report) -> Self {
        Self { inner: report }
    }
}
impl From<StartupError> for MyReport {
    fn from(error: StartupError) -> Self {
        Self {
            inner: eyre::Report::new(error),
        }
    }
}
impl std::fmt::Display for MyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl std::fmt::Debug for MyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for MyReport {
    fn from(error: windows::core::Error) -> Self {
        Self {
            inner: eyre::Report::new(error),
        }
    }
}
