//! Resolution of the external ffmpeg executable.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[cfg(windows)]
const PROGRAM: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const PROGRAM: &str = "ffmpeg";

/// Look for ffmpeg on `PATH`, then next to the running executable.
pub fn find_ffmpeg() -> Option<PathBuf> {
    let bundled_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    find_in(env::var_os("PATH").as_deref(), bundled_dir.as_deref())
}

/// Search `path_var` entries in order, falling back to `bundled_dir`.
pub(crate) fn find_in(path_var: Option<&OsStr>, bundled_dir: Option<&Path>) -> Option<PathBuf> {
    let on_path = path_var
        .map(|paths| env::split_paths(paths).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .map(|dir| dir.join(PROGRAM))
        .find(|candidate| candidate.is_file());

    on_path.or_else(|| {
        bundled_dir
            .map(|dir| dir.join(PROGRAM))
            .filter(|candidate| candidate.is_file())
    })
}
