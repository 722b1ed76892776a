//! Locating external executables on the search path.

use std::{
    env,
    path::{Path, PathBuf},
};

/// Directories searched for tools: `PATH`, then the directory holding the
/// running executable, then the current working directory.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).collect())
        .unwrap_or_default();

    if let Some(exe_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }
    if let Ok(cwd) = env::current_dir() {
        dirs.push(cwd);
    }
    dirs
}

/// Return the full path of the first `name` found in `dirs`.
///
/// On Windows an `.exe` suffix is also tried.
pub fn find_in<P: AsRef<Path>>(dirs: &[P], name: &str) -> Option<PathBuf> {
    dirs.iter().find_map(|dir| {
        candidate_names(name)
            .into_iter()
            .map(|candidate| dir.as_ref().join(candidate))
            .find(|path| path.is_file())
    })
}

/// Look `name` up in [`search_dirs`].
pub fn find_executable(name: &str) -> Option<PathBuf> {
    find_in(&search_dirs(), name)
}

fn candidate_names(name: &str) -> Vec<String> {
    let mut names = vec![name.to_string()];
    if cfg!(windows) && Path::new(name).extension().is_none() {
        names.push(format!("{name}.exe"));
    }
    names
}
