use directories::ProjectDirs;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Name of the history document, relative to the working directory.
pub const HISTORY_FILE: &str = ".cli.json";

pub fn config_dir() -> io::Result<PathBuf> {
    project_dirs()?.config_dir().to_path_buf().mkdirs()
}

pub fn config_file() -> io::Result<PathBuf> {
    config_dir().map(|dir| dir.join("wog.toml"))
}

pub fn history_file() -> PathBuf {
    PathBuf::from(HISTORY_FILE)
}

fn project_dirs() -> io::Result<ProjectDirs> {
    ProjectDirs::from("", "", "wog").ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "could not determine home directory")
    })
}

trait Mkdirs: AsRef<Path> + Sized {
    fn mkdirs(self) -> io::Result<Self> {
        fs::create_dir_all(self.as_ref())?;
        Ok(self)
    }
}

impl<P: AsRef<Path>> Mkdirs for P {}
