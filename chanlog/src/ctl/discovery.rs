// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Discovery sockets: `{base}/{pid}-{program}.socket`.

use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, OnceLock};
use tracing::debug;

pub const DEFAULT_SOCKET_DIR: &str = "/tmp/chanlog";
const SOCKET_SUFFIX: &str = ".socket";

static SOCKET_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)-(.+)\.socket$").ok());

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Socket path {0} has no parent directory")]
    NoParent(PathBuf),
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),
    #[error("Failed to access {0}: {1}")]
    Access(PathBuf, io::Error),
    #[error("Failed to create socket directory {0}: {1}")]
    CreateDir(PathBuf, io::Error),
    #[error("Failed to remove stale socket {0}: {1}")]
    RemoveStale(PathBuf, io::Error),
    #[error("Failed to read socket directory {0}: {1}")]
    ReadDir(PathBuf, io::Error),
}

/// Base name of the running executable, as invoked.
pub fn program_name() -> &'static str {
    static NAME: OnceLock<String> = OnceLock::new();
    NAME.get_or_init(|| {
        std::env::args_os()
            .next()
            .as_deref()
            .map(Path::new)
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    })
}

#[must_use]
pub fn socket_name_for(pid: u32, program: &str) -> String {
    format!("{pid}-{program}{SOCKET_SUFFIX}")
}

/// Socket file name of this process. Computed once.
pub fn socket_file_name() -> &'static str {
    static NAME: OnceLock<String> = OnceLock::new();
    NAME.get_or_init(|| socket_name_for(std::process::id(), program_name()))
}

/// Split a socket file name into pid and program name. Accepts exactly the names matching
/// `^([0-9]+)-(.+)\.socket$`; a pid that does not fit in a `u32` makes the name invalid.
#[must_use]
pub fn parse_socket_name(name: &str) -> Option<(u32, &str)> {
    let captures = SOCKET_NAME.as_ref()?.captures(name)?;
    let pid = captures.get(1)?.as_str().parse().ok()?;
    Some((pid, captures.get(2)?.as_str()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocketCandidate {
    pub path: PathBuf,
    pub pid: u32,
    pub program: String,
}

/// How a discovery attempt came out. The caller decides what ambiguity means.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    None,
    One(SocketCandidate),
    Many(Vec<SocketCandidate>),
}

impl From<Vec<SocketCandidate>> for Resolution {
    fn from(mut candidates: Vec<SocketCandidate>) -> Self {
        match candidates.len() {
            0 => Resolution::None,
            1 => Resolution::One(candidates.remove(0)),
            _ => Resolution::Many(candidates),
        }
    }
}

/// The directory holding discovery sockets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocketDir {
    base: PathBuf,
}

impl Default for SocketDir {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKET_DIR)
    }
}

impl SocketDir {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    #[must_use]
    pub fn path_for(&self, pid: u32, program: &str) -> PathBuf {
        self.base.join(socket_name_for(pid, program))
    }

    /// Socket path of this process.
    #[must_use]
    pub fn own_socket_path(&self) -> PathBuf {
        self.base.join(socket_file_name())
    }

    /// Live sockets of `program`, optionally restricted to one pid, sorted by pid.
    /// A missing base directory yields no candidates.
    pub fn discover(
        &self,
        program: &str,
        pid: Option<u32>,
    ) -> Result<Vec<SocketCandidate>, DiscoveryError> {
        let entries = match fs::read_dir(&self.base) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DiscoveryError::ReadDir(self.base.clone(), e)),
        };

        let mut candidates = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_socket() {
                continue;
            }
            let file_name = entry.file_name();
            let Some((found_pid, found_program)) =
                file_name.to_str().and_then(parse_socket_name)
            else {
                continue;
            };
            if found_program != program || pid.is_some_and(|wanted| wanted != found_pid) {
                continue;
            }
            candidates.push(SocketCandidate {
                path: entry.path(),
                pid: found_pid,
                program: found_program.to_owned(),
            });
        }
        candidates.sort_by_key(|c| c.pid);
        Ok(candidates)
    }

    pub fn resolve(&self, program: &str, pid: Option<u32>) -> Result<Resolution, DiscoveryError> {
        self.discover(program, pid).map(Resolution::from)
    }
}

/// Prepare `path` for binding: make sure its directory exists and remove a stale socket.
pub fn setup(path: &Path) -> Result<(), DiscoveryError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| DiscoveryError::NoParent(path.to_path_buf()))?;

    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(DiscoveryError::NotADirectory(dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| DiscoveryError::CreateDir(dir.to_path_buf(), e))?;
            // shared by every process on the host, like /tmp
            if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o1777)) {
                debug!("Could not open up permissions of {}: {e}", dir.display());
            }
        }
        Err(e) => return Err(DiscoveryError::Access(dir.to_path_buf(), e)),
    }

    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale socket {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DiscoveryError::RemoveStale(path.to_path_buf(), e)),
    }
}

/// Remove the socket at `path`. A socket that is already gone is not an error.
pub fn teardown(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
