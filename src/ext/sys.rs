use std::{
    io, fs,
    path::{Path, PathBuf},
    ffi::OsStr,
    process::{Command, Output},
};
use crate::{
    Error,
    err::add_path,
};

/// Finds an executable, and returns Error, if executable is not available.
pub fn find_exe(p: impl AsRef<Path>) -> Result<PathBuf, Error> {
    which::which(p.as_ref()).map_err(|_| Error::NoExec(p.as_ref().to_owned()))
}

/// Creates the directory together with missing parents, if it does not exist yet.
pub fn mkdir(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path)
    } else {
        Ok(())
    }
}

/// Returns a path with a new suffix appended to the end.
pub fn append_path(path: &Path, suffix: impl AsRef<OsStr>) -> PathBuf {
    let mut os_string = path.as_os_str().to_owned();
    os_string.push(suffix.as_ref());
    os_string.into()
}

/// Extensions, recognized as sequence files.
pub const SEQ_EXTENSIONS: [&'static str; 3] = ["fasta", "faa", "fa"];

/// Finds all sequence files in the directory (single level, no recursion).
/// Matches are concatenated extension-by-extension and are not deduplicated across extensions.
pub fn sequence_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for ext in SEQ_EXTENSIONS.iter() {
        let pattern = dir.join(format!("*.{}", ext));
        let pattern = pattern.to_str().ok_or_else(||
            Error::InvalidInput(format!("Path {} is not a valid UTF-8 string", pattern.to_string_lossy())))?;
        let matches = glob::glob(pattern).map_err(|e|
            Error::InvalidInput(format!("Cannot search for {}: {}", pattern, e)))?;
        for entry in matches {
            files.push(entry.map_err(|e| {
                let path = e.path().to_owned();
                Error::Io(e.into_error(), vec![path])
            })?);
        }
    }
    Ok(files)
}

/// Number of trailing stderr lines, kept in the subprocess error message.
const STDERR_TAIL: usize = 20;

/// Runs the command to completion and checks its exit status.
/// The command output is captured: on success it is discarded,
/// on a non-zero exit status the end of the stderr stream becomes part of the error message.
pub fn run(command: &mut Command) -> Result<(), Error> {
    let output = command.output().map_err(add_path!(!))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(subprocess_error(command, &output))
    }
}

fn subprocess_error(command: &Command, output: &Output) -> Error {
    let mut msg = format!("Command `{}` finished with {}", super::fmt::command(command), output.status);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<_> = stderr.lines().collect();
    if !lines.is_empty() {
        msg.push_str(". Stderr tail:");
        for line in &lines[lines.len().saturating_sub(STDERR_TAIL)..] {
            msg.push('\n');
            msg.push_str(line);
        }
    }
    Error::Subprocess(msg)
}
