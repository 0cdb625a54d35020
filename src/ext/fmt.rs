use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
    process::Command,
};

/// Pretty path formatting: replace $HOME with ~, put quotes around if needed.
pub fn path(path: &Path) -> String {
    lazy_static::lazy_static!{
        static ref HOME: Option<PathBuf> = std::env::var_os("HOME").map(PathBuf::from);
    }
    let s = match (*HOME).as_ref().and_then(|home| path.strip_prefix(home).ok()) {
        Some(suffix) => Path::new("~").join(suffix).to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    };
    if s.contains(char::is_whitespace) { format!("'{}'", s) } else { s }
}

/// Converts a command into a single string: program and arguments separated by spaces,
/// each formatted the same way as paths.
pub fn command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|arg| path(Path::new(arg)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats duration as `HH:MM:SS.SSS`.
pub struct Duration(pub std::time::Duration);

impl Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        const IN_HOUR: u64 = 3600;
        const IN_MINUTE: u64 = 60;
        let mut seconds = self.0.as_secs();
        write!(f, "{}:", seconds / IN_HOUR)?;
        seconds %= IN_HOUR;
        write!(f, "{:02}:", seconds / IN_MINUTE)?;
        seconds %= IN_MINUTE;
        write!(f, "{:02}.{:03}", seconds, self.0.subsec_millis())
    }
}
