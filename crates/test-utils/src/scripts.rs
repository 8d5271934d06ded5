use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script called `name` into `dir`.
///
/// `body` is everything after the shebang line.
pub fn write_script(dir: &Path, name: &str, body: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(path)
}
