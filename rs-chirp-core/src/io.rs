use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Builds the sibling path used while a file is being written.
///
/// Example:
/// `data/corpus.model` → `data/corpus.model.tmp`
pub(crate) fn temporary_path<P: AsRef<Path>>(target: P) -> io::Result<PathBuf> {
	let target = target.as_ref();

	let file_name = target
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	let mut temporary = OsString::from(file_name);
	temporary.push(".tmp");
	Ok(target.with_file_name(temporary))
}

/// Directory holding `path`, `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> &Path {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	}
}

/// Writes `bytes` to `target` so that readers see either the previous file
/// or the complete new one.
///
/// - Writes and syncs a sibling temporary file
/// - Renames it over `target`
/// - Syncs the parent directory (unix only)
pub(crate) fn write_atomic<P: AsRef<Path>>(target: P, bytes: &[u8]) -> io::Result<()> {
	let target = target.as_ref();
	let dir = parent_dir(target);
	fs::create_dir_all(dir)?;

	let temporary = temporary_path(target)?;
	let result = (|| {
		let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(&temporary)?;
		file.write_all(bytes)?;
		file.sync_all()?;
		fs::rename(&temporary, target)
	})();

	if result.is_err() {
		let _ = fs::remove_file(&temporary);
	}
	result?;

	sync_dir(dir)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
	File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
	Ok(())
}
