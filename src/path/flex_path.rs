//! This module provides an immutable, normalized POSIX path string with
//! pathlib-style pure operations and thin delegation to the host filesystem.

use std::fmt;
use std::fs;
use std::io;
use std::ops::Div;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::core::{Result, utils};

/// Escape set for `file://` URIs: everything except alphanumerics, `/`, `:`
/// and the RFC 3986 unreserved marks.
const FILE_URI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b':')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// An immutable POSIX path backed by a normalized string.
///
/// Supports Linux, macOS, and other UNIX-like systems. Windows path
/// semantics are intentionally unsupported.
///
/// * **Immutable**: every operation returns a new `FlexPath`.
/// * **Normalized on construction**: `.` segments and redundant separators
///   are removed and `..` segments collapsed lexically (symlinks are not
///   resolved); the empty string is preserved as-is.
/// * **Pure vs filesystem**: operations like [`parent()`](Self::parent) or
///   [`join()`](Self::join) never touch the disk; operations like
///   [`exists()`](Self::exists) or [`mkdir()`](Self::mkdir) delegate
///   directly to the host filesystem.
///
/// ### Example
///
/// ```
/// use flex_kit::FlexPath;
///
/// let p = FlexPath::new("/home//user/./docs/../archive.tar.gz");
/// assert_eq!(p.as_str(), "/home/user/archive.tar.gz");
/// assert_eq!(p.name(), "archive.tar.gz");
/// assert_eq!(p.suffix(), ".gz");
/// assert_eq!(p.parent().as_str(), "/home/user");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlexPath {
    path: String,
}

impl FlexPath {
    /// Constructs from a string, normalizing it lexically. The empty string
    /// is preserved as-is.
    pub fn new<S: AsRef<str>>(path: S) -> Self {
        let raw = path.as_ref();
        let path = if raw.is_empty() {
            String::new()
        } else {
            utils::normalize(raw)
        };
        Self { path }
    }

    fn from_std(path: &Path) -> Self {
        Self::new(path.to_string_lossy())
    }

    /// Returns the normalized path string.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Returns the path as a standard library `Path` for interop.
    pub fn as_std_path(&self) -> &Path {
        Path::new(&self.path)
    }

    // --- representation ---------------------------------------------------

    /// Splits into components; the root (`/` or `//`) is a component of its
    /// own when present.
    pub fn parts(&self) -> Vec<&str> {
        let s = self.path.as_str();
        if s.is_empty() {
            return Vec::new();
        }
        let root_len = s.len() - s.trim_start_matches('/').len();
        let mut out = Vec::new();
        if root_len > 0 {
            out.push(&s[..root_len]);
        }
        out.extend(s.split('/').filter(|c| !c.is_empty()));
        out
    }

    /// The final path component. The root path has name `/`; the empty path
    /// has an empty name.
    pub fn name(&self) -> &str {
        let s = self.path.as_str();
        if s == "/" {
            return "/";
        }
        let t = s.trim_end_matches('/');
        if t.is_empty() {
            return "";
        }
        match t.rfind('/') {
            Some(i) => &t[i + 1..],
            None => t,
        }
    }

    /// The final component's extension, including the leading dot. Hidden
    /// files like `.bashrc` have no suffix.
    pub fn suffix(&self) -> &str {
        let n = self.name();
        if n.is_empty() || n == "/" {
            return "";
        }
        match n.rfind('.') {
            Some(i) if i > 0 => &n[i..],
            _ => "",
        }
    }

    /// All extensions of the final component (e.g. `[".tar", ".gz"]`).
    pub fn suffixes(&self) -> Vec<String> {
        let n = self.name();
        if n.is_empty() || (n.starts_with('.') && n.matches('.').count() == 1) {
            return Vec::new();
        }
        let parts: Vec<&str> = n.split('.').collect();
        if parts.len() <= 1 {
            return Vec::new();
        }
        parts[1..].iter().map(|p| format!(".{p}")).collect()
    }

    /// The final component without its last suffix.
    pub fn stem(&self) -> &str {
        let n = self.name();
        match n.rfind('.') {
            Some(i) if i > 0 => &n[..i],
            _ => n,
        }
    }

    /// The logical parent directory (pure operation). The root is its own
    /// parent; a single relative component has parent `.`.
    pub fn parent(&self) -> FlexPath {
        let s = self.path.as_str();
        if s == "/" {
            return self.clone();
        }
        let t = s.trim_end_matches('/');
        if t.is_empty() {
            return FlexPath::new(".");
        }
        match t.rfind('/') {
            None => FlexPath::new("."),
            Some(0) => FlexPath::new("/"),
            Some(i) => FlexPath::new(&t[..i]),
        }
    }

    /// All ancestors, nearest first. The root is included for absolute
    /// paths; the `.` anchor of relative paths is not.
    pub fn parents(&self) -> Vec<FlexPath> {
        let mut out = Vec::new();
        let mut current = self.clone();
        loop {
            let parent = current.parent();
            if parent.path == current.path || parent.path == "." {
                break;
            }
            out.push(parent.clone());
            current = parent;
        }
        out
    }

    /// Returns a new path with the final component replaced by `name`.
    pub fn with_name(&self, name: &str) -> Result<FlexPath> {
        if name.is_empty() || name.contains('/') {
            return Err(anyhow!("invalid name: `{name}`"));
        }
        if self.path.is_empty() || self.path == "/" {
            return Err(anyhow!("cannot replace the name of root or empty path"));
        }
        let parent = self.parent();
        if parent.path == "." {
            return Ok(FlexPath::new(name));
        }
        Ok(parent.join(name))
    }

    /// Returns a new path with the file suffix changed to `suffix` (empty
    /// removes the suffix).
    pub fn with_suffix(&self, suffix: &str) -> Result<FlexPath> {
        if !suffix.is_empty() && !suffix.starts_with('.') {
            return Err(anyhow!(
                "invalid suffix `{suffix}`: must start with '.' or be empty"
            ));
        }
        let n = self.name();
        if n.is_empty() || n == "/" {
            return Err(anyhow!("path has no name: `{self}`"));
        }
        let base = &self.path[..self.path.len() - n.len()];
        let new_name = match n.rfind('.') {
            Some(i) if i > 0 => format!("{}{suffix}", &n[..i]),
            _ => format!("{n}{suffix}"),
        };
        Ok(FlexPath::new(format!("{base}{new_name}")))
    }

    /// Returns a new path with the final component's stem replaced.
    pub fn with_stem(&self, stem: &str) -> Result<FlexPath> {
        if stem.is_empty() || stem.contains('/') {
            return Err(anyhow!("invalid stem: `{stem}`"));
        }
        let n = self.name();
        if n.is_empty() || n == "/" {
            return Err(anyhow!("path has no name: `{self}`"));
        }
        let base = &self.path[..self.path.len() - n.len()];
        let suffix = self.suffix();
        Ok(FlexPath::new(format!("{base}{stem}{suffix}")))
    }

    // --- joining / combining ---------------------------------------------

    /// Joins another path fragment using POSIX semantics: an absolute
    /// `other` replaces this path entirely.
    pub fn join<S: AsRef<str>>(&self, other: S) -> FlexPath {
        let other = other.as_ref();
        if other.is_empty() {
            return self.clone();
        }
        if other.starts_with('/') || self.path.is_empty() {
            return FlexPath::new(other);
        }
        if self.path.ends_with('/') {
            return FlexPath::new(format!("{}{other}", self.path));
        }
        FlexPath::new(format!("{}/{other}", self.path))
    }

    // --- conversions ------------------------------------------------------

    /// Returns a `file://` URI for this absolute path.
    pub fn as_uri(&self) -> Result<String> {
        if !self.is_absolute() {
            return Err(anyhow!("relative path can't be expressed as a file URI"));
        }
        Ok(format!(
            "file://{}",
            utf8_percent_encode(&self.path, FILE_URI_ESCAPE)
        ))
    }

    /// Returns the current working directory.
    pub fn cwd() -> Result<FlexPath> {
        let dir = std::env::current_dir()?;
        Ok(Self::from_std(&dir))
    }

    /// Returns the user's home directory taken from `$HOME`.
    pub fn home() -> Result<FlexPath> {
        let home = std::env::var("HOME").map_err(|_| anyhow!("HOME is not set"))?;
        Ok(FlexPath::new(home))
    }

    // --- normalization ----------------------------------------------------

    /// Expands a leading `~` to the user's home directory. `~user` forms
    /// are left untouched.
    pub fn expanduser(&self) -> Result<FlexPath> {
        if self.path == "~" {
            return Self::home();
        }
        if let Some(rest) = self.path.strip_prefix("~/") {
            return Ok(Self::home()?.join(rest));
        }
        Ok(self.clone())
    }

    /// Resolves symlinks and indirections through the filesystem.
    ///
    /// With `strict` a missing target is an error; otherwise the lexical
    /// absolute form is returned for paths that do not exist.
    pub fn resolve(&self, strict: bool) -> Result<FlexPath> {
        match fs::canonicalize(self.as_std_path()) {
            Ok(real) => Ok(Self::from_std(&real)),
            Err(err) => {
                if strict {
                    Err(anyhow!("cannot resolve {self}: {err}"))
                } else {
                    self.absolute()
                }
            }
        }
    }

    /// Returns an absolute path without resolving symlinks.
    pub fn absolute(&self) -> Result<FlexPath> {
        if self.is_absolute() {
            return Ok(self.clone());
        }
        Ok(Self::cwd()?.join(&self.path))
    }

    /// Whether the path is absolute (starts with `/`).
    pub fn is_absolute(&self) -> bool {
        self.path.starts_with('/')
    }

    /// Returns this path relative to `base`. Fails when this path is not
    /// inside `base` or the two differ in anchoring.
    pub fn relative_to<S: AsRef<str>>(&self, base: S) -> Result<FlexPath> {
        let base = FlexPath::new(base.as_ref());
        if self.is_absolute() != base.is_absolute() {
            return Err(anyhow!("{self} and {base} are on different anchors"));
        }
        let sp = self.parts();
        let bp = base.parts();
        if !sp.starts_with(&bp) {
            return Err(anyhow!("{self} is not in the subpath of {base}"));
        }
        let rest = &sp[bp.len()..];
        if rest.is_empty() {
            return Ok(FlexPath::new("."));
        }
        Ok(FlexPath::new(rest.join("/")))
    }

    pub fn is_relative_to<S: AsRef<str>>(&self, base: S) -> bool {
        self.relative_to(base).is_ok()
    }

    /// Matches the whole path string against a glob pattern (pure
    /// operation). Wildcards cross `/` boundaries here, unlike
    /// [`glob()`](Self::glob).
    pub fn matches(&self, pattern: &str) -> Result<bool> {
        let glob = GlobBuilder::new(pattern).build()?;
        Ok(glob.compile_matcher().is_match(self.path.as_str()))
    }

    // --- filesystem checks ------------------------------------------------

    /// True if the path points to an existing filesystem entry.
    pub fn exists(&self) -> bool {
        self.as_std_path().exists()
    }

    /// True if the path points to a regular file (symlinks followed).
    pub fn is_file(&self) -> bool {
        self.as_std_path().is_file()
    }

    /// True if the path points to a directory (symlinks followed).
    pub fn is_dir(&self) -> bool {
        self.as_std_path().is_dir()
    }

    /// True if the path itself is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        fs::symlink_metadata(self.as_std_path())
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn file_type(&self) -> Option<fs::FileType> {
        fs::symlink_metadata(self.as_std_path())
            .ok()
            .map(|meta| meta.file_type())
    }

    /// True if the path is a FIFO (named pipe). Missing paths are `false`.
    pub fn is_fifo(&self) -> bool {
        self.file_type().is_some_and(|t| t.is_fifo())
    }

    /// True if the path is a UNIX domain socket. Missing paths are `false`.
    pub fn is_socket(&self) -> bool {
        self.file_type().is_some_and(|t| t.is_socket())
    }

    /// True if the path is a block device. Missing paths are `false`.
    pub fn is_block_device(&self) -> bool {
        self.file_type().is_some_and(|t| t.is_block_device())
    }

    /// True if the path is a character device. Missing paths are `false`.
    pub fn is_char_device(&self) -> bool {
        self.file_type().is_some_and(|t| t.is_char_device())
    }

    // --- filesystem ops ---------------------------------------------------

    /// Creates a directory. The parent must exist.
    pub fn mkdir(&self) -> Result<()> {
        fs::create_dir(self.as_std_path())?;
        Ok(())
    }

    /// Creates a directory and all missing parents; an existing directory
    /// is not an error.
    pub fn mkdir_all(&self) -> Result<()> {
        fs::create_dir_all(self.as_std_path())?;
        Ok(())
    }

    /// Removes an empty directory.
    pub fn rmdir(&self) -> Result<()> {
        fs::remove_dir(self.as_std_path())?;
        Ok(())
    }

    /// Removes the file or symbolic link. With `missing_ok` a missing path
    /// is not an error.
    pub fn unlink(&self, missing_ok: bool) -> Result<()> {
        match fs::remove_file(self.as_std_path()) {
            Ok(()) => Ok(()),
            Err(err) if missing_ok && err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Renames this path to `target`, returning the new path. An existing
    /// `target` file is overwritten (POSIX `rename` semantics).
    pub fn rename<S: AsRef<str>>(&self, target: S) -> Result<FlexPath> {
        let target = FlexPath::new(target.as_ref());
        fs::rename(self.as_std_path(), target.as_std_path())?;
        Ok(target)
    }

    /// True if this path and `other` refer to the same file (same device
    /// and inode).
    pub fn samefile<S: AsRef<str>>(&self, other: S) -> Result<bool> {
        let a = fs::metadata(self.as_std_path())?;
        let b = fs::metadata(Path::new(other.as_ref()))?;
        Ok(a.dev() == b.dev() && a.ino() == b.ino())
    }

    /// Returns the path a symbolic link points to (not resolved).
    pub fn read_link(&self) -> Result<FlexPath> {
        Ok(Self::from_std(&fs::read_link(self.as_std_path())?))
    }

    /// Creates a symbolic link at this path pointing to `target`.
    pub fn symlink_to<S: AsRef<str>>(&self, target: S) -> Result<()> {
        std::os::unix::fs::symlink(Path::new(target.as_ref()), self.as_std_path())?;
        Ok(())
    }

    /// Creates a hard link at this path pointing to `target`.
    pub fn hardlink_to<S: AsRef<str>>(&self, target: S) -> Result<()> {
        fs::hard_link(Path::new(target.as_ref()), self.as_std_path())?;
        Ok(())
    }

    /// Changes the permission bits to `mode`.
    pub fn chmod(&self, mode: u32) -> Result<()> {
        fs::set_permissions(self.as_std_path(), fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    /// Creates the file if it does not exist. The modification time of an
    /// existing file is left unchanged.
    pub fn touch(&self) -> Result<()> {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.as_std_path())?;
        Ok(())
    }

    /// Lists directory entries, sorted.
    pub fn iterdir(&self) -> Result<Vec<FlexPath>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(self.as_std_path())? {
            out.push(Self::from_std(&entry?.path()));
        }
        out.sort();
        Ok(out)
    }

    /// Returns paths under this directory matching a glob pattern, sorted.
    ///
    /// Wildcards do not cross `/` boundaries; use `**` (or
    /// [`rglob()`](Self::rglob)) for recursive matching.
    pub fn glob(&self, pattern: &str) -> Result<Vec<FlexPath>> {
        let matcher = compile_glob(pattern)?;
        let base = PathBuf::from(&self.path);
        let mut found = Vec::new();
        collect_matches(&base, &base, &matcher, &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Recursive glob: the pattern is matched at every depth.
    pub fn rglob(&self, pattern: &str) -> Result<Vec<FlexPath>> {
        if pattern.starts_with("**/") {
            self.glob(pattern)
        } else {
            self.glob(&format!("**/{pattern}"))
        }
    }

    // --- IO and metadata --------------------------------------------------

    /// Reads the file as UTF-8 text.
    pub fn read_text(&self) -> Result<String> {
        Ok(fs::read_to_string(self.as_std_path())?)
    }

    /// Writes text to the file, replacing its contents.
    pub fn write_text(&self, data: &str) -> Result<()> {
        fs::write(self.as_std_path(), data)?;
        Ok(())
    }

    /// Reads the file as bytes.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(fs::read(self.as_std_path())?)
    }

    /// Writes bytes to the file, replacing its contents.
    pub fn write_bytes(&self, data: &[u8]) -> Result<()> {
        fs::write(self.as_std_path(), data)?;
        Ok(())
    }

    /// Performs a `stat()` call, following symlinks. Numeric owner and
    /// group ids are available through `std::os::unix::fs::MetadataExt`.
    pub fn stat(&self) -> Result<fs::Metadata> {
        Ok(fs::metadata(self.as_std_path())?)
    }

    /// Like [`stat()`](Self::stat) but does not follow symlinks.
    pub fn lstat(&self) -> Result<fs::Metadata> {
        Ok(fs::symlink_metadata(self.as_std_path())?)
    }
}

fn compile_glob(pattern: &str) -> Result<GlobSet> {
    let glob = GlobBuilder::new(pattern).literal_separator(true).build()?;
    let mut builder = GlobSetBuilder::new();
    builder.add(glob);
    Ok(builder.build()?)
}

/// Walks `dir` recursively, collecting entries whose path relative to
/// `base` matches. Symlinked directories are not followed.
fn collect_matches(
    dir: &Path,
    base: &Path,
    matcher: &GlobSet,
    found: &mut Vec<FlexPath>,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if matcher.is_match(path.strip_prefix(base)?) {
            found.push(FlexPath::from_std(&path));
        }
        if entry.file_type()?.is_dir() {
            collect_matches(&path, base, matcher, found)?;
        }
    }
    Ok(())
}

impl From<&str> for FlexPath {
    fn from(path: &str) -> Self {
        FlexPath::new(path)
    }
}

impl From<String> for FlexPath {
    fn from(path: String) -> Self {
        FlexPath::new(path)
    }
}

impl From<&Path> for FlexPath {
    fn from(path: &Path) -> Self {
        FlexPath::from_std(path)
    }
}

impl AsRef<str> for FlexPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl AsRef<Path> for FlexPath {
    fn as_ref(&self) -> &Path {
        self.as_std_path()
    }
}

impl Div<&str> for &FlexPath {
    type Output = FlexPath;

    fn div(self, rhs: &str) -> FlexPath {
        self.join(rhs)
    }
}

impl Div<&str> for FlexPath {
    type Output = FlexPath;

    fn div(self, rhs: &str) -> FlexPath {
        self.join(rhs)
    }
}

impl Div<&FlexPath> for &FlexPath {
    type Output = FlexPath;

    fn div(self, rhs: &FlexPath) -> FlexPath {
        self.join(rhs.as_str())
    }
}

impl fmt::Display for FlexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl fmt::Debug for FlexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlexPath({:?})", self.path)
    }
}
