//! File resolution for `#include` and the root input.
//!
//! Every lexeme produced during a run borrows into the buffer of the file it
//! came from, so a loaded file has to stay alive (and at the same address)
//! for the whole run. The service guarantees this by caching loads per
//! canonical path and handing out clones of the same `Rc` buffers.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A resolved file: its canonical path and its full content.
#[derive(Clone, Debug)]
pub struct FileContent {
    pub path: Rc<str>,
    pub content: Rc<str>,
}

pub trait FileService {
    /// Remove the last component from a path.
    fn remove_filename(&self, path: &str) -> String;

    /// Return whether `path` names an existing regular file.
    fn file_exists(&self, path: &str) -> bool;

    /// Resolve `path` first against `cwd` (its parent directory when `cwd`
    /// names a file), then against the configured include directories, and
    /// load it. Resolving the same file twice returns the same buffers.
    fn resolve_load(&mut self, cwd: &str, path: &str) -> Option<FileContent>;
}

/// The real, disk-backed service used by the driver.
pub struct FilesystemService {
    include_dirs: Vec<PathBuf>,
    cache: HashMap<String, FileContent>,
}

impl FilesystemService {
    pub fn new(include_dirs: &[String]) -> FilesystemService {
        let mut dirs = Vec::new();
        for dir in include_dirs {
            let p = PathBuf::from(dir);
            if !p.is_dir() {
                eprintln!("\"{}\" is not a directory", dir);
                continue;
            }
            dirs.push(p);
        }
        FilesystemService {
            include_dirs: dirs,
            cache: HashMap::new(),
        }
    }

    fn load(&mut self, p: PathBuf) -> Option<FileContent> {
        let abs = fs::canonicalize(&p).ok()?;
        let key = abs.to_string_lossy().into_owned();
        if let Some(cached) = self.cache.get(&key) {
            return Some(cached.clone());
        }
        let bytes = fs::read(&abs).ok()?;
        let content: Rc<str> = Rc::from(String::from_utf8_lossy(&bytes).into_owned());
        let fcont = FileContent {
            path: Rc::from(key.as_str()),
            content,
        };
        self.cache.insert(key, fcont.clone());
        Some(fcont)
    }
}

fn is_regular_file(p: &Path) -> bool {
    fs::metadata(p).map(|m| m.is_file()).unwrap_or(false)
}

impl FileService for FilesystemService {
    fn remove_filename(&self, path: &str) -> String {
        let mut p = PathBuf::from(path);
        p.pop();
        p.to_string_lossy().into_owned()
    }

    fn file_exists(&self, path: &str) -> bool {
        is_regular_file(Path::new(path))
    }

    fn resolve_load(&mut self, cwd: &str, path: &str) -> Option<FileContent> {
        let direct = PathBuf::from(path);
        if direct.is_absolute() && is_regular_file(&direct) {
            return self.load(direct);
        }

        if !cwd.is_empty() {
            let mut p = PathBuf::from(cwd);
            if !p.is_dir() {
                p.pop();
            }
            p.push(path);
            if is_regular_file(&p) {
                return self.load(p);
            }
        }

        let mut found = None;
        for dir in &self.include_dirs {
            let p = dir.join(path);
            if is_regular_file(&p) {
                found = Some(p);
                break;
            }
        }
        found.and_then(|p| self.load(p))
    }
}

/// In-memory service for tests: files are registered up front and looked up
/// by their exact path, ignoring `cwd` and include directories.
#[derive(Default)]
pub struct MemoryFileService {
    files: HashMap<String, FileContent>,
}

impl MemoryFileService {
    pub fn new() -> MemoryFileService {
        MemoryFileService {
            files: HashMap::new(),
        }
    }

    /// Register a file. Returns false if the path is already taken.
    pub fn add_file(&mut self, path: &str, content: &str) -> bool {
        if self.files.contains_key(path) {
            return false;
        }
        self.files.insert(
            path.to_string(),
            FileContent {
                path: Rc::from(path),
                content: Rc::from(content),
            },
        );
        true
    }
}

impl FileService for MemoryFileService {
    fn remove_filename(&self, path: &str) -> String {
        match path.rfind(|c| c == '/' || c == '\\') {
            Some(off) => path[..=off].to_string(),
            None => path.to_string(),
        }
    }

    fn file_exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn resolve_load(&mut self, _cwd: &str, path: &str) -> Option<FileContent> {
        self.files.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    #[test]
    fn filesystem_service_resolution_order() {
        let root = tempfile::tempdir().unwrap();
        let incdir = root.path().join("include");
        fs::create_dir(&incdir).unwrap();

        let mut shared = fs::File::create(incdir.join("shared.uci")).unwrap();
        write!(shared, "from include dir").unwrap();
        let main = root.path().join("main.uc");
        let mut f = fs::File::create(&main).unwrap();
        write!(f, "from cwd").unwrap();
        let mut local = fs::File::create(root.path().join("shared.uci")).unwrap();
        write!(local, "local wins").unwrap();

        let mut fserv =
            FilesystemService::new(&[incdir.to_string_lossy().into_owned()]);

        // cwd naming a file resolves against its parent directory
        let hit = fserv
            .resolve_load(main.to_str().unwrap(), "shared.uci")
            .unwrap();
        assert_eq!(&*hit.content, "local wins");

        // the include dirs are the fallback
        let other = root.path().join("elsewhere");
        fs::create_dir(&other).unwrap();
        let hit = fserv
            .resolve_load(other.to_str().unwrap(), "shared.uci")
            .unwrap();
        assert_eq!(&*hit.content, "from include dir");

        assert!(fserv.resolve_load(".", "no-such-file.uci").is_none());
    }

    #[test]
    fn filesystem_service_caches_buffers() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("a.uc");
        fs::write(&path, "contents").unwrap();

        let mut fserv = FilesystemService::new(&[]);
        let first = fserv
            .resolve_load(root.path().to_str().unwrap(), "a.uc")
            .unwrap();
        let second = fserv
            .resolve_load(root.path().to_str().unwrap(), "a.uc")
            .unwrap();
        assert!(Rc::ptr_eq(&first.content, &second.content));
        assert!(fserv.file_exists(path.to_str().unwrap()));
    }

    #[test]
    fn memory_service_add_and_resolve() {
        let mut fserv = MemoryFileService::new();
        assert!(fserv.add_file("foo.uc", "class Foo;"));
        assert!(!fserv.add_file("foo.uc", "class Bar;"));
        assert!(fserv.file_exists("foo.uc"));
        assert!(!fserv.file_exists("bar.uc"));

        let a = fserv.resolve_load(".", "foo.uc").unwrap();
        let b = fserv.resolve_load("elsewhere", "foo.uc").unwrap();
        assert!(Rc::ptr_eq(&a.content, &b.content));
        assert_eq!(&*a.content, "class Foo;");
        assert!(fserv.resolve_load(".", "bar.uc").is_none());
    }

    #[test]
    fn memory_service_remove_filename() {
        let fserv = MemoryFileService::new();
        assert_eq!(fserv.remove_filename("a/b/c.uc"), "a/b/");
        assert_eq!(fserv.remove_filename("c.uc"), "c.uc");
    }
}
