use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use infinity_formats::{ResRef, SymbolTable, Table2da};
use log::{debug, warn};
use memmap2::MmapOptions;
use walkdir::WalkDir;

use crate::context::{
    ResourceAccessor, ResourceKind, ResourceStream, SymbolTableLoader, TableLoader,
};
use crate::error::EngineError;

/// Loose resource files under a game override directory, keyed by
/// lowercase `name.ext`. The first file found for a key wins.
#[derive(Debug)]
pub struct GameDirectory {
    root: PathBuf,
    files: HashMap<String, PathBuf>,
}

impl GameDirectory {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, EngineError> {
        let root = root.as_ref().to_path_buf();
        let mut paths: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();
        if paths.is_empty() && !root.is_dir() {
            return Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            )));
        }
        paths.sort();

        let mut files: HashMap<String, PathBuf> = HashMap::new();
        for path in paths {
            let Some(key) = index_key(&path) else {
                continue;
            };
            if let Some(existing) = files.get(&key) {
                debug!("{} shadowed by {}", path.display(), existing.display());
                continue;
            }
            files.insert(key, path);
        }
        debug!("indexed {} resources under {}", files.len(), root.display());
        Ok(GameDirectory { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn locate(&self, name: &str, kind: ResourceKind) -> Option<&Path> {
        let key = format!("{}.{}", name.to_ascii_lowercase(), kind.extension());
        self.files.get(&key).map(PathBuf::as_path)
    }

    /// Every indexed resource of `kind`, sorted by name.
    pub fn names(&self, kind: ResourceKind) -> Vec<ResRef> {
        let suffix = format!(".{}", kind.extension());
        let mut names: Vec<ResRef> = self
            .files
            .keys()
            .filter_map(|key| key.strip_suffix(&suffix))
            .map(ResRef::new)
            .collect();
        names.sort();
        names
    }

    fn read_text(&self, name: &str, kind: ResourceKind) -> Option<(PathBuf, Vec<u8>)> {
        let path = self.locate(name, kind)?.to_path_buf();
        match fs::read(&path) {
            Ok(bytes) => Some((path, bytes)),
            Err(err) => {
                warn!("failed to read {}: {err}", path.display());
                None
            }
        }
    }
}

fn index_key(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    ResourceKind::from_extension(ext)?;
    Some(format!(
        "{}.{}",
        stem.to_ascii_lowercase(),
        ext.to_ascii_lowercase()
    ))
}

impl ResourceAccessor for GameDirectory {
    fn open_resource(
        &self,
        name: &ResRef,
        kind: ResourceKind,
    ) -> Result<Box<dyn ResourceStream>, EngineError> {
        let path = self
            .locate(&name.as_str(), kind)
            .ok_or(EngineError::NotFound { name: *name, kind })?;
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Box::new(Cursor::new(Vec::new())));
        }
        let mmap = unsafe { MmapOptions::new().map(&file) }?;
        Ok(Box::new(Cursor::new(mmap)))
    }
}

impl SymbolTableLoader for GameDirectory {
    fn load_symbol_table(&self, name: &str) -> Option<SymbolTable> {
        let (path, bytes) = self.read_text(name, ResourceKind::Symbols)?;
        SymbolTable::parse_bytes(&bytes)
            .map_err(|err| warn!("ignoring {}: {err}", path.display()))
            .ok()
    }
}

impl TableLoader for GameDirectory {
    fn load_table(&self, name: &str) -> Option<Table2da> {
        let (path, bytes) = self.read_text(name, ResourceKind::Table)?;
        Table2da::parse_bytes(&bytes)
            .map_err(|err| warn!("ignoring {}: {err}", path.display()))
            .ok()
    }
}
