use hashbrown::HashMap;
use serde::Serialize;
use std::sync::Arc;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Source ID for identifying source strings.
/// Fragments of the main input are numbered `0..N-1`; included files follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceId(pub(crate) u32);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl SourceId {
    pub fn new(index: u32) -> Self {
        SourceId(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Logical position of a token: source string index, 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct SourceLocation {
    pub source_index: u32,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(source_index: u32, line: u32, column: u32) -> Self {
        SourceLocation {
            source_index,
            line,
            column,
        }
    }

    /// Location used for predefined macros and synthesized tokens.
    pub fn builtin() -> Self {
        SourceLocation::default()
    }

    pub fn is_builtin(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_index, self.line, self.column)
    }
}

/// Indicates the kind of source string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileKind {
    /// One fragment of the main input
    Fragment,
    /// A file pulled in by `#include`, either registered in memory or read from disk
    Include,
}

/// Information about one registered source string
#[derive(Debug)]
pub struct FileInfo {
    pub file_id: SourceId,
    pub name: String,
    pub path: Option<PathBuf>,
    pub(crate) text: Arc<str>,
    pub(crate) kind: FileKind,
}

impl FileInfo {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }
}

/// Owns every source string of one compilation unit.
#[derive(Default)]
pub struct SourceManager {
    file_infos: Vec<FileInfo>,
    name_to_id: HashMap<String, SourceId>,
    include_sources: HashMap<String, Arc<str>>,
    input: Vec<SourceId>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the main input as an ordered list of fragments.
    ///
    /// `lengths[i] == None` (or no `lengths` at all) means the fragment runs up to
    /// its first NUL character; `Some(n)` keeps only the first `n` bytes.
    pub fn add_input(&mut self, strings: &[&str], lengths: Option<&[Option<usize>]>) -> Vec<SourceId> {
        let ids: Vec<SourceId> = strings
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let length = lengths.and_then(|l| l.get(i).copied().flatten());
                let text = truncate_fragment(s, length);
                self.add_file_entry(Arc::from(text), format!("<string {}>", i), None, FileKind::Fragment)
            })
            .collect();
        self.input.extend(ids.iter().copied());
        ids
    }

    /// Read a file from disk and append it to the main input as one more fragment.
    pub fn add_input_file(&mut self, path: &Path) -> Result<SourceId, std::io::Error> {
        let text = std::fs::read_to_string(path)?;
        let text = truncate_fragment(&text, None);
        let id = self.add_file_entry(
            Arc::from(text),
            path.display().to_string(),
            Some(path.to_path_buf()),
            FileKind::Fragment,
        );
        self.input.push(id);
        Ok(id)
    }

    /// Register an in-memory file that `#include "name"` can find.
    pub fn add_include_source(&mut self, name: &str, text: &str) {
        self.include_sources.insert(name.to_string(), Arc::from(text));
    }

    /// Load an include by name, preferring in-memory sources, and return its id.
    /// Already loaded files are reused.
    pub(crate) fn load_include(&mut self, name: &str, resolved: Option<&Path>) -> Result<SourceId, std::io::Error> {
        if let Some(id) = self.name_to_id.get(name) {
            return Ok(*id);
        }
        if let Some(text) = self.include_sources.get(name).cloned() {
            return Ok(self.add_file_entry(text, name.to_string(), None, FileKind::Include));
        }
        let path = resolved.ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
        let text = std::fs::read_to_string(path)?;
        Ok(self.add_file_entry(
            Arc::from(text.as_str()),
            name.to_string(),
            Some(path.to_path_buf()),
            FileKind::Include,
        ))
    }

    pub(crate) fn has_include_source(&self, name: &str) -> bool {
        self.include_sources.contains_key(name) || self.name_to_id.contains_key(name)
    }

    fn add_file_entry(&mut self, text: Arc<str>, name: String, path: Option<PathBuf>, kind: FileKind) -> SourceId {
        let file_id = SourceId::new(self.file_infos.len() as u32);
        if kind == FileKind::Include {
            self.name_to_id.insert(name.clone(), file_id);
        }
        self.file_infos.push(FileInfo {
            file_id,
            name,
            path,
            text,
            kind,
        });
        file_id
    }

    /// Ids of the main input fragments, in order
    pub fn input_ids(&self) -> &[SourceId] {
        &self.input
    }

    /// Get file info for a given source ID
    pub fn get_file_info(&self, source_id: SourceId) -> Option<&FileInfo> {
        self.file_infos.get(source_id.0 as usize)
    }

    /// Build a character reader over the given source strings
    pub(crate) fn reader(&self, ids: &[SourceId]) -> Input {
        let fragments = ids
            .iter()
            .filter_map(|id| self.get_file_info(*id).map(|info| (*id, info.text.clone())))
            .collect();
        Input::new(fragments)
    }

    /// Text of one line of a source string, used to quote diagnostics
    pub fn line_text(&self, loc: SourceLocation) -> Option<&str> {
        let info = self.get_file_info(SourceId::new(loc.source_index))?;
        if loc.line == 0 {
            return None;
        }
        info.text.lines().nth(loc.line as usize - 1)
    }
}

fn truncate_fragment(s: &str, length: Option<usize>) -> &str {
    match length {
        Some(n) => {
            let mut end = n.min(s.len());
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            &s[..end]
        }
        None => match s.find('\0') {
            Some(nul) => &s[..nul],
            None => s,
        },
    }
}

/// Raw character reader that walks a list of source strings back to back.
pub struct Input {
    fragments: Vec<(SourceId, Arc<str>)>,
    index: usize,
    offset: usize,
}

impl Input {
    pub(crate) fn new(fragments: Vec<(SourceId, Arc<str>)>) -> Self {
        Input {
            fragments,
            index: 0,
            offset: 0,
        }
    }

    /// Read the next raw character and the id of the string it came from
    pub fn read(&mut self) -> Option<(char, SourceId)> {
        while let Some((id, text)) = self.fragments.get(self.index) {
            if let Some(c) = text[self.offset..].chars().next() {
                self.offset += c.len_utf8();
                return Some((c, *id));
            }
            self.index += 1;
            self.offset = 0;
        }
        None
    }

    /// Id of the first string of this reader
    pub fn first_source(&self) -> Option<SourceId> {
        self.fragments.first().map(|(id, _)| *id)
    }
}
