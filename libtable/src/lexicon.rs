//! Code table lexicon.
//!
//! Plain-text `.table` sources are compiled into an `fst::Map` from code to
//! an index into a list of phrase payloads. The compiled form is cached under
//! `<user_data_dir>/build/` as `lexicon.fst` plus `lexicon.bincode`; the
//! payload file also records which table files the cache was built from.
//!
//! Source format, one entry per line:
//!
//! ```text
//! # comment
//! nihao	你好	120
//! a	阿	10	a1
//! ```
//!
//! Fields are `code`, `text`, optional `weight` (default 1) and optional
//! `comment`. Tab separation is expected; whitespace is accepted when a line
//! has no tab.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fst::automaton::{Automaton, Str};
use fst::{IntoStreamer, Map, MapBuilder, Streamer};
use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::candidate::Phrase;
use crate::error::{Result, TableError};

pub const CACHE_DIR: &str = "build";
pub const INDEX_FILE: &str = "lexicon.fst";
pub const PAYLOAD_FILE: &str = "lexicon.bincode";

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> TableError + '_ {
    move |source| TableError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Identity of one `.table` file at the time a lexicon was compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStamp {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceStamp {
    /// Stamp `path` with its current metadata. Unreadable files get an empty
    /// stamp so they never match a recorded one.
    pub fn of(path: &Path) -> Self {
        let meta = fs::metadata(path).ok();
        Self {
            path: path.to_path_buf(),
            modified: meta.as_ref().and_then(|m| m.modified().ok()),
            len: meta.map_or(0, |m| m.len()),
        }
    }
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    sources: &'a [SourceStamp],
    payloads: &'a [Vec<Phrase>],
}

#[derive(Deserialize)]
struct CacheFile {
    sources: Vec<SourceStamp>,
    payloads: Vec<Vec<Phrase>>,
}

/// Collects table entries before compilation.
#[derive(Debug, Default)]
pub struct TableSource {
    entries: BTreeMap<String, Vec<Phrase>>,
}

impl TableSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>>(&mut self, code: K, phrase: Phrase) {
        self.entries.entry(code.into()).or_default().push(phrase);
    }

    /// Number of distinct codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path).map_err(io_error(path))?;
        self.add_reader(BufReader::new(file))
            .map_err(io_error(path))
    }

    /// Parse entries from `reader`, returning how many were accepted.
    pub fn add_reader<R: BufRead>(&mut self, reader: R) -> io::Result<usize> {
        let mut accepted = 0;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            match parse_line(&line) {
                Some((code, phrase)) => {
                    self.insert(code, phrase);
                    accepted += 1;
                }
                None => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('#') {
                        debug!(line = lineno + 1, "skipping malformed table entry");
                    }
                }
            }
        }
        Ok(accepted)
    }

    /// Build the searchable lexicon. Phrases under a code are ranked by
    /// descending weight, ties keeping source order.
    pub fn compile(self) -> Result<Lexicon> {
        let mut builder = MapBuilder::new(Vec::new())?;
        let mut payloads = Vec::with_capacity(self.entries.len());
        for (i, (code, mut phrases)) in self.entries.into_iter().enumerate() {
            builder.insert(&code, i as u64)?;
            phrases.sort_by(|a, b| b.weight.cmp(&a.weight));
            payloads.push(phrases);
        }
        let index = Map::new(builder.into_inner()?)?;
        Ok(Lexicon {
            index,
            payloads,
            sources: Vec::new(),
        })
    }
}

fn parse_line(line: &str) -> Option<(String, Phrase)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.trim_start().starts_with('#') {
        return None;
    }
    let fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };
    let code = *fields.first()?;
    let text = *fields.get(1)?;
    if code.is_empty() || !code.is_ascii() || text.is_empty() {
        return None;
    }
    let weight = fields
        .get(2)
        .and_then(|w| w.parse::<u32>().ok())
        .unwrap_or(1);
    let mut phrase = Phrase::new(text.nfc().collect::<String>(), weight);
    if let Some(comment) = fields.get(3).filter(|c| !c.is_empty()) {
        phrase = phrase.with_comment(*comment);
    }
    Some((code.to_string(), phrase))
}

/// Compiled code table.
pub struct Lexicon {
    index: Map<Vec<u8>>,
    payloads: Vec<Vec<Phrase>>,
    sources: Vec<SourceStamp>,
}

impl Lexicon {
    /// Compile directly from `(code, phrase)` pairs.
    pub fn from_entries<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Phrase)>,
        K: Into<String>,
    {
        let mut source = TableSource::new();
        for (code, phrase) in entries {
            source.insert(code, phrase);
        }
        source.compile()
    }

    /// Record the table files this lexicon was compiled from.
    pub fn with_sources(mut self, sources: Vec<SourceStamp>) -> Self {
        self.sources = sources;
        self
    }

    pub fn sources(&self) -> &[SourceStamp] {
        &self.sources
    }

    /// Number of distinct codes.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Phrases stored under exactly `code`.
    pub fn exact(&self, code: &str) -> &[Phrase] {
        self.index
            .get(code)
            .and_then(|idx| self.payloads.get(idx as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Candidates for `code`: exact matches first, then (when `completion`
    /// is set) entries whose code extends it, each annotated with the
    /// untyped remainder as `~rest`. Duplicated texts keep their first
    /// position.
    pub fn lookup(&self, code: &str, completion: bool, limit: usize) -> Vec<Phrase> {
        let mut seen = HashSet::new();
        let mut out: Vec<Phrase> = Vec::new();
        if code.is_empty() || limit == 0 {
            return out;
        }

        for phrase in self.exact(code) {
            if seen.insert(phrase.text.clone()) {
                out.push(phrase.clone());
            }
        }

        if completion {
            let mut extended = Vec::new();
            let matcher = Str::new(code).starts_with();
            let mut stream = self.index.search(matcher).into_stream();
            while let Some((key, idx)) = stream.next() {
                if key.len() == code.len() {
                    continue;
                }
                let rest = String::from_utf8_lossy(&key[code.len()..]).into_owned();
                let Some(phrases) = self.payloads.get(idx as usize) else {
                    continue;
                };
                for phrase in phrases {
                    extended.push(Phrase {
                        comment: Some(format!("~{rest}")),
                        ..phrase.clone()
                    });
                }
            }
            extended.sort_by(|a, b| b.weight.cmp(&a.weight));
            for phrase in extended {
                if seen.insert(phrase.text.clone()) {
                    out.push(phrase);
                }
            }
        }

        out.truncate(limit);
        out
    }

    pub fn cache_paths(user_data_dir: &Path) -> (PathBuf, PathBuf) {
        let dir = user_data_dir.join(CACHE_DIR);
        (dir.join(INDEX_FILE), dir.join(PAYLOAD_FILE))
    }

    /// Write the compiled form under `<user_data_dir>/build/`.
    pub fn save_cache(&self, user_data_dir: &Path) -> Result<()> {
        let dir = user_data_dir.join(CACHE_DIR);
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        let (index_path, payload_path) = Self::cache_paths(user_data_dir);

        fs::write(&index_path, self.index.as_fst().as_bytes()).map_err(io_error(&index_path))?;

        let file = File::create(&payload_path).map_err(io_error(&payload_path))?;
        let mut writer = BufWriter::new(file);
        let cache = CacheFileRef {
            sources: &self.sources,
            payloads: &self.payloads,
        };
        bincode::serialize_into(&mut writer, &cache)?;
        writer.flush().map_err(io_error(&payload_path))?;
        Ok(())
    }

    /// Load a cache written by `save_cache`. Returns `Ok(None)` when no cache
    /// exists yet.
    pub fn load_cache(user_data_dir: &Path) -> Result<Option<Self>> {
        let (index_path, payload_path) = Self::cache_paths(user_data_dir);
        if !index_path.is_file() || !payload_path.is_file() {
            return Ok(None);
        }

        let bytes = fs::read(&index_path).map_err(io_error(&index_path))?;
        let index = Map::new(bytes)?;

        let file = File::open(&payload_path).map_err(io_error(&payload_path))?;
        let CacheFile { sources, payloads } = bincode::deserialize_from(BufReader::new(file))?;

        if index.len() != payloads.len() {
            return Err(TableError::CacheMismatch {
                keys: index.len(),
                payloads: payloads.len(),
            });
        }
        Ok(Some(Self {
            index,
            payloads,
            sources,
        }))
    }

    /// Delete the cache files. Missing files are not an error.
    pub fn remove_cache(user_data_dir: &Path) -> Result<()> {
        let (index_path, payload_path) = Self::cache_paths(user_data_dir);
        for path in [&index_path, &payload_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(path)(e)),
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexicon")
            .field("codes", &self.payloads.len())
            .field("sources", &self.sources.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Lexicon {
        let mut source = TableSource::new();
        source
            .add_reader(
                "# sample\n\
                 a\t阿\t10\n\
                 a\t啊\t20\n\
                 ai\t爱\t30\n\
                 ai\t啊\t5\n\
                 ni\t你\t50\n\
                 nihao\t你好\t100\n\
                 \n\
                 broken-line-without-text\n"
                    .as_bytes(),
            )
            .unwrap();
        source.compile().unwrap()
    }

    #[test]
    fn exact_matches_rank_by_weight() {
        let lexicon = sample();
        let texts: Vec<_> = lexicon.exact("a").iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["啊", "阿"]);
        assert!(lexicon.exact("zz").is_empty());
    }

    #[test]
    fn completions_follow_exact_matches() {
        let lexicon = sample();
        let found = lexicon.lookup("a", true, 10);
        let texts: Vec<_> = found.iter().map(|p| p.text.as_str()).collect();
        // 啊 under "ai" is a duplicate of the exact match
        assert_eq!(texts, ["啊", "阿", "爱"]);
        assert_eq!(found[2].comment.as_deref(), Some("~i"));
        assert_eq!(found[0].comment, None);
    }

    #[test]
    fn completion_can_be_disabled_and_limited() {
        let lexicon = sample();
        assert_eq!(lexicon.lookup("n", false, 10).len(), 0);
        let found = lexicon.lookup("n", true, 1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "你好");
        assert_eq!(found[0].comment.as_deref(), Some("~ihao"));
    }

    #[test]
    fn whitespace_lines_and_comments_parse() {
        let (code, phrase) = parse_line("hao 好 7 good").unwrap();
        assert_eq!(code, "hao");
        assert_eq!(phrase.weight, 7);
        assert_eq!(phrase.comment.as_deref(), Some("good"));
        assert!(parse_line("# nihao\t你好").is_none());
        assert!(parse_line("   ").is_none());
        assert_eq!(parse_line("x\tx\tnot-a-number").unwrap().1.weight, 1);
    }

    #[test]
    fn text_is_nfc_normalized() {
        let (_, phrase) = parse_line("e\te\u{301}").unwrap();
        assert_eq!(phrase.text, "\u{e9}");
    }

    #[test]
    fn cache_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Lexicon::load_cache(dir.path()).unwrap().is_none());

        let table = dir.path().join("demo.table");
        fs::write(&table, "a\t阿\n").unwrap();
        let stamps = vec![SourceStamp::of(&table)];
        sample()
            .with_sources(stamps.clone())
            .save_cache(dir.path())
            .unwrap();
        let loaded = Lexicon::load_cache(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.exact("nihao")[0].text, "你好");
        assert_eq!(loaded.sources(), stamps.as_slice());
    }

    #[test]
    fn stamp_tracks_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("demo.table");
        fs::write(&table, "a\t阿\n").unwrap();
        let before = SourceStamp::of(&table);
        assert_eq!(before, SourceStamp::of(&table));

        fs::write(&table, "a\t阿\nai\t爱\n").unwrap();
        assert_ne!(before, SourceStamp::of(&table));

        fs::remove_file(&table).unwrap();
        let gone = SourceStamp::of(&table);
        assert_eq!(gone.modified, None);
        assert_eq!(gone.len, 0);
    }

    #[test]
    fn removing_cache_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        Lexicon::remove_cache(dir.path()).unwrap();

        sample().save_cache(dir.path()).unwrap();
        Lexicon::remove_cache(dir.path()).unwrap();
        let (index, payloads) = Lexicon::cache_paths(dir.path());
        assert!(!index.exists());
        assert!(!payloads.exists());
        assert!(Lexicon::load_cache(dir.path()).unwrap().is_none());
    }

    #[test]
    fn inconsistent_cache_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        sample().save_cache(dir.path()).unwrap();
        let (_, payload_path) = Lexicon::cache_paths(dir.path());
        let truncated = CacheFileRef {
            sources: &[],
            payloads: &[vec![Phrase::new("x", 1)]],
        };
        fs::write(&payload_path, bincode::serialize(&truncated).unwrap()).unwrap();

        assert!(matches!(
            Lexicon::load_cache(dir.path()),
            Err(TableError::CacheMismatch { keys: 4, payloads: 1 })
        ));
    }
}
