//! `RimeApi` provider backed by code tables.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rime_bridge_core::api::{Capabilities, Commit, Context, RimeApi, SessionId};
use rime_bridge_core::{KeyEvent, Traits};
use tracing::{debug, info, warn};

use crate::config::TableConfig;
use crate::lexicon::{Lexicon, SourceStamp, TableSource};
use crate::session::TableSession;

pub const TABLE_EXTENSION: &str = "table";

#[derive(Debug, Default)]
pub struct TableEngine {
    traits: Option<Traits>,
    config: TableConfig,
    lexicon: Option<Lexicon>,
    sessions: HashMap<SessionId, TableSession>,
    next_session: u64,
}

impl TableEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a preloaded lexicon, skipping table discovery.
    pub fn with_lexicon(lexicon: Lexicon, config: TableConfig) -> Self {
        Self {
            config,
            lexicon: Some(lexicon),
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn lexicon(&self) -> Option<&Lexicon> {
        self.lexicon.as_ref()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// `.table` files under the shared then the user data directory, each
    /// directory sorted by file name.
    pub fn table_sources(traits: &Traits) -> Vec<PathBuf> {
        let mut sources = Vec::new();
        for dir in [&traits.shared_data_dir, &traits.user_data_dir] {
            sources.extend(list_tables(dir));
        }
        sources
    }

    /// Forget the current lexicon together with its on-disk cache, so a
    /// later start does not resurrect entries from removed tables.
    fn drop_lexicon(&mut self, user_data_dir: &Path) {
        self.lexicon = None;
        if let Err(e) = Lexicon::remove_cache(user_data_dir) {
            warn!(error = %e, "failed to remove lexicon cache");
        }
    }

    fn compile(sources: &[PathBuf]) -> Option<Lexicon> {
        let mut table = TableSource::new();
        for path in sources {
            match table.add_file(path) {
                Ok(count) => debug!(path = %path.display(), count, "loaded table"),
                Err(e) => warn!(error = %e, "skipping unreadable table"),
            }
        }
        if table.is_empty() {
            return None;
        }
        match table.compile() {
            Ok(lexicon) => Some(lexicon),
            Err(e) => {
                warn!(error = %e, "failed to compile tables");
                None
            }
        }
    }
}

fn list_tables(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut tables: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == TABLE_EXTENSION)
        })
        .collect();
    tables.sort();
    tables
}

impl RimeApi for TableEngine {
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn setup(&mut self, traits: &Traits) {
        debug!(app = %traits.app_name, "table engine setup");
        self.traits = Some(traits.clone());
    }

    fn initialize(&mut self, traits: &Traits) {
        if let Err(e) = fs::create_dir_all(&traits.user_data_dir) {
            warn!(
                error = %e,
                dir = %traits.user_data_dir.display(),
                "cannot create user data directory"
            );
        }

        let dirs = [&traits.user_data_dir, &traits.shared_data_dir];
        self.config = match TableConfig::discover(&dirs) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "using default table config");
                TableConfig::default()
            }
        };

        if self.lexicon.is_none() {
            match Lexicon::load_cache(&traits.user_data_dir) {
                Ok(Some(lexicon)) => {
                    debug!(codes = lexicon.len(), "loaded lexicon cache");
                    self.lexicon = Some(lexicon);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "ignoring lexicon cache"),
            }
        }
        self.traits = Some(traits.clone());
    }

    fn finalize(&mut self) {
        self.sessions.clear();
        self.lexicon = None;
        self.traits = None;
    }

    fn start_maintenance(&mut self, full_check: bool) -> bool {
        let Some(traits) = self.traits.as_ref() else {
            return false;
        };
        let user_data_dir = traits.user_data_dir.clone();
        let sources = Self::table_sources(traits);
        if sources.is_empty() {
            warn!(
                shared = %traits.shared_data_dir.display(),
                user = %user_data_dir.display(),
                "no .table files found"
            );
            self.drop_lexicon(&user_data_dir);
            return false;
        }

        let stamps: Vec<SourceStamp> = sources.iter().map(|p| SourceStamp::of(p)).collect();
        let fresh = self
            .lexicon
            .as_ref()
            .is_some_and(|lexicon| lexicon.sources() == stamps.as_slice());
        if !full_check && fresh {
            debug!("lexicon cache is up to date");
            return false;
        }

        let Some(lexicon) = Self::compile(&sources) else {
            self.drop_lexicon(&user_data_dir);
            return false;
        };
        let lexicon = lexicon.with_sources(stamps);
        info!(tables = sources.len(), codes = lexicon.len(), "compiled lexicon");
        if let Err(e) = lexicon.save_cache(&user_data_dir) {
            warn!(error = %e, "failed to write lexicon cache");
        }
        self.lexicon = Some(lexicon);
        true
    }

    fn create_session(&mut self) -> Option<SessionId> {
        self.next_session += 1;
        let id = SessionId::new(self.next_session);
        self.sessions.insert(id, TableSession::new(&self.config));
        Some(id)
    }

    fn destroy_session(&mut self, session: SessionId) -> bool {
        self.sessions.remove(&session).is_some()
    }

    fn find_session(&self, session: SessionId) -> bool {
        self.sessions.contains_key(&session)
    }

    fn process_key(&mut self, session: SessionId, key: KeyEvent) -> bool {
        let Some(state) = self.sessions.get_mut(&session) else {
            return false;
        };
        state.process_key(key, self.lexicon.as_ref(), &self.config)
    }

    fn get_commit(&self, session: SessionId) -> Option<Commit> {
        self.sessions.get(&session)?.commit()
    }

    fn free_commit(&self, commit: &mut Commit) -> bool {
        commit.text = None;
        true
    }

    fn get_context(&self, session: SessionId) -> Option<Context> {
        let state = self.sessions.get(&session)?;
        Some(state.context(&self.config))
    }

    fn free_context(&self, context: &mut Context) -> bool {
        *context = Context::default();
        true
    }
}
