//! The address repository: durable node tables, the candidate index and the
//! per-parent leaf partitions behind `search` and `add`.

mod resolve;

pub use resolve::NOT_ADMISSIBLE;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::RepositoryConfig;
use crate::error::Result;
use crate::index::{CandidateIndex, PartitionCache};
use crate::matching::{MatchScorer, ReferenceScorer};
use crate::models::{RepositoryNode, ROOT_ID};
use crate::storage::{ChildrenTable, ObjectTable, PartitionStore, TypeTable};

const INDEX_FILE: &str = "atree.dat";

/// Handle on a repository directory.
///
/// Single writer: every operation takes `&mut self` and blocks on disk I/O.
/// Changes become durable on [`commit`](Self::commit); call
/// [`close`](Self::close) to commit and release the tables.
pub struct AddressRepository {
    dir: PathBuf,
    config: RepositoryConfig,
    types: TypeTable,
    objects: ObjectTable,
    children: ChildrenTable,
    partitions: PartitionStore,
    cache: PartitionCache,
    index: CandidateIndex,
    scorer: Box<dyn MatchScorer>,
    dirty: bool,
    closed: bool,
}

impl AddressRepository {
    /// Open the repository in `path` with the reference scorer, creating it
    /// when missing
    pub fn open<P: AsRef<Path>>(path: P, config: RepositoryConfig) -> Result<Self> {
        Self::open_with_scorer(path, config, Box::new(ReferenceScorer::new()))
    }

    pub fn open_with_scorer<P: AsRef<Path>>(
        path: P,
        config: RepositoryConfig,
        scorer: Box<dyn MatchScorer>,
    ) -> Result<Self> {
        let dir = path.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Opening address repository at {}", dir.display());

        let mut types = TypeTable::open(&dir)?;
        let objects = ObjectTable::open(&dir)?;
        let children = ChildrenTable::open(&dir)?;

        if objects.get(ROOT_ID, &types)?.is_none() {
            objects.add(ROOT_ID, &RepositoryNode::root(), &mut types)?;
            objects.flush()?;
            info!("Created root node");
        }

        let index = CandidateIndex::load(&dir)?;
        let partitions = PartitionStore::open(&dir)?;
        let cache = PartitionCache::new(config.partition_cache_capacity);
        let max_id = objects.max_key()?;
        info!(
            "Repository ready: max id {}, {} index keys, {} types",
            max_id,
            index.len(),
            types.len()
        );

        Ok(Self {
            dir,
            config,
            types,
            objects,
            children,
            partitions,
            cache,
            index,
            scorer,
            dirty: false,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// True when there are uncommitted changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Node with its children loaded
    pub fn get_object(&self, id: u64) -> Result<Option<RepositoryNode>> {
        let Some(mut node) = self.objects.get(id, &self.types)? else {
            return Ok(None);
        };
        node.child_ids = self.children.get(id)?.unwrap_or_default();
        Ok(Some(node))
    }

    /// Children of `parent_id`, or of the root for `None`, sorted by level,
    /// spelling and id
    pub fn get_objects(&self, parent_id: Option<u64>) -> Result<Vec<RepositoryNode>> {
        let parent_id = parent_id.unwrap_or(ROOT_ID);
        let mut res = Vec::new();
        for child_id in self.children.get(parent_id)?.unwrap_or_default() {
            match self.get_object(child_id)? {
                Some(node) => res.push(node),
                None => warn!("Node {} lists missing child {}", parent_id, child_id),
            }
        }
        res.sort();
        Ok(res)
    }

    pub fn get_max_id(&self) -> Result<u64> {
        self.objects.max_key()
    }

    /// Save the candidate index and dirty partitions. No-op when clean.
    pub fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let image_path = self.dir.join(INDEX_FILE);
        {
            let file = File::create(&image_path)?;
            self.index.save(BufWriter::new(file))?;
        }
        // Continue from exactly what is on disk
        self.index = CandidateIndex::load(&self.dir)?;

        let written = self.cache.flush_dirty(&self.partitions)?;
        self.partitions.flush()?;
        self.objects.flush()?;
        self.children.flush()?;
        self.types.flush()?;
        self.cache.clear();
        self.dirty = false;

        info!(
            "Committed repository: {} index keys, {} partitions written",
            self.index.len(),
            written
        );
        Ok(())
    }

    /// Commit, then compact the object, children and partition stores
    pub fn optimize(&mut self) -> Result<()> {
        self.commit()?;
        let budget = self.config.compaction_budget;
        let objs = self.objects.optimize(budget)?;
        let chis = self.children.optimize(budget)?;
        let cobjs = self.partitions.optimize(budget)?;
        info!(
            "Optimized repository (budget {}%): objs {}, chis {}, cobjs {}",
            budget,
            compaction_word(objs),
            compaction_word(chis),
            compaction_word(cobjs)
        );
        Ok(())
    }

    /// Commit pending changes and release every table
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.commit()?;
        if self.config.optimize_on_close {
            self.optimize()?;
        }
        self.cache.clear();
        self.children.close()?;
        self.partitions.close()?;
        self.objects.close()?;
        self.types.close()?;
        info!("Closed repository at {}", self.dir.display());
        Ok(())
    }
}

impl Drop for AddressRepository {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        warn!(
            "Repository at {} dropped without close, flushing",
            self.dir.display()
        );
        if let Err(e) = self.shutdown() {
            error!("Failed to flush repository on drop: {}", e);
        }
    }
}

fn compaction_word(compacted: bool) -> &'static str {
    if compacted {
        "compacted"
    } else {
        "kept"
    }
}
