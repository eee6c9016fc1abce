use std::collections::HashSet;

use indexmap::IndexMap;
use log::{error, info, warn};

use crate::libs::finder::{SearchParams, SingleReadFinder};
use crate::libs::graph::NodeManager;
use crate::libs::io::SequenceSource;
use crate::libs::pool::StringPool;
use crate::libs::read::{canonicalize, ReadRecord};
use crate::libs::singleton::SingletonFinder;

//----------------------------
// RunStats
//----------------------------
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub files_read: usize,
    pub files_failed: usize,
    pub reads_seen: usize,
    pub reads_matched: usize,
    pub reads_malformed: usize,
    pub singletons: usize,
}

/// Everything a run produces: the interned strings, one NodeManager
/// per canonical repeat, and counters for reporting
pub struct RunOutcome {
    pub pool: StringPool,
    pub groups: Vec<NodeManager>,
    pub stats: RunStats,
}

impl RunOutcome {
    pub fn found_nothing(&self) -> bool {
        self.groups.is_empty()
    }
}

//----------------------------
// Pipeline
//----------------------------
/// Drives the whole search: pass 1 repeat discovery and grouping by
/// canonical repeat, pass 2 singleton rescue, then graph construction,
/// variant collapsing and cleaning per group.
pub struct Pipeline {
    finder: SingleReadFinder,
}

impl Pipeline {
    /// Rejects inconsistent parameters before any input is opened
    pub fn new(params: SearchParams) -> anyhow::Result<Self> {
        params.validate()?;
        Ok(Self {
            finder: SingleReadFinder::new(params),
        })
    }

    /// Run both passes over `infiles` in order. A file that cannot be
    /// read or parsed is dropped with an error; the run continues.
    pub fn run(&self, infiles: &[String]) -> RunOutcome {
        let mut stats = RunStats::default();
        let mut grouped: IndexMap<String, Vec<ReadRecord>> = IndexMap::new();
        let mut assigned: HashSet<String> = HashSet::new();
        let mut failed: HashSet<String> = HashSet::new();

        for infile in infiles {
            match self.scan_file(infile, &mut grouped, &mut assigned, &mut stats) {
                Ok(()) => stats.files_read += 1,
                Err(e) => {
                    error!("failed to process {}: {}", infile, e);
                    stats.files_failed += 1;
                    failed.insert(infile.clone());
                }
            }
        }

        let keys: Vec<String> = grouped.keys().cloned().collect();
        if let Some(singleton) = SingletonFinder::new(&keys) {
            for infile in infiles {
                if failed.contains(infile) {
                    continue;
                }
                if let Err(e) =
                    self.rescue_file(infile, &singleton, &mut grouped, &mut assigned, &mut stats)
                {
                    // already parsed once; a failure here is unexpected
                    error!("singleton pass failed on {}: {}", infile, e);
                }
            }
        }

        let mut pool = StringPool::new();
        let mut groups: Vec<NodeManager> = Vec::new();
        for (key, records) in grouped {
            let mut manager = NodeManager::new(&key);
            for record in records {
                manager.add_read_record(record, &mut pool);
            }
            manager.collapse_variants(&pool);
            manager.clean_graph();
            info!(
                "group {}: {} reads, {} nodes, {} spacers, {} component(s)",
                manager.canonical_repeat(),
                manager.read_count(),
                manager.node_count(),
                manager.spacer_count(),
                manager.component_count()
            );
            groups.push(manager);
        }

        RunOutcome {
            pool,
            groups,
            stats,
        }
    }

    /// Pass 1 over one file
    fn scan_file(
        &self,
        infile: &str,
        grouped: &mut IndexMap<String, Vec<ReadRecord>>,
        assigned: &mut HashSet<String>,
        stats: &mut RunStats,
    ) -> anyhow::Result<()> {
        let source = SequenceSource::open(infile)?;

        let mut seen = 0usize;
        let mut matched = 0usize;
        let mut total_bases = 0usize;
        for result in source {
            let read = result?;
            seen += 1;
            if read.is_empty() {
                warn!("skipping empty read {}", read.name);
                stats.reads_malformed += 1;
                continue;
            }
            total_bases += read.len();

            if let Some(mut record) = self.finder.find(&read) {
                let key = canonicalize(&mut record);
                grouped.entry(key).or_default().push(record);
                assigned.insert(read.name.clone());
                matched += 1;
            }
        }

        let mean_len = if seen > 0 {
            total_bases as f64 / seen as f64
        } else {
            0.0
        };
        info!(
            "{}: {} reads, {} with repeats, mean length {:.1}",
            infile, seen, matched, mean_len
        );

        stats.reads_seen += seen;
        stats.reads_matched += matched;
        Ok(())
    }

    /// Pass 2 over one file: reads pass 1 did not claim may still hold
    /// a single copy of a known repeat
    fn rescue_file(
        &self,
        infile: &str,
        singleton: &SingletonFinder,
        grouped: &mut IndexMap<String, Vec<ReadRecord>>,
        assigned: &mut HashSet<String>,
        stats: &mut RunStats,
    ) -> anyhow::Result<()> {
        let source = SequenceSource::open(infile)?;

        for result in source {
            let read = result?;
            if read.is_empty() || assigned.contains(&read.name) {
                continue;
            }
            if let Some((key, record)) = singleton.find(&read) {
                grouped.entry(key).or_default().push(record);
                assigned.insert(read.name.clone());
                stats.singletons += 1;
                stats.reads_matched += 1;
            }
        }
        Ok(())
    }
}
