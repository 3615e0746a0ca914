//! Process tree node and its editing/execution API.

use crate::error::{ProcessError, ProcessResult};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A single pipeline step: a replayable function of the context.
pub type Step<C, E> = Arc<dyn Fn(&mut C) -> Result<(), E> + Send + Sync>;

/// Entry stored under a name in a [`ProcessNode`].
pub enum ProcessEntry<C, E> {
    Step(Step<C, E>),
    Node(ProcessNode<C, E>),
    /// Disabled step; keeps its slot so re-enabling restores the position.
    Skipped,
}

impl<C, E> Clone for ProcessEntry<C, E> {
    fn clone(&self) -> Self {
        match self {
            ProcessEntry::Step(step) => ProcessEntry::Step(Arc::clone(step)),
            ProcessEntry::Node(node) => ProcessEntry::Node(node.clone()),
            ProcessEntry::Skipped => ProcessEntry::Skipped,
        }
    }
}

/// Ordered tree of named steps.
pub struct ProcessNode<C, E> {
    entries: IndexMap<String, ProcessEntry<C, E>>,
}

impl<C, E> Default for ProcessNode<C, E> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<C, E> Clone for ProcessNode<C, E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<C, E> fmt::Debug for ProcessNode<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, entry) in &self.entries {
            match entry {
                ProcessEntry::Step(_) => map.entry(name, &"<step>"),
                ProcessEntry::Node(node) => map.entry(name, node),
                ProcessEntry::Skipped => map.entry(name, &"<skipped>"),
            };
        }
        map.finish()
    }
}

fn split_path(path: &str) -> ProcessResult<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if path.is_empty() || parts.iter().any(|p| p.is_empty()) {
        return Err(ProcessError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(parts)
}

impl<C, E> ProcessNode<C, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Direct children names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProcessEntry<C, E>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, path: &str) -> Option<&ProcessEntry<C, E>> {
        let parts = split_path(path).ok()?;
        let (last, parents) = parts.split_last()?;
        let mut current = self;
        for part in parents {
            current = match current.entries.get(*part)? {
                ProcessEntry::Node(node) => node,
                _ => return None,
            };
        }
        current.entries.get(*last)
    }

    pub fn node(&self, path: &str) -> ProcessResult<&ProcessNode<C, E>> {
        match self.get(path) {
            Some(ProcessEntry::Node(node)) => Ok(node),
            Some(_) => Err(ProcessError::NotANode {
                path: path.to_string(),
            }),
            None => Err(ProcessError::StepNotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Insert or replace a step at `path`, creating intermediate nodes.
    pub fn set_step<F>(&mut self, path: &str, step: F) -> ProcessResult<()>
    where
        F: Fn(&mut C) -> Result<(), E> + Send + Sync + 'static,
    {
        self.set_entry(path, ProcessEntry::Step(Arc::new(step)))
    }

    /// Insert or replace a shared step at `path`.
    pub fn set_shared_step(&mut self, path: &str, step: Step<C, E>) -> ProcessResult<()> {
        self.set_entry(path, ProcessEntry::Step(step))
    }

    /// Make sure a (possibly empty) node exists at `path`.
    ///
    /// Used to fix the position of a phase before anything is installed in it.
    pub fn ensure_node(&mut self, path: &str) -> ProcessResult<()> {
        let (parent, last) = self.parent_mut(path, true)?;
        match parent.entries.get(last) {
            Some(ProcessEntry::Node(_)) => Ok(()),
            Some(_) => Err(ProcessError::NotANode {
                path: path.to_string(),
            }),
            None => {
                parent
                    .entries
                    .insert(last.to_string(), ProcessEntry::Node(ProcessNode::new()));
                Ok(())
            }
        }
    }

    /// Disable an existing entry while keeping its position.
    pub fn skip(&mut self, path: &str) -> ProcessResult<()> {
        let (parent, last) = self.parent_mut(path, false)?;
        match parent.entries.get_mut(last) {
            Some(entry) => {
                *entry = ProcessEntry::Skipped;
                Ok(())
            }
            None => Err(ProcessError::StepNotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Same as [`ProcessNode::skip`].
    pub fn remove_step(&mut self, path: &str) -> ProcessResult<()> {
        self.skip(path)
    }

    /// Full dotted paths of every entry that would execute, in order.
    pub fn step_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, entry) in &self.entries {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            match entry {
                ProcessEntry::Step(_) => out.push(path),
                ProcessEntry::Node(node) => node.collect_paths(&path, out),
                ProcessEntry::Skipped => {}
            }
        }
    }

    /// Execute every entry in order.
    pub fn run(&self, ctx: &mut C) -> Result<(), E> {
        for (name, entry) in &self.entries {
            match entry {
                ProcessEntry::Step(step) => {
                    tracing::trace!(step = name.as_str(), "running process step");
                    step(ctx)?;
                }
                ProcessEntry::Node(node) => node.run(ctx)?,
                ProcessEntry::Skipped => {}
            }
        }
        Ok(())
    }

    /// Execute the entry at `path` (a single step or a whole subtree).
    pub fn run_path(&self, path: &str, ctx: &mut C) -> Result<(), E>
    where
        E: From<ProcessError>,
    {
        match self.get(path) {
            Some(ProcessEntry::Step(step)) => step(ctx),
            Some(ProcessEntry::Node(node)) => node.run(ctx),
            Some(ProcessEntry::Skipped) => Ok(()),
            None => Err(ProcessError::StepNotFound {
                path: path.to_string(),
            }
            .into()),
        }
    }

    fn set_entry(&mut self, path: &str, entry: ProcessEntry<C, E>) -> ProcessResult<()> {
        let (parent, last) = self.parent_mut(path, true)?;
        // IndexMap::insert keeps the slot of an existing key.
        parent.entries.insert(last.to_string(), entry);
        Ok(())
    }

    /// Walk to the node that owns the last path segment, optionally creating
    /// missing nodes on the way.
    fn parent_mut<'p>(
        &mut self,
        path: &'p str,
        create: bool,
    ) -> ProcessResult<(&mut ProcessNode<C, E>, &'p str)> {
        let parts = split_path(path)?;
        let Some((last, parents)) = parts.split_last() else {
            return Err(ProcessError::InvalidPath {
                path: path.to_string(),
            });
        };

        let mut current = self;
        for part in parents {
            if !create && !current.entries.contains_key(*part) {
                return Err(ProcessError::StepNotFound {
                    path: path.to_string(),
                });
            }
            let entry = current
                .entries
                .entry((*part).to_string())
                .or_insert_with(|| ProcessEntry::Node(ProcessNode::new()));
            current = match entry {
                ProcessEntry::Node(node) => node,
                _ => {
                    return Err(ProcessError::NotANode {
                        path: path.to_string(),
                    });
                }
            };
        }
        Ok((current, *last))
    }
}
