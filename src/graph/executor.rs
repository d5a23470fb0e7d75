//! Graph evaluation.
//!
//! Needed blocks are discovered by walking task dependencies from the targets.
//! Layers are grouped into waves whose dependencies are all complete; every
//! needed block of a wave runs in parallel on the rayon pool. Each block is
//! computed once and dropped as soon as its last consumer has run.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD, IxDyn, Slice};
use rayon::prelude::*;
use tracing::{debug, trace};

use super::task::{BlockKey, Piece, Task};
use super::TaskGraph;
use crate::element::Element;
use crate::error::TaskError;

type Done<T> = HashMap<BlockKey, Arc<ArrayD<T>>>;

pub(crate) fn execute<T: Element>(
    graph: &TaskGraph<T>,
    targets: &[BlockKey],
) -> Result<Done<T>, TaskError> {
    let needed = needed_blocks(graph, targets)?;
    let waves = layer_waves(graph, &needed)?;
    let keep: HashSet<&BlockKey> = targets.iter().collect();
    let mut consumers = consumer_counts(graph, &needed);

    let mut done: Done<T> = HashMap::new();
    for wave in waves {
        let mut jobs: Vec<(BlockKey, &Task<T>)> = Vec::new();
        for name in &wave {
            let Some(indices) = needed.get(name) else {
                continue;
            };
            let layer = graph
                .layer(name)
                .ok_or_else(|| TaskError::MissingKey(name.clone()))?;
            debug!(layer = %name, blocks = indices.len(), "evaluating layer");
            for index in indices {
                let key = BlockKey::new(name, index.clone());
                let task = layer
                    .get(index)
                    .ok_or_else(|| TaskError::MissingKey(key.to_string()))?;
                jobs.push((key, task));
            }
        }

        let computed = jobs
            .par_iter()
            .map(|(key, task)| {
                trace!(block = %key, kind = ?task.kind(), "running task");
                let block = run_task(task, &done)?;
                Ok((key.clone(), block))
            })
            .collect::<Result<Vec<_>, TaskError>>()?;

        for (_, task) in &jobs {
            for dep in task.dependencies() {
                if let Some(left) = consumers.get_mut(dep) {
                    *left = left.saturating_sub(1);
                    if *left == 0 && !keep.contains(dep) {
                        done.remove(dep);
                    }
                }
            }
        }
        done.extend(computed);
    }
    Ok(done)
}

/// Every block reachable from `targets`, grouped by layer.
fn needed_blocks<T>(
    graph: &TaskGraph<T>,
    targets: &[BlockKey],
) -> Result<BTreeMap<String, Vec<Vec<usize>>>, TaskError> {
    let mut seen: HashSet<BlockKey> = HashSet::new();
    let mut stack: Vec<BlockKey> = targets.to_vec();
    let mut needed: BTreeMap<String, Vec<Vec<usize>>> = BTreeMap::new();

    while let Some(key) = stack.pop() {
        if !seen.insert(key.clone()) {
            continue;
        }
        let task = graph
            .get(&key)
            .ok_or_else(|| TaskError::MissingKey(key.to_string()))?;
        stack.extend(task.dependencies().into_iter().cloned());
        needed.entry(key.name).or_default().push(key.index);
    }
    Ok(needed)
}

/// Layers of `needed` grouped into waves; each wave depends only on earlier ones.
fn layer_waves<T>(
    graph: &TaskGraph<T>,
    needed: &BTreeMap<String, Vec<Vec<usize>>>,
) -> Result<Vec<Vec<String>>, TaskError> {
    let mut pending: BTreeMap<&str, BTreeSet<&str>> = needed
        .keys()
        .map(|name| {
            let deps = graph
                .layer_dependencies(name)
                .map(|deps| {
                    deps.iter()
                        .map(String::as_str)
                        .filter(|d| needed.contains_key(*d))
                        .collect()
                })
                .unwrap_or_default();
            (name.as_str(), deps)
        })
        .collect();

    let mut waves = Vec::new();
    while !pending.is_empty() {
        let ready: Vec<&str> = pending
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(name, _)| *name)
            .collect();
        if ready.is_empty() {
            let stuck: Vec<&str> = pending.keys().copied().collect();
            return Err(TaskError::Cycle(stuck.join(", ")));
        }
        for name in &ready {
            pending.remove(name);
        }
        for deps in pending.values_mut() {
            for name in &ready {
                deps.remove(name);
            }
        }
        waves.push(ready.into_iter().map(String::from).collect());
    }
    Ok(waves)
}

/// How many needed tasks read each block.
fn consumer_counts<T>(
    graph: &TaskGraph<T>,
    needed: &BTreeMap<String, Vec<Vec<usize>>>,
) -> HashMap<BlockKey, usize> {
    let mut counts = HashMap::new();
    for (name, indices) in needed {
        for index in indices {
            let Some(task) = graph.get(&BlockKey::new(name, index.clone())) else {
                continue;
            };
            for dep in task.dependencies() {
                *counts.entry(dep.clone()).or_insert(0) += 1;
            }
        }
    }
    counts
}

fn lookup<'a, T>(done: &'a Done<T>, key: &BlockKey) -> Result<&'a Arc<ArrayD<T>>, TaskError> {
    done.get(key)
        .ok_or_else(|| TaskError::MissingKey(key.to_string()))
}

fn run_task<T: Element>(task: &Task<T>, done: &Done<T>) -> Result<Arc<ArrayD<T>>, TaskError> {
    match task {
        Task::Literal(data) => Ok(Arc::clone(data)),
        Task::Fill { shape, value } => Ok(Arc::new(ArrayD::from_elem(IxDyn(shape), *value))),
        Task::Assemble { shape, parts } => assemble(shape, parts, done).map(Arc::new),
        Task::Apply { func, args, .. } => {
            let views = args
                .iter()
                .map(|key| lookup(done, key).map(|block| block.view()))
                .collect::<Result<Vec<ArrayViewD<'_, T>>, TaskError>>()?;
            func(&views).map(Arc::new)
        }
    }
}

fn assemble<T: Element>(
    shape: &[usize],
    parts: &[Piece],
    done: &Done<T>,
) -> Result<ArrayD<T>, TaskError> {
    let mut out = ArrayD::from_elem(IxDyn(shape), T::zero());

    for piece in parts {
        let src = lookup(done, &piece.source)?;
        let fits_src = piece.region.len() == src.ndim()
            && piece
                .region
                .iter()
                .zip(src.shape())
                .all(|(r, &n)| r.start <= r.end && r.end <= n);
        let fits_dst = piece.offset.len() == shape.len()
            && piece.region.len() == shape.len()
            && piece
                .offset
                .iter()
                .zip(&piece.region)
                .zip(shape)
                .all(|((&o, r), &n)| o + r.len() <= n);
        if !fits_src || !fits_dst {
            return Err(TaskError::Shape(format!(
                "piece of {} with region {:?} at {:?} does not fit {shape:?}",
                piece.source, piece.region, piece.offset
            )));
        }

        let view = src.slice_each_axis(|ax| Slice::from(piece.region[ax.axis.index()].clone()));
        out.slice_each_axis_mut(|ax| {
            let i = ax.axis.index();
            Slice::from(piece.offset[i]..piece.offset[i] + piece.region[i].len())
        })
        .assign(&view);
    }
    Ok(out)
}
