//! Block partitioning of n-dimensional arrays.

use std::ops::Range;

use crate::error::GraphError;

/// Split `n` into blocks of `chunk`, the last one possibly shorter.
///
/// `unpack_chunksize(3, 7) == [3, 3, 1]`. A chunk at least as large as `n`
/// yields a single block, so zero-length axes still have one (empty) block.
pub fn unpack_chunksize(chunk: usize, n: usize) -> Vec<usize> {
    if chunk == 0 || chunk >= n {
        return vec![n];
    }
    let mut sizes = vec![chunk; n / chunk];
    if n % chunk > 0 {
        sizes.push(n % chunk);
    }
    sizes
}

/// Row-major iteration over every index of an n-d shape.
#[derive(Clone, Debug)]
pub struct NdIndex {
    shape: Vec<usize>,
    next: Option<Vec<usize>>,
}

/// Iterate every index of `shape` in row-major order.
///
/// An empty shape yields a single empty index; any zero-length axis yields nothing.
pub fn ndindex(shape: &[usize]) -> NdIndex {
    let next = if shape.contains(&0) {
        None
    } else {
        Some(vec![0; shape.len()])
    };
    NdIndex {
        shape: shape.to_vec(),
        next,
    }
}

impl Iterator for NdIndex {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut following = current.clone();
        for axis in (0..following.len()).rev() {
            following[axis] += 1;
            if following[axis] < self.shape[axis] {
                self.next = Some(following);
                return Some(current);
            }
            following[axis] = 0;
        }
        Some(current)
    }
}

/// Block sizes along every axis of a chunked array.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Chunks(Vec<Vec<usize>>);

impl Chunks {
    pub fn new(axes: Vec<Vec<usize>>) -> Self {
        Self(axes)
    }

    /// Regular chunking of `shape` with blocks of `chunk_shape`.
    pub fn regular(shape: &[usize], chunk_shape: &[usize]) -> Result<Self, GraphError> {
        if shape.len() != chunk_shape.len() {
            return Err(GraphError::Chunks(format!(
                "chunk shape {chunk_shape:?} does not match array shape {shape:?}"
            )));
        }
        if chunk_shape.contains(&0) {
            return Err(GraphError::Chunks(format!(
                "chunk sizes must be > 0, got {chunk_shape:?}"
            )));
        }
        Ok(Self(
            shape
                .iter()
                .zip(chunk_shape)
                .map(|(&n, &c)| unpack_chunksize(c, n))
                .collect(),
        ))
    }

    pub fn axes(&self) -> &[Vec<usize>] {
        &self.0
    }

    pub fn axis(&self, axis: usize) -> &[usize] {
        &self.0[axis]
    }

    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.0.iter().map(|ax| ax.iter().sum()).collect()
    }

    /// Number of blocks along each axis.
    pub fn numblocks(&self) -> Vec<usize> {
        self.0.iter().map(Vec::len).collect()
    }

    /// Largest block size along each axis.
    pub fn chunksize(&self) -> Vec<usize> {
        self.0
            .iter()
            .map(|ax| ax.iter().copied().max().unwrap_or(0))
            .collect()
    }

    pub fn block_shape(&self, index: &[usize]) -> Vec<usize> {
        self.0.iter().zip(index).map(|(ax, &i)| ax[i]).collect()
    }

    /// Element offset of the block's first element along each axis.
    pub fn block_offset(&self, index: &[usize]) -> Vec<usize> {
        self.0
            .iter()
            .zip(index)
            .map(|(ax, &i)| ax[..i].iter().sum())
            .collect()
    }

    /// Blocks along `axis` overlapping `range`.
    ///
    /// Yields `(block, range within the block, offset within range)`.
    pub fn overlapping(&self, axis: usize, range: &Range<usize>) -> Vec<(usize, Range<usize>, usize)> {
        let mut out = Vec::new();
        let mut start = 0;
        for (block, &len) in self.0[axis].iter().enumerate() {
            let end = start + len;
            let lo = start.max(range.start);
            let hi = end.min(range.end);
            if lo < hi {
                out.push((block, lo - start..hi - start, lo - range.start));
            }
            start = end;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_chunksize() {
        assert_eq!(unpack_chunksize(3, 7), vec![3, 3, 1]);
        assert_eq!(unpack_chunksize(2, 4), vec![2, 2]);
        assert_eq!(unpack_chunksize(10, 4), vec![4]);
        assert_eq!(unpack_chunksize(4, 0), vec![0]);
    }

    #[test]
    fn test_ndindex_row_major() {
        let all: Vec<_> = ndindex(&[2, 3]).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
        assert_eq!(ndindex(&[]).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
        assert_eq!(ndindex(&[3, 0]).count(), 0);
    }

    #[test]
    fn test_regular_chunks() {
        let chunks = Chunks::regular(&[2, 10, 7], &[1, 4, 7]).unwrap();
        assert_eq!(chunks.axes(), &[vec![1, 1], vec![4, 4, 2], vec![7]]);
        assert_eq!(chunks.shape(), vec![2, 10, 7]);
        assert_eq!(chunks.numblocks(), vec![2, 3, 1]);
        assert_eq!(chunks.chunksize(), vec![1, 4, 7]);
        assert_eq!(chunks.block_shape(&[1, 2, 0]), vec![1, 2, 7]);
        assert_eq!(chunks.block_offset(&[1, 2, 0]), vec![1, 8, 0]);
    }

    #[test]
    fn test_regular_rejects_bad_chunks() {
        assert!(Chunks::regular(&[4, 4], &[0, 2]).is_err());
        assert!(Chunks::regular(&[4, 4], &[2]).is_err());
    }

    #[test]
    fn test_overlapping_blocks() {
        let chunks = Chunks::new(vec![vec![4, 4, 2]]);
        assert_eq!(
            chunks.overlapping(0, &(3..9)),
            vec![(0, 3..4, 0), (1, 0..4, 1), (2, 0..1, 5)]
        );
        assert_eq!(chunks.overlapping(0, &(4..8)), vec![(1, 0..4, 0)]);
        assert!(chunks.overlapping(0, &(5..5)).is_empty());
    }
}
