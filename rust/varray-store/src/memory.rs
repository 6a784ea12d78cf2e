//! In-memory reference implementation of the array store traits.

use std::sync::Arc;

use ahash::AHashMap;
use varray_common::{Result, verify_dim};

use crate::buffer::ValueBuffer;
use crate::store::{ArrayNode, ArrayStore, AxisSelection, ElementType};

/// An in-memory array store holding row-major dense arrays keyed by path.
///
/// This is the store implementation used by the test suites; production
/// deployments plug a disk-resident engine in behind the same traits.
#[derive(Default)]
pub struct MemoryStore {
    nodes: AHashMap<String, Arc<MemoryNode>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Adds an `i32` array under `path`.
    ///
    /// # Panics
    ///
    /// Panics if the product of `dims` does not equal `values.len()`.
    pub fn put_i32(&mut self, path: impl Into<String>, dims: Vec<usize>, values: Vec<i32>) {
        self.put(path.into(), dims, ArrayData::Int32(values));
    }

    /// Adds a byte-packed integer array (e.g. genotype call codes) under `path`.
    pub fn put_u8(&mut self, path: impl Into<String>, dims: Vec<usize>, values: Vec<u8>) {
        self.put(path.into(), dims, ArrayData::Int8(values));
    }

    /// Adds an `f64` array under `path`.
    pub fn put_f64(&mut self, path: impl Into<String>, dims: Vec<usize>, values: Vec<f64>) {
        self.put(path.into(), dims, ArrayData::Float64(values));
    }

    /// Adds a string array under `path`.
    pub fn put_utf8(&mut self, path: impl Into<String>, dims: Vec<usize>, values: Vec<String>) {
        self.put(path.into(), dims, ArrayData::Utf8(values));
    }

    fn put(&mut self, path: String, dims: Vec<usize>, data: ArrayData) {
        let total: usize = dims.iter().product();
        assert_eq!(total, data.len(), "array size must match dimensions");
        self.nodes
            .insert(path.clone(), Arc::new(MemoryNode { path, dims, data }));
    }
}

impl ArrayStore for MemoryStore {
    fn try_resolve(&self, path: &str) -> Result<Option<Arc<dyn ArrayNode>>> {
        Ok(self
            .nodes
            .get(path)
            .map(|node| node.clone() as Arc<dyn ArrayNode>))
    }
}

enum ArrayData {
    Int8(Vec<u8>),
    Int32(Vec<i32>),
    Float64(Vec<f64>),
    Utf8(Vec<String>),
}

impl ArrayData {
    fn len(&self) -> usize {
        match self {
            ArrayData::Int8(v) => v.len(),
            ArrayData::Int32(v) => v.len(),
            ArrayData::Float64(v) => v.len(),
            ArrayData::Utf8(v) => v.len(),
        }
    }
}

struct MemoryNode {
    path: String,
    dims: Vec<usize>,
    data: ArrayData,
}

impl MemoryNode {
    /// Validates a windowed selected read and invokes `emit` with the flat
    /// element index of every selected position, in row-major order.
    fn for_each_selected(
        &self,
        start: &[u64],
        count: &[usize],
        selection: &[AxisSelection<'_>],
        emit: &mut dyn FnMut(usize),
    ) -> Result<()> {
        verify_dim!(self.path, start.len() == self.dims.len());
        verify_dim!(self.path, count.len() == self.dims.len());
        verify_dim!(self.path, selection.len() == self.dims.len());
        for d in 0..self.dims.len() {
            verify_dim!(self.path, start[d] + count[d] as u64 <= self.dims[d] as u64);
            if let AxisSelection::Mask(flags) = selection[d] {
                verify_dim!(self.path, flags.len() == count[d]);
            }
        }

        let mut strides = vec![1usize; self.dims.len()];
        for d in (0..self.dims.len().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * self.dims[d + 1];
        }

        walk(0, 0, start, count, selection, &strides, emit);
        Ok(())
    }
}

fn walk(
    axis: usize,
    base: usize,
    start: &[u64],
    count: &[usize],
    selection: &[AxisSelection<'_>],
    strides: &[usize],
    emit: &mut dyn FnMut(usize),
) {
    let last = axis + 1 == count.len();
    for i in 0..count[axis] {
        if !selection[axis].is_selected(i) {
            continue;
        }
        let offset = base + (start[axis] as usize + i) * strides[axis];
        if last {
            emit(offset);
        } else {
            walk(axis + 1, offset, start, count, selection, strides, emit);
        }
    }
}

impl ArrayNode for MemoryNode {
    fn path(&self) -> &str {
        &self.path
    }

    fn dimensions(&self) -> &[usize] {
        &self.dims
    }

    fn element_type(&self) -> ElementType {
        match self.data {
            ArrayData::Int8(_) | ArrayData::Int32(_) => ElementType::Integer,
            ArrayData::Float64(_) => ElementType::Float,
            ArrayData::Utf8(_) => ElementType::String,
        }
    }

    fn total_count(&self) -> u64 {
        self.dims.iter().map(|&d| d as u64).product()
    }

    fn read_i32(&self, start: u64, out: &mut [i32]) -> Result<()> {
        let start = start as usize;
        let len = out.len();
        verify_dim!(self.path, start + len <= self.data.len());
        match &self.data {
            ArrayData::Int8(v) => {
                for (dst, src) in out.iter_mut().zip(&v[start..start + len]) {
                    *dst = *src as i32;
                }
                Ok(())
            }
            ArrayData::Int32(v) => {
                out.copy_from_slice(&v[start..start + len]);
                Ok(())
            }
            _ => Err(varray_common::error::Error::dimension(&self.path)),
        }
    }

    fn read_selected(
        &self,
        start: &[u64],
        count: &[usize],
        selection: &[AxisSelection<'_>],
        out: &mut ValueBuffer,
    ) -> Result<()> {
        match &self.data {
            ArrayData::Int8(v) => {
                let mut dst = std::mem::take(out.reset_ints());
                self.for_each_selected(start, count, selection, &mut |i| dst.push(v[i] as i32))?;
                *out = ValueBuffer::Ints(dst);
            }
            ArrayData::Int32(v) => {
                let mut dst = std::mem::take(out.reset_ints());
                self.for_each_selected(start, count, selection, &mut |i| dst.push(v[i]))?;
                *out = ValueBuffer::Ints(dst);
            }
            ArrayData::Float64(v) => {
                let mut dst = std::mem::take(out.reset_doubles());
                self.for_each_selected(start, count, selection, &mut |i| dst.push(v[i]))?;
                *out = ValueBuffer::Doubles(dst);
            }
            ArrayData::Utf8(v) => {
                let mut dst = std::mem::take(out.reset_strings());
                self.for_each_selected(start, count, selection, &mut |i| {
                    dst.push(v[i].clone())
                })?;
                *out = ValueBuffer::Strings(dst);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_matrix() -> MemoryStore {
        let mut store = MemoryStore::new();
        // 3 x 4 row-major matrix.
        store.put_i32(
            "m",
            vec![3, 4],
            vec![0, 1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23],
        );
        store
    }

    #[test]
    fn resolve_and_introspect() {
        let store = store_with_matrix();
        let node = store.resolve("m").unwrap();
        assert_eq!(node.dimensions(), &[3, 4]);
        assert_eq!(node.element_type(), ElementType::Integer);
        assert_eq!(node.total_count(), 12);
        assert!(store.try_resolve("absent").unwrap().is_none());
        assert!(store.resolve("absent").is_err());
    }

    #[test]
    fn selected_window_read() {
        let store = store_with_matrix();
        let node = store.resolve("m").unwrap();
        let mut out = ValueBuffer::default();
        node.read_selected(
            &[1, 0],
            &[2, 4],
            &[
                AxisSelection::All,
                AxisSelection::Mask(&[true, false, false, true]),
            ],
            &mut out,
        )
        .unwrap();
        assert_eq!(out.as_ints(), Some(&[10, 13, 20, 23][..]));
    }

    #[test]
    fn mask_length_must_match_window() {
        let store = store_with_matrix();
        let node = store.resolve("m").unwrap();
        let mut out = ValueBuffer::default();
        let err = node
            .read_selected(
                &[0, 0],
                &[3, 4],
                &[AxisSelection::All, AxisSelection::Mask(&[true, false])],
                &mut out,
            )
            .unwrap_err();
        assert!(err.to_string().contains("'m'"));
    }

    #[test]
    fn flat_read_widens_bytes() {
        let mut store = MemoryStore::new();
        store.put_u8("g", vec![2, 3], vec![0, 1, 2, 3, 4, 5]);
        let node = store.resolve("g").unwrap();
        let mut out = [0i32; 4];
        node.read_i32(1, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        let mut too_far = [0i32; 3];
        assert!(node.read_i32(4, &mut too_far).is_err());
    }

    #[test]
    fn string_window_read() {
        let mut store = MemoryStore::new();
        store.put_utf8(
            "chromosome",
            vec![3],
            vec!["1".into(), "X".into(), "MT".into()],
        );
        let node = store.resolve("chromosome").unwrap();
        let mut out = ValueBuffer::default();
        node.read_selected(
            &[0],
            &[3],
            &[AxisSelection::Mask(&[true, false, true])],
            &mut out,
        )
        .unwrap();
        let strings = out.as_strings().unwrap();
        assert_eq!(strings, &["1".to_string(), "MT".to_string()]);
    }
}
