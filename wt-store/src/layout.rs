use itertools::Itertools;
use ndarray::{ArrayView, ArrayView3, ArrayViewMut3, IxDyn};

use crate::record::WeightRecord;

/// Permute the axes of a row-major array with shape `dims`.
///
/// Axis `order[i]` of the input becomes axis `i` of the output, the result is a fresh row-major buffer.
pub fn permute_axes<T: Copy>(data: &[T], dims: &[usize], order: &[usize]) -> Vec<T> {
    permute_inner(data, dims, order, 1)
}

/// Transpose each of `blocks` consecutive `rows x cols` matrices in place.
pub fn transpose_sub_buffers<T: Copy>(data: &mut [T], blocks: usize, rows: usize, cols: usize) {
    transpose_inner(data, blocks, rows, cols, 1)
}

/// The inverse of a permutation, such that permuting by `order` and then by the inverse is the identity.
pub fn inverse_permutation(order: &[usize]) -> Vec<usize> {
    assert_valid_permutation(order, order.len());
    let mut inverse = vec![0; order.len()];
    for (i, &o) in order.iter().enumerate() {
        inverse[o] = i;
    }
    inverse
}

impl WeightRecord {
    /// Permute the axes of this record viewed with shape `dims`, see [permute_axes].
    ///
    /// The result keeps the name and type of this record and has the permuted shape.
    pub fn permute_axes(&self, dims: &[usize], order: &[usize]) -> WeightRecord {
        assert_eq!(
            dims.iter().product::<usize>(),
            self.element_count(),
            "Permute dims {:?} do not match element count of '{}' with shape {:?}",
            dims,
            self.name(),
            self.shape()
        );

        let data = permute_inner(self.bytes(), dims, order, self.element_size());
        let new_shape = order.iter().map(|&i| dims[i]).collect_vec();
        WeightRecord::from_raw(self.name(), self.tag(), self.element_size(), new_shape, data)
    }

    /// Transpose `blocks` consecutive `rows x cols` matrices, see [transpose_sub_buffers].
    pub fn transpose_blocks(&self, blocks: usize, rows: usize, cols: usize) -> WeightRecord {
        let mut result = self.clone();
        result.transpose_blocks_in_place(blocks, rows, cols);
        result
    }

    pub(crate) fn transpose_blocks_in_place(&mut self, blocks: usize, rows: usize, cols: usize) {
        assert_eq!(
            blocks * rows * cols,
            self.element_count(),
            "Cannot split '{}' with {} elements into {} blocks of {}x{}",
            self.name(),
            self.element_count(),
            blocks,
            rows,
            cols
        );
        let element_size = self.element_size();
        transpose_inner(self.bytes_mut(), blocks, rows, cols, element_size);

        // only keep the shape meaningful if it describes the blocks exactly
        if blocks == 1 && self.shape() == [rows, cols] {
            self.set_shape(vec![cols, rows]);
        } else if self.shape() == [blocks, rows, cols] {
            self.set_shape(vec![blocks, cols, rows]);
        }
    }
}

/// Like [permute_axes], with every logical element made up of `inner` consecutive items.
fn permute_inner<T: Copy>(data: &[T], dims: &[usize], order: &[usize], inner: usize) -> Vec<T> {
    assert_eq!(
        dims.len(),
        order.len(),
        "Permutation rank must match shape rank, got {:?} and {:?}",
        order,
        dims
    );
    assert_valid_permutation(order, dims.len());
    assert_eq!(
        dims.iter().product::<usize>() * inner,
        data.len(),
        "Shape {:?} does not match buffer length {}",
        dims,
        data.len()
    );

    let full_dims = dims.iter().copied().chain([inner]).collect_vec();
    let full_order = order.iter().copied().chain([dims.len()]).collect_vec();

    let view = ArrayView::from_shape(IxDyn(&full_dims), data).expect("shape was checked above");
    view.permuted_axes(IxDyn(&full_order)).iter().copied().collect_vec()
}

fn transpose_inner<T: Copy>(data: &mut [T], blocks: usize, rows: usize, cols: usize, inner: usize) {
    let block_len = rows * cols * inner;
    assert_eq!(
        blocks * block_len,
        data.len(),
        "Buffer of length {} does not hold {} blocks of {}x{}",
        data.len(),
        blocks,
        rows,
        cols
    );
    if block_len == 0 {
        return;
    }

    let mut scratch = Vec::with_capacity(block_len);
    for block in data.chunks_exact_mut(block_len) {
        scratch.clear();
        scratch.extend_from_slice(block);

        let src = ArrayView3::from_shape((rows, cols, inner), &scratch).expect("block length was checked above");
        let mut dst = ArrayViewMut3::from_shape((cols, rows, inner), block).expect("block length was checked above");
        dst.assign(&src.permuted_axes([1, 0, 2]));
    }
}

fn assert_valid_permutation(order: &[usize], rank: usize) {
    assert!(
        order.iter().all_unique(),
        "Permutation cannot contain repeated axis, got {:?}",
        order
    );
    assert!(
        order.iter().all(|&i| i < rank),
        "Permutation axis out of bounds, got {:?}",
        order
    );
}
