use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use wt_store::layout::{inverse_permutation, permute_axes, transpose_sub_buffers};
use wt_store::record::WeightRecord;

use crate::utils::{range_vec, rng_vec};

#[test]
fn permute_then_inverse_is_identity() {
    let mut rng = StdRng::seed_from_u64(0);

    for _ in 0..32 {
        let rank = rng.gen_range(1..=5);
        let dims = (0..rank).map(|_| rng.gen_range(1..=4)).collect::<Vec<_>>();
        let mut order = (0..rank).collect::<Vec<_>>();
        order.shuffle(&mut rng);

        let len = dims.iter().product();
        let data = rng_vec(len, &mut rng);

        let permuted = permute_axes(&data, &dims, &order);
        let permuted_dims = order.iter().map(|&i| dims[i]).collect::<Vec<_>>();
        let restored = permute_axes(&permuted, &permuted_dims, &inverse_permutation(&order));

        assert_eq!(restored, data, "dims {:?} order {:?}", dims, order);
    }
}

#[test]
fn identity_permutation_copies() {
    let data = range_vec(24);
    assert_eq!(permute_axes(&data, &[2, 3, 4], &[0, 1, 2]), data);
}

#[test]
fn record_permute_matches_typed_permute() {
    let mut rng = StdRng::seed_from_u64(1);
    let dims = [3, 2, 4, 5];
    let order = [2, 0, 3, 1];
    let values = rng_vec(120, &mut rng);

    let record = WeightRecord::from_values("w", vec![120], &values);
    let permuted = record.permute_axes(&dims, &order);

    assert_eq!(permuted.shape(), &[4, 3, 5, 2]);
    assert_eq!(permuted.to_vec::<f32>().unwrap(), permute_axes(&values, &dims, &order));
}

#[test]
fn transpose_twice_is_identity() {
    let original = range_vec(3 * 4 * 5);
    let mut data = original.clone();

    transpose_sub_buffers(&mut data, 3, 4, 5);
    assert_ne!(data, original);
    transpose_sub_buffers(&mut data, 3, 5, 4);
    assert_eq!(data, original);
}

#[test]
fn fc_weights_transpose() {
    // a 2x3 matrix of f32 stored row-major becomes its 3x2 transpose
    let fc = WeightRecord::from_values("softmax_softmax_w", vec![2, 3], &range_vec(6));
    let transposed = fc.transpose_blocks(1, 2, 3);

    assert_eq!(transposed.shape(), &[3, 2]);
    assert_eq!(transposed.to_vec::<f32>().unwrap(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    assert_eq!(fc.to_vec::<f32>().unwrap(), range_vec(6));
}
