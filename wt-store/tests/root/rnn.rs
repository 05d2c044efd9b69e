use wt_store::char_rnn;
use wt_store::load::load_weights;
use wt_store::record::WeightRecord;
use wt_store::rnn::{convert_lstm_bias, convert_lstm_layer, convert_lstm_weights, lstm_gate_params, Gate, GatePath};
use wt_store::write::save_weights;

use crate::utils::range_vec;

#[test]
fn lstm_kernel_index_mapping() {
    let h = 4;
    let input = range_vec(8 * h * h);
    let kernel = WeightRecord::from_values("k", vec![2 * h, 4 * h], &input);

    let converted = convert_lstm_weights(&kernel, h);
    assert_eq!(converted.shape(), &[2, 4, h, h]);
    let output = converted.to_vec::<f32>().unwrap();

    for p in 0..2 {
        for g in 0..4 {
            for k in 0..h {
                for j in 0..h {
                    let dst = ((p * 4 + g) * h + k) * h + j;
                    let src = ((p * h + j) * 4 + g) * h + k;
                    assert_eq!(output[dst], input[src], "p={} g={} k={} j={}", p, g, k, j);
                }
            }
        }
    }
}

#[test]
fn lstm_bias_layout() {
    let h = 4;
    let input = range_vec(4 * h);
    let bias = WeightRecord::from_values("b", vec![4 * h], &input);

    let output = convert_lstm_bias(&bias, h).to_vec::<f32>().unwrap();
    assert_eq!(output.len(), 8 * h);
    assert_eq!(&output[..4 * h], &input[..]);
    assert!(output[4 * h..].iter().all(|&x| x == 0.0));
}

#[test]
#[should_panic]
fn kernel_size_must_match_hidden_size() {
    let kernel = WeightRecord::from_values("k", vec![8, 16], &range_vec(128));
    convert_lstm_weights(&kernel, 3);
}

#[test]
fn gate_slices_of_converted_layer() {
    let h = 3;
    let kernel = WeightRecord::from_values("k", vec![2 * h, 4 * h], &range_vec(8 * h * h));
    let bias = WeightRecord::from_values("b", vec![4 * h], &range_vec(4 * h));

    let kernel = convert_lstm_weights(&kernel, h);
    let bias = convert_lstm_bias(&bias, h);
    let params = lstm_gate_params(&kernel, &bias, h, h);

    assert_eq!(params.len(), 8);
    assert_eq!(params[0].path, GatePath::InputToHidden);
    assert_eq!(params[0].gate, Gate::Input);
    assert_eq!(params[6].path, GatePath::HiddenToHidden);
    assert_eq!(params[6].gate, Gate::Forget);

    // recurrent biases are all zero
    for p in &params[4..] {
        assert!(p.bias.to_vec::<f32>().unwrap().iter().all(|&x| x == 0.0));
    }
    assert_eq!(params[1].bias.to_vec::<f32>().unwrap(), vec![3.0, 4.0, 5.0]);
}

#[test]
fn convert_layers_from_file() {
    let h = 2;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("char-rnn.wts");

    let mut records = vec![];
    for layer in 0..char_rnn::LAYER_COUNT {
        let names = char_rnn::layer_names(layer);
        records.push(WeightRecord::from_values(names.kernel, vec![2 * h, 4 * h], &range_vec(8 * h * h)));
        records.push(WeightRecord::from_values(names.bias, vec![4 * h], &range_vec(4 * h)));
    }
    records.push(WeightRecord::from_values("unrelated", vec![1], &[0.0f32]));
    save_weights(&path, &records).unwrap();

    let mut store = load_weights(&path, char_rnn::KERNEL_NAMES.into_iter().chain(char_rnn::BIAS_NAMES)).unwrap();
    assert_eq!(store.len(), 4);

    for layer in 0..char_rnn::LAYER_COUNT {
        convert_lstm_layer(&mut store, &char_rnn::layer_names(layer), h).unwrap();
    }

    assert_eq!(store.len(), 8);
    assert_eq!(store["rnnwL0"].shape(), &[2, 4, h, h]);
    assert_eq!(store["rnnbL1"].shape(), &[2, 4, h]);
    assert_eq!(store["rnnwL1"], convert_lstm_weights(&records[2], h).renamed("rnnwL1"));
}
