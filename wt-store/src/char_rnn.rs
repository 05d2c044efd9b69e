//! Constants of the two layer character level LSTM model trained on tiny-shakespeare.

use crate::rnn::LstmLayerNames;

pub const LAYER_COUNT: usize = 2;
pub const HIDDEN_SIZE: usize = 512;
pub const DATA_SIZE: usize = HIDDEN_SIZE;
pub const VOCAB_SIZE: usize = 65;

pub const WEIGHTS_FILE: &str = "char-rnn.wts";
pub const DEFAULT_DATA_DIRS: [&str; 2] = ["data/samples/char-rnn/", "data/char-rnn/"];

pub const KERNEL_NAMES: [&str; LAYER_COUNT] = [
    "rnn_multi_rnn_cell_cell_0_basic_lstm_cell_kernel",
    "rnn_multi_rnn_cell_cell_1_basic_lstm_cell_kernel",
];
pub const BIAS_NAMES: [&str; LAYER_COUNT] = [
    "rnn_multi_rnn_cell_cell_0_basic_lstm_cell_bias",
    "rnn_multi_rnn_cell_cell_1_basic_lstm_cell_bias",
];
pub const FC_WEIGHTS_NAME: &str = "softmax_softmax_w";
pub const FC_BIAS_NAME: &str = "softmax_softmax_b";
pub const EMBEDDING_NAME: &str = "embedding";

/// Every record the model needs.
pub fn weight_names() -> Vec<&'static str> {
    KERNEL_NAMES
        .into_iter()
        .zip(BIAS_NAMES)
        .flat_map(|(kernel, bias)| [kernel, bias])
        .chain([FC_WEIGHTS_NAME, FC_BIAS_NAME, EMBEDDING_NAME])
        .collect()
}

/// Names for the LSTM records of `layer`, with converted records named `rnnwL<layer>` and `rnnbL<layer>`.
pub fn layer_names(layer: usize) -> LstmLayerNames {
    assert!(layer < LAYER_COUNT, "Layer {} out of range", layer);
    LstmLayerNames {
        kernel: KERNEL_NAMES[layer].to_owned(),
        bias: BIAS_NAMES[layer].to_owned(),
        converted_kernel: format!("rnnwL{}", layer),
        converted_bias: format!("rnnbL{}", layer),
    }
}
