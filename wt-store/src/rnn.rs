use crate::record::{WeightRecord, WeightView};
use crate::result::WeightResult;
use crate::store::WeightStore;

pub const GATE_COUNT: usize = 4;

/// The gates of an LSTM cell, in the order both the source and target layouts use.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Gate {
    Input,
    Cell,
    Forget,
    Output,
}

/// Which of the two matrices of a gate a weight or bias belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GatePath {
    /// Applied to the current input.
    InputToHidden,
    /// Applied to the previous hidden state.
    HiddenToHidden,
}

impl Gate {
    pub const ORDER: [Gate; GATE_COUNT] = [Gate::Input, Gate::Cell, Gate::Forget, Gate::Output];
}

impl GatePath {
    pub const ORDER: [GatePath; 2] = [GatePath::InputToHidden, GatePath::HiddenToHidden];

    pub fn is_input(self) -> bool {
        self == GatePath::InputToHidden
    }
}

/// Convert a fused LSTM kernel into eight separate gate matrices.
///
/// The input holds `2*H` rows of `4*H` values: the transposed input-to-hidden matrices
/// followed by the transposed hidden-to-hidden ones, each row holding the gates side by side.
/// The output holds, in order, `W[i], W[c], W[f], W[o], R[i], R[c], R[f], R[o]`,
/// each an `H x H` matrix with one row per hidden unit. The output shape is `[2, 4, H, H]`.
pub fn convert_lstm_weights(input: &WeightRecord, hidden_size: usize) -> WeightRecord {
    let h = hidden_size;
    assert_eq!(
        input.element_count(),
        2 * GATE_COUNT * h * h,
        "LSTM kernel '{}' with shape {:?} does not match hidden size {}",
        input.name(),
        input.shape(),
        h
    );

    // (path, in, gate, out) -> (path, out, in, gate)
    let mut result = input.permute_axes(&[2, h, GATE_COUNT, h], &[0, 3, 1, 2]);
    // -> (path, gate, out, in)
    result.transpose_blocks_in_place(2, h * h, GATE_COUNT);
    result.reshaped(vec![2, GATE_COUNT, h, h])
}

/// Convert a fused LSTM bias into separate input and recurrent biases.
///
/// The source framework already sums both biases into a single `4*H` vector, so that vector becomes the
/// input-to-hidden bias and the hidden-to-hidden bias is all zero. The output shape is `[2, 4, H]`.
pub fn convert_lstm_bias(input: &WeightRecord, hidden_size: usize) -> WeightRecord {
    let h = hidden_size;
    assert_eq!(
        input.element_count(),
        GATE_COUNT * h,
        "LSTM bias '{}' with shape {:?} does not match hidden size {}",
        input.name(),
        input.shape(),
        h
    );

    let mut data = Vec::with_capacity(2 * input.bytes().len());
    data.extend_from_slice(input.bytes());
    data.resize(2 * input.bytes().len(), 0);

    WeightRecord::from_raw(
        input.name(),
        input.tag(),
        input.element_size(),
        vec![2, GATE_COUNT, h],
        data,
    )
}

/// The weights and bias of a single gate path, ready to hand to a network builder.
#[derive(Debug, Copy, Clone)]
pub struct GateParams<'a> {
    pub path: GatePath,
    pub gate: Gate,
    pub weights: WeightView<'a>,
    pub bias: WeightView<'a>,
}

/// Split converted LSTM weights and bias into per-gate slices.
///
/// Slices are returned input-to-hidden first, each path in [Gate::ORDER].
/// Every weight slice holds `hidden_size * data_size` elements and every bias slice `hidden_size`.
pub fn lstm_gate_params<'a>(
    weights: &'a WeightRecord,
    bias: &'a WeightRecord,
    hidden_size: usize,
    data_size: usize,
) -> Vec<GateParams<'a>> {
    let weight_len = hidden_size * data_size;
    let bias_len = hidden_size;
    let slots = GatePath::ORDER.len() * GATE_COUNT;

    assert_eq!(
        weights.element_count(),
        slots * weight_len,
        "Converted LSTM kernel '{}' must hold {} gate matrices of {}x{}",
        weights.name(),
        slots,
        hidden_size,
        data_size
    );
    assert_eq!(
        bias.element_count(),
        slots * bias_len,
        "Converted LSTM bias '{}' must hold {} gate vectors of {}",
        bias.name(),
        slots,
        hidden_size
    );

    let mut result = Vec::with_capacity(slots);
    let mut weight_offset = 0;
    let mut bias_offset = 0;

    for path in GatePath::ORDER {
        for gate in Gate::ORDER {
            result.push(GateParams {
                path,
                gate,
                weights: weights.view_range(weight_offset, weight_len),
                bias: bias.view_range(bias_offset, bias_len),
            });

            weight_offset += weight_len;
            bias_offset += bias_len;
        }
    }

    result
}

/// Names of the source and converted records of a single LSTM layer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LstmLayerNames {
    pub kernel: String,
    pub bias: String,
    pub converted_kernel: String,
    pub converted_bias: String,
}

impl LstmLayerNames {
    /// Converted records are named `<source>_<suffix>`.
    pub fn with_suffix(kernel: &str, bias: &str, suffix: &str) -> Self {
        LstmLayerNames {
            kernel: kernel.to_owned(),
            bias: bias.to_owned(),
            converted_kernel: format!("{}_{}", kernel, suffix),
            converted_bias: format!("{}_{}", bias, suffix),
        }
    }
}

/// Convert one LSTM layer found in `store`, adding the converted kernel and bias as new records.
///
/// The source records are left untouched.
pub fn convert_lstm_layer(store: &mut WeightStore, names: &LstmLayerNames, hidden_size: usize) -> WeightResult<()> {
    let kernel = convert_lstm_weights(store.require(&names.kernel)?, hidden_size);
    let bias = convert_lstm_bias(store.require(&names.bias)?, hidden_size);

    log::debug!(
        "Converted LSTM layer '{}' + '{}' with hidden size {}",
        names.kernel,
        names.bias,
        hidden_size
    );

    store.insert_derived(kernel.renamed(names.converted_kernel.as_str()))?;
    store.insert_derived(bias.renamed(names.converted_bias.as_str()))?;
    Ok(())
}
