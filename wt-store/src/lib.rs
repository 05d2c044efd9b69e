#![warn(missing_debug_implementations)]

//! Loading of tagged binary weight containers, with tensor layout utilities.
//!
//! A container holds named records, each with an element type tag, a shape and raw little-endian data.
//! Records are loaded selectively into a [WeightStore](store::WeightStore),
//! which can then be rearranged into the layout a network builder expects.
//!
//! ```no_run
//! # use wt_store::load::load_weights;
//! # use wt_store::rnn::{convert_lstm_layer, LstmLayerNames};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // load only the records of the first layer
//! let kernel = "rnn_multi_rnn_cell_cell_0_basic_lstm_cell_kernel";
//! let bias = "rnn_multi_rnn_cell_cell_0_basic_lstm_cell_bias";
//! let mut store = load_weights("char-rnn.wts", [kernel, bias])?;
//!
//! // convert them to the gate-major layout
//! let names = LstmLayerNames::with_suffix(kernel, bias, "converted");
//! convert_lstm_layer(&mut store, &names, 512)?;
//!
//! println!("{:?}", store[names.converted_kernel.as_str()]);
//! # Ok(())
//! # }
//! ```

/// The [ndarray] crate is used for axis permutation, and re-exported for convenience.
pub use ndarray;

/// The [DType](dtype::DType) enum and raw element decoding.
pub mod dtype;
/// The [WeightRecord](record::WeightRecord) type.
pub mod record;
/// The [WeightStore](store::WeightStore) collection.
pub mod store;

/// Container file loading.
pub mod load;
/// Container file writing.
pub mod write;
/// Searching data directories for input files.
pub mod locate;

/// Generic axis permutation and block transposition.
pub mod layout;
/// LSTM weight and bias conversion.
pub mod rnn;

/// Per-tensor dynamic range files.
pub mod dynamic_range;
pub mod vocab;
pub mod char_rnn;

pub mod result;
