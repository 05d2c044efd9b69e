mod utils;

mod layout;
mod rnn;
mod write;
