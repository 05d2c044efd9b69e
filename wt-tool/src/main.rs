use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;
use itertools::Itertools;

use wt_store::load::{scan_headers, WeightLoader};
use wt_store::locate::locate_file;
use wt_store::result::{WeightError, WeightResult};
use wt_store::rnn::{convert_lstm_layer, LstmLayerNames};
use wt_store::write::save_weights;

#[derive(Debug, clap::Parser)]
#[clap(name = "wt", about = "Inspect and convert tagged weight containers")]
struct Args {
    /// Directories to search for input files, in order.
    #[clap(long = "data-dir", global = true, default_value = ".")]
    data_dirs: Vec<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// List every record header without reading any data.
    List { file: PathBuf },

    /// Print the first values of a single record.
    Show {
        file: PathBuf,
        name: String,
        #[clap(short, long, default_value_t = 16)]
        limit: usize,
    },

    /// Convert fused LSTM kernels and biases and write them to a new container.
    ConvertLstm {
        input: PathBuf,
        output: PathBuf,
        #[clap(long)]
        hidden_size: usize,
        /// Kernel and bias record names of a layer, as `kernel:bias`.
        #[clap(long = "layer", value_parser = parse_layer, required = true)]
        layers: Vec<(String, String)>,
        #[clap(long, default_value = "converted")]
        suffix: String,
    },
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        exit(1);
    }
}

fn run(args: Args) -> WeightResult<()> {
    let Args { data_dirs, command } = args;

    match command {
        Command::List { file } => list(&resolve(&file, &data_dirs)?),
        Command::Show { file, name, limit } => show(&resolve(&file, &data_dirs)?, &name, limit),
        Command::ConvertLstm {
            input,
            output,
            hidden_size,
            layers,
            suffix,
        } => {
            let layers = layers
                .iter()
                .map(|(kernel, bias)| LstmLayerNames::with_suffix(kernel, bias, &suffix))
                .collect_vec();
            convert_lstm(&resolve(&input, &data_dirs)?, &output, hidden_size, &layers)
        }
    }
}

/// Use `file` as given if it exists, otherwise search the data directories.
fn resolve(file: &Path, data_dirs: &[PathBuf]) -> WeightResult<PathBuf> {
    if file.is_file() {
        return Ok(file.to_owned());
    }
    locate_file(file, data_dirs)
}

fn parse_layer(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((kernel, bias)) if !kernel.is_empty() && !bias.is_empty() => Ok((kernel.to_owned(), bias.to_owned())),
        _ => Err(format!("expected 'kernel:bias', got '{}'", s)),
    }
}

fn list(path: &Path) -> WeightResult<()> {
    let headers = scan_headers(path)?;

    println!("{:<48} {:<6} {:<20} {:>10} {:>12}", "name", "type", "shape", "elements", "offset");
    for header in &headers {
        let ty = match header.dtype() {
            Some(dtype) => dtype.to_string(),
            None => format!("tag{}", header.tag),
        };
        let shape = format!("({})", header.shape.iter().join(","));
        println!(
            "{:<48} {:<6} {:<20} {:>10} {:>12}",
            header.name,
            ty,
            shape,
            header.element_count(),
            header.data_offset
        );
    }

    Ok(())
}

fn show(path: &Path, name: &str, limit: usize) -> WeightResult<()> {
    let mut loader = WeightLoader::from_path(path)?;
    loader.request([name]);
    let store = loader.load()?;
    let record = store.require(name)?;

    println!("{:?}", record);
    match record.values() {
        Some(values) => {
            let values = values.take(limit).collect_vec();
            let more = if record.element_count() > values.len() { ", ..." } else { "" };
            println!("[{}{}]", values.iter().join(", "), more);
        }
        None => {
            let bytes = &record.bytes()[..record.bytes().len().min(limit)];
            println!("raw bytes: {:02x?}", bytes);
        }
    }

    Ok(())
}

fn convert_lstm(input: &Path, output: &Path, hidden_size: usize, layers: &[LstmLayerNames]) -> WeightResult<()> {
    let mut loader = WeightLoader::from_path(input)?;
    loader.request(layers.iter().flat_map(|l| [l.kernel.as_str(), l.bias.as_str()]));
    let (mut store, report) = loader.load_with_report()?;
    if let Some(name) = report.missing.into_iter().next() {
        return Err(WeightError::MissingWeight(name));
    }

    for layer in layers {
        convert_lstm_layer(&mut store, layer, hidden_size)?;
    }

    let converted = layers
        .iter()
        .flat_map(|l| [l.converted_kernel.as_str(), l.converted_bias.as_str()])
        .map(|name| store.require(name))
        .collect::<WeightResult<Vec<_>>>()?;
    save_weights(output, converted.iter().copied())?;

    log::info!(
        "Wrote {} converted records for {} layers to {}",
        converted.len(),
        layers.len(),
        output.display()
    );
    Ok(())
}
