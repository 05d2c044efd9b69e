use std::process::exit;

use itertools::Itertools;

use wt_store::load::scan_headers;

fn main() {
    let args = std::env::args().collect_vec();
    if args.len() != 2 {
        eprintln!("Usage: scan_weights <path.wts>");
        exit(1);
    }

    let path = &args[1];
    let headers = match scan_headers(path) {
        Ok(headers) => headers,
        Err(e) => {
            eprintln!("Failed to scan {}: {}", path, e);
            exit(1);
        }
    };

    for header in &headers {
        let ty = match header.dtype() {
            Some(dtype) => dtype.to_string(),
            None => format!("tag{}", header.tag),
        };
        println!(
            "{:>10} {:<6} ({}) {}",
            header.data_offset,
            ty,
            header.shape.iter().join(","),
            header.name
        );
    }
    println!(
        "{} records, {} data bytes",
        headers.len(),
        headers.iter().map(|h| h.byte_len()).sum::<usize>()
    );
}
