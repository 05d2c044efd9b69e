use std::io::Cursor;

use itertools::Itertools;
use rand::Rng;

use wt_store::load::WeightLoader;
use wt_store::record::WeightRecord;
use wt_store::store::WeightStore;
use wt_store::write::write_weights;

/// A single record header with its data, exactly as it appears in a container.
pub fn record_bytes(name: &str, tag: u32, shape: &[usize], data: &[u8]) -> Vec<u8> {
    let mut bytes = format!("{} {} ({}) ", name, tag, shape.iter().join(",")).into_bytes();
    bytes.extend_from_slice(data);
    bytes.push(b'\n');
    bytes
}

/// A container holding the given pre-encoded records.
pub fn container(records: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = format!("{}\n", records.len()).into_bytes();
    for record in records {
        bytes.extend_from_slice(record);
    }
    bytes
}

pub fn written(records: &[&WeightRecord]) -> Vec<u8> {
    let mut bytes = vec![];
    write_weights(&mut bytes, records.iter().copied()).unwrap();
    bytes
}

pub fn load_from_bytes(bytes: &[u8], names: &[&str]) -> WeightStore {
    let mut loader = WeightLoader::from_reader(Cursor::new(bytes.to_vec()));
    loader.request(names.iter().copied());
    loader.load().unwrap()
}

pub fn range_vec(len: usize) -> Vec<f32> {
    (0..len).map(|x| x as f32).collect_vec()
}

pub fn rng_vec(len: usize, rng: &mut impl Rng) -> Vec<f32> {
    (0..len).map(|_| rng.gen()).collect_vec()
}
