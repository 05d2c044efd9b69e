use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;

use crate::result::{FormatError, ToWeightResult, WeightResult};

/// Per-tensor maximum absolute values, used to set symmetric quantization ranges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRanges {
    ranges: IndexMap<String, f32>,
}

impl DynamicRanges {
    /// Read `tensorName:value` lines from the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> WeightResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).to_weight_result(path)?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .to_weight_result(path)?;
        let ranges = DynamicRanges::parse_lines(lines.iter().map(|s| s.as_str()))?;

        log::info!("Read {} dynamic ranges from {}", ranges.len(), path.display());
        Ok(ranges)
    }

    /// Parse `tensorName:value` lines. Blank lines are skipped and later entries replace earlier ones.
    pub fn parse_lines<'s>(lines: impl IntoIterator<Item = &'s str>) -> WeightResult<Self> {
        let mut ranges = IndexMap::new();

        for (index, line) in lines.into_iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let invalid = || FormatError::InvalidDynamicRange(index + 1, line.to_owned());
            let (name, value) = trimmed.split_once(':').ok_or_else(invalid)?;
            let name = name.trim();
            let value = value.trim().parse::<f32>().map_err(|_| invalid())?;
            if name.is_empty() || !value.is_finite() {
                return Err(invalid().into());
            }

            if ranges.insert(name.to_owned(), value).is_some() {
                log::warn!("Dynamic range for '{}' given more than once", name);
            }
        }

        Ok(DynamicRanges { ranges })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.ranges.get(name).copied()
    }

    /// The symmetric `(-v, v)` range for `name`.
    pub fn range_for(&self, name: &str) -> Option<(f32, f32)> {
        self.get(name).map(|v| (-v, v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.ranges.iter().map(|(k, &v)| (k.as_str(), v))
    }
}
