use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::dtype::{DType, TypeTag};
use crate::record::WeightRecord;
use crate::result::{FormatError, ToWeightResult, WeightError, WeightResult};
use crate::store::WeightStore;

/// Anything a container can be read from.
pub trait WeightSource: BufRead + Seek {}

impl<R: BufRead + Seek> WeightSource for R {}

/// Load the records named in `names` from the container at `path`.
///
/// Names that do not appear in the file are silently absent from the result,
/// use [WeightLoader::load_with_report] to find out which ones were missing.
pub fn load_weights<S: Into<String>>(path: impl AsRef<Path>, names: impl IntoIterator<Item = S>) -> WeightResult<WeightStore> {
    let mut loader = WeightLoader::from_path(path)?;
    loader.request(names);
    loader.load()
}

/// List the headers of every record in the container at `path` without reading any data.
pub fn scan_headers(path: impl AsRef<Path>) -> WeightResult<Vec<RecordHeader>> {
    WeightLoader::from_path(path)?.scan()
}

/// Load a tagged weight container.
///
/// The container is a leading decimal record count, followed for each record by
/// `name type (d0,d1,...)`, one separator byte, the raw little-endian data and one more separator byte.
///
/// Settings:
/// * the source, either a path through [Self::from_path] or any seekable reader through [Self::from_reader].
/// * which records to extract, through [Self::request] or [Self::request_all].
///   Loading stops as soon as every requested name has been found.
/// * element sizes for type tags outside of [DType], through [Self::add_type_size].
///
/// ```no_run
/// # use wt_store::load::WeightLoader;
/// let mut loader = WeightLoader::from_path("char-rnn.wts").unwrap();
/// loader.request(["embedding", "softmax_softmax_w"]);
/// let store = loader.load().unwrap();
/// ```
#[allow(missing_debug_implementations)]
pub struct WeightLoader<'a> {
    source: Box<dyn WeightSource + 'a>,
    origin: PathBuf,

    request: Request,
    type_sizes: HashMap<TypeTag, usize>,
}

#[derive(Debug, Clone)]
enum Request {
    All,
    Names(HashSet<String>),
}

/// Everything about a record except its data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RecordHeader {
    pub name: String,
    pub tag: TypeTag,
    pub shape: Vec<usize>,
    pub element_size: usize,
    /// Offset of the first data byte from the start of the container.
    pub data_offset: u64,
}

/// Summary of a single load pass.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LoadReport {
    /// The record count declared by the container.
    pub declared: usize,
    pub loaded: Vec<String>,
    pub skipped: usize,
    /// Requested names that were not found, sorted.
    pub missing: Vec<String>,
    pub bytes_read: usize,
    /// Whether loading stopped before visiting every declared record.
    pub stopped_early: bool,
}

impl RecordHeader {
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn byte_len(&self) -> usize {
        self.element_count() * self.element_size
    }

    pub fn dtype(&self) -> Option<DType> {
        DType::from_tag(self.tag)
    }
}

impl<'a> WeightLoader<'a> {
    pub fn from_path(path: impl AsRef<Path>) -> WeightResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).to_weight_result(path)?;
        Ok(WeightLoader::new(Box::new(BufReader::new(file)), path.to_owned()))
    }

    pub fn from_reader(reader: impl WeightSource + 'a) -> Self {
        WeightLoader::new(Box::new(reader), PathBuf::from("<reader>"))
    }

    fn new(source: Box<dyn WeightSource + 'a>, origin: PathBuf) -> Self {
        WeightLoader {
            source,
            origin,
            request: Request::Names(HashSet::new()),
            type_sizes: HashMap::new(),
        }
    }

    /// Add names to the set of records to extract.
    pub fn request<S: Into<String>>(&mut self, names: impl IntoIterator<Item = S>) {
        match &mut self.request {
            Request::All => {}
            Request::Names(set) => set.extend(names.into_iter().map(Into::into)),
        }
    }

    /// Extract every record in the container.
    pub fn request_all(&mut self) {
        self.request = Request::All;
    }

    /// Register the element size of a type tag that is not part of [DType].
    pub fn add_type_size(&mut self, tag: TypeTag, bytes: usize) {
        assert!(bytes > 0, "Element size for tag {} must be nonzero", tag);
        self.type_sizes.insert(tag, bytes);
    }

    pub fn load(self) -> WeightResult<WeightStore> {
        self.load_with_report().map(|(store, _)| store)
    }

    pub fn load_with_report(self) -> WeightResult<(WeightStore, LoadReport)> {
        let WeightLoader {
            mut source,
            origin,
            request,
            type_sizes,
        } = self;
        let mut parser = Parser {
            reader: source.as_mut(),
            origin: &origin,
            type_sizes: &type_sizes,
        };

        let count = parser.read_count()?;
        let mut pending = match request {
            Request::All => None,
            Request::Names(names) => Some(names),
        };

        let mut store = WeightStore::new();
        let mut report = LoadReport {
            declared: count,
            ..LoadReport::default()
        };

        for index in 0..count {
            if pending.as_ref().map_or(false, |p| p.is_empty()) {
                log::debug!("All requested weights found after {} of {} records", index, count);
                report.stopped_early = true;
                break;
            }

            let header = parser.read_header()?;
            let wanted = match &mut pending {
                Some(pending) => pending.remove(&header.name),
                None => {
                    let fresh = !store.contains(&header.name);
                    if !fresh {
                        log::warn!("Skipping repeated record '{}' in {}", header.name, origin.display());
                    }
                    fresh
                }
            };

            if !wanted {
                log::debug!("Skipping '{}' ({} bytes)", header.name, header.byte_len());
                parser.skip_data(&header)?;
                report.skipped += 1;
                continue;
            }

            let data = parser.read_data(&header)?;
            log::debug!("Read '{}' with shape {:?} ({} bytes)", header.name, header.shape, data.len());

            report.bytes_read += data.len();
            report.loaded.push(header.name.clone());
            store.insert_loaded(WeightRecord::from_raw(
                header.name,
                header.tag,
                header.element_size,
                header.shape,
                data,
            ));
        }

        report.missing = pending.map_or(vec![], |p| p.into_iter().sorted().collect());
        if !report.missing.is_empty() {
            log::warn!(
                "Requested weights not found in {}: {:?}",
                origin.display(),
                report.missing
            );
        }
        log::info!(
            "Loaded {} of {} records ({} bytes) from {}",
            report.loaded.len(),
            count,
            report.bytes_read,
            origin.display()
        );

        Ok((store, report))
    }

    /// Walk every record header, seeking over the data.
    ///
    /// Unlike [Self::load] this checks that every data blob fits inside the container.
    pub fn scan(self) -> WeightResult<Vec<RecordHeader>> {
        let WeightLoader {
            mut source,
            origin,
            request: _,
            type_sizes,
        } = self;

        let start = source.stream_position().to_weight_result(&origin)?;
        let end = source.seek(SeekFrom::End(0)).to_weight_result(&origin)?;
        source.seek(SeekFrom::Start(start)).to_weight_result(&origin)?;

        let mut parser = Parser {
            reader: source.as_mut(),
            origin: &origin,
            type_sizes: &type_sizes,
        };

        let count = parser.read_count()?;
        let mut headers = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let header = parser.read_header()?;
            let data_end = header.data_offset.checked_add(header.byte_len() as u64);
            if data_end.map_or(true, |data_end| data_end > end) {
                return Err(FormatError::Truncated {
                    expected: header.byte_len(),
                    offset: header.data_offset,
                    name: header.name,
                }
                .into());
            }
            parser.skip_data(&header)?;
            headers.push(header);
        }

        Ok(headers)
    }
}

struct Parser<'r, 'a> {
    reader: &'r mut (dyn WeightSource + 'a),
    origin: &'r Path,
    type_sizes: &'r HashMap<TypeTag, usize>,
}

impl Parser<'_, '_> {
    fn read_count(&mut self) -> WeightResult<usize> {
        let token = self.read_number_token("count")?;
        match token.parse::<i64>() {
            Ok(count) if count > 0 => Ok(count as usize),
            _ => Err(FormatError::InvalidCount(token).into()),
        }
    }

    fn read_header(&mut self) -> WeightResult<RecordHeader> {
        let name = self.read_token(|b| !b.is_ascii_whitespace())?;
        if name.is_empty() {
            return Err(FormatError::MissingToken("name").into());
        }

        let tag_token = self.read_number_token("type")?;
        let tag = tag_token
            .parse::<TypeTag>()
            .map_err(|_| FormatError::InvalidToken("type", tag_token))?;

        let shape = self.read_shape(&name)?;
        let count = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| FormatError::InvalidShape(name.clone(), format!("{:?}", shape)))?;
        if count == 0 {
            return Err(FormatError::EmptyRecord(name).into());
        }

        let element_size = self.element_size(tag).ok_or_else(|| FormatError::UnknownType(name.clone(), tag))?;
        // the data and both separators must stay addressable by a relative seek
        let seekable = count
            .checked_mul(element_size)
            .and_then(|n| i64::try_from(n).ok())
            .and_then(|n| n.checked_add(2));
        if seekable.is_none() {
            return Err(FormatError::InvalidShape(name, format!("{:?}", shape)).into());
        }

        // the data starts after a single separator byte
        let data_offset = self.reader.stream_position().to_weight_result(self.origin)? + 1;

        Ok(RecordHeader {
            name,
            tag,
            shape,
            element_size,
            data_offset,
        })
    }

    fn skip_data(&mut self, header: &RecordHeader) -> WeightResult<()> {
        // fits, checked in read_header
        let skip = 2 + header.byte_len() as i64;
        self.reader.seek(SeekFrom::Current(skip)).to_weight_result(self.origin)?;
        Ok(())
    }

    fn read_data(&mut self, header: &RecordHeader) -> WeightResult<Vec<u8>> {
        let expected = header.byte_len();
        let truncated = || FormatError::Truncated {
            name: header.name.clone(),
            expected,
            offset: header.data_offset,
        };

        let mut separator = [0; 1];
        match self.reader.read_exact(&mut separator) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(truncated().into()),
            Err(e) => return Err(WeightError::IO(self.origin.to_owned(), e)),
        }

        // grow as data arrives instead of trusting the declared size up front
        let mut data = Vec::new();
        (&mut *self.reader)
            .take(expected as u64)
            .read_to_end(&mut data)
            .to_weight_result(self.origin)?;
        if data.len() != expected {
            return Err(truncated().into());
        }

        self.reader.seek(SeekFrom::Current(1)).to_weight_result(self.origin)?;
        Ok(data)
    }

    fn element_size(&self, tag: TypeTag) -> Option<usize> {
        DType::from_tag(tag)
            .map(|dtype| dtype.size_bytes())
            .or_else(|| self.type_sizes.get(&tag).copied())
    }

    fn read_shape(&mut self, name: &str) -> WeightResult<Vec<usize>> {
        let prefix = self.read_until(b'(')?;
        match prefix.split_last() {
            Some((b'(', rest)) if rest.iter().all(|b| b.is_ascii_whitespace()) => {}
            Some((b'(', rest)) => {
                let rest = String::from_utf8_lossy(rest).into_owned();
                return Err(FormatError::InvalidShape(name.to_owned(), rest).into());
            }
            _ => return Err(FormatError::MissingToken("shape").into()),
        }

        let body = self.read_until(b')')?;
        match body.split_last() {
            Some((b')', inner)) => Ok(parse_shape(name, &String::from_utf8_lossy(inner))?),
            _ => Err(FormatError::MissingToken("shape end").into()),
        }
    }

    fn read_number_token(&mut self, what: &'static str) -> WeightResult<String> {
        let token = self.read_token(|b| b.is_ascii_digit() || b == b'-' || b == b'+')?;
        if !token.is_empty() {
            return Ok(token);
        }

        // report whatever is there instead
        let other = self.read_token(|b| !b.is_ascii_whitespace())?;
        if other.is_empty() {
            Err(FormatError::MissingToken(what).into())
        } else {
            Err(FormatError::InvalidToken(what, other).into())
        }
    }

    /// Skip leading whitespace, then read bytes while `accept` holds.
    fn read_token(&mut self, accept: impl Fn(u8) -> bool) -> WeightResult<String> {
        self.skip_whitespace()?;

        let mut token = vec![];
        loop {
            let buf = self.reader.fill_buf().to_weight_result(self.origin)?;
            if buf.is_empty() {
                break;
            }
            let len = buf.iter().position(|&b| !accept(b)).unwrap_or(buf.len());
            token.extend_from_slice(&buf[..len]);
            let done = len < buf.len();
            self.reader.consume(len);
            if done {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&token).into_owned())
    }

    fn skip_whitespace(&mut self) -> WeightResult<()> {
        loop {
            let buf = self.reader.fill_buf().to_weight_result(self.origin)?;
            if buf.is_empty() {
                return Ok(());
            }
            let len = buf.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(buf.len());
            let done = len < buf.len();
            self.reader.consume(len);
            if done {
                return Ok(());
            }
        }
    }

    fn read_until(&mut self, delim: u8) -> WeightResult<Vec<u8>> {
        let mut bytes = vec![];
        self.reader.read_until(delim, &mut bytes).to_weight_result(self.origin)?;
        Ok(bytes)
    }
}

/// Parse the inside of a shape descriptor such as `2,512,4,512`.
///
/// A single trailing comma is accepted, an empty shape is a scalar.
pub fn parse_shape(name: &str, text: &str) -> Result<Vec<usize>, FormatError> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed).trim_end();
    if trimmed.is_empty() {
        return Ok(vec![]);
    }

    trimmed
        .split(',')
        .map(|d| d.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| FormatError::InvalidShape(name.to_owned(), text.to_owned()))
}
