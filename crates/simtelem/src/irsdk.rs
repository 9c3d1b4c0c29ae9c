//! Reader for the iRacing SDK shared-memory telemetry file.
//!
//! The file starts with a fixed header, followed by a table of variable headers and a
//! small ring of data buffers. The simulator rotates through the buffers, bumping each
//! buffer's tick count when it is complete; readers copy the buffer with the highest
//! tick count.

use crate::source::{SourceError, TelemetrySource, VarName};
use fs_err::File;
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use strum::{Display as StrumDisplay, FromRepr};

pub const DEFAULT_PATH: &str = "/dev/shm/IRSDKMemMapFileName";

pub const HEADER_LEN: usize = 112;
pub const VAR_HEADER_LEN: usize = 144;
pub const MAX_BUFS: usize = 4;
/// Upper bound on the variable table; the simulator publishes a few hundred.
pub const MAX_VARS: usize = 4096;

const STATUS_CONNECTED: i32 = 1;
const VAR_BUF_BASE: usize = 48;
const VAR_BUF_LEN: usize = 16;
const FREEZE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, StrumDisplay)]
#[repr(i32)]
#[strum(serialize_all = "lowercase")]
pub enum VarType {
    Char = 0,
    Bool = 1,
    Int = 2,
    BitField = 3,
    Float = 4,
    Double = 5,
}

impl VarType {
    pub fn size(self) -> usize {
        match self {
            Self::Char | Self::Bool => 1,
            Self::Int | Self::BitField | Self::Float => 4,
            Self::Double => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VarBuf {
    pub tick_count: i32,
    pub buf_offset: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: i32,
    pub status: i32,
    pub tick_rate: i32,
    pub num_vars: i32,
    pub var_header_offset: i32,
    pub num_buf: i32,
    pub buf_len: i32,
    pub var_bufs: [VarBuf; MAX_BUFS],
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Result<Self, SourceError> {
        let num_buf = read_i32(bytes, 32)?;
        if !(1..=MAX_BUFS as i32).contains(&num_buf) {
            return Err(SourceError::Malformed(format!(
                "buffer count {num_buf} out of range"
            )));
        }

        let mut var_bufs = [VarBuf::default(); MAX_BUFS];
        for (i, buf) in var_bufs.iter_mut().enumerate() {
            let base = VAR_BUF_BASE + i * VAR_BUF_LEN;
            *buf = VarBuf {
                tick_count: read_i32(bytes, base)?,
                buf_offset: read_i32(bytes, base + 4)?,
            };
        }

        Ok(Self {
            version: read_i32(bytes, 0)?,
            status: read_i32(bytes, 4)?,
            tick_rate: read_i32(bytes, 8)?,
            num_vars: read_i32(bytes, 24)?,
            var_header_offset: read_i32(bytes, 28)?,
            num_buf,
            buf_len: read_i32(bytes, 36)?,
            var_bufs,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.status & STATUS_CONNECTED != 0
    }

    /// Index and descriptor of the most recently completed buffer.
    pub fn latest_buf(&self) -> (usize, VarBuf) {
        self.var_bufs[..self.num_buf as usize]
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|(_, b)| b.tick_count)
            .unwrap_or((0, self.var_bufs[0]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarHeader {
    pub name: VarName,
    pub kind: VarType,
    pub offset: usize,
    pub count: usize,
    pub desc: String,
    pub unit: String,
}

impl VarHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, SourceError> {
        let name = VarName::new(read_str(bytes, 16, 32)?);
        let raw_kind = read_i32(bytes, 0)?;
        let kind = VarType::from_repr(raw_kind).ok_or_else(|| SourceError::UnknownVarType {
            name: name.clone(),
            kind: raw_kind,
        })?;

        Ok(Self {
            kind,
            offset: to_usize(read_i32(bytes, 4)?, "variable offset")?,
            count: to_usize(read_i32(bytes, 8)?, "variable count")?.max(1),
            desc: read_str(bytes, 48, 64)?,
            unit: read_str(bytes, 112, 32)?,
            name,
        })
    }

    /// Decodes the variable from a data buffer. Array variables (such as the 360 Hz
    /// `_ST` channels) yield their last, newest element.
    pub fn decode(&self, buf: &[u8]) -> Result<f64, SourceError> {
        let size = self.kind.size();
        let start = self.offset + (self.count - 1) * size;
        let raw = buf.get(start..start + size).ok_or_else(|| {
            SourceError::Malformed(format!("'{}' lies outside the data buffer", self.name))
        })?;

        Ok(match self.kind {
            VarType::Char => f64::from(raw[0]),
            VarType::Bool => {
                if raw[0] != 0 {
                    1.0
                } else {
                    0.0
                }
            }
            VarType::Int | VarType::BitField => f64::from(read_i32(raw, 0)?),
            VarType::Float => f64::from(f32::from_le_bytes(fixed(raw)?)),
            VarType::Double => f64::from_le_bytes(fixed(raw)?),
        })
    }
}

struct Session {
    file: File,
    num_vars: i32,
    vars: Vec<VarHeader>,
    index: HashMap<String, usize>,
    frame: Vec<u8>,
}

impl Session {
    fn open(path: &Path) -> Result<Self, SourceError> {
        let mut session = Self {
            file: File::open(path)?,
            num_vars: 0,
            vars: Vec::new(),
            index: HashMap::new(),
            frame: Vec::new(),
        };

        let header = session.read_header()?;
        if !header.is_connected() {
            return Err(SourceError::NotConnected);
        }
        session.reload_vars(&header)?;
        Ok(session)
    }

    fn read_header(&mut self) -> Result<Header, SourceError> {
        Header::parse(&read_at(&mut self.file, 0, HEADER_LEN)?)
    }

    fn reload_vars(&mut self, header: &Header) -> Result<(), SourceError> {
        let count = to_usize(header.num_vars, "variable count")?;
        if count > MAX_VARS {
            return Err(SourceError::Malformed(format!(
                "variable count {count} out of range"
            )));
        }
        let table = read_at(
            &mut self.file,
            to_usize(header.var_header_offset, "variable header offset")?,
            count * VAR_HEADER_LEN,
        )?;

        self.vars = table
            .chunks_exact(VAR_HEADER_LEN)
            .map(VarHeader::parse)
            .collect::<Result<_, _>>()?;
        self.index = self
            .vars
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name.to_string(), i))
            .collect();
        self.num_vars = header.num_vars;
        Ok(())
    }

    fn freeze(&mut self) -> Result<(), SourceError> {
        for attempt in 1..=FREEZE_ATTEMPTS {
            let header = self.read_header()?;
            if !header.is_connected() {
                return Err(SourceError::NotConnected);
            }
            if header.num_vars != self.num_vars {
                log::info!("Telemetry variable table changed, reloading");
                self.reload_vars(&header)?;
            }

            let (idx, latest) = header.latest_buf();
            let frame = read_at(
                &mut self.file,
                to_usize(latest.buf_offset, "buffer offset")?,
                to_usize(header.buf_len, "buffer length")?,
            )?;

            // the simulator may have started rewriting this buffer while we copied it
            let settled = self.read_header()?.var_bufs[idx].tick_count == latest.tick_count;
            if settled || attempt == FREEZE_ATTEMPTS {
                self.frame = frame;
                return Ok(());
            }
        }
        Ok(())
    }
}

pub struct IrsdkSource {
    path: PathBuf,
    session: Option<Session>,
}

impl IrsdkSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            session: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Variable table of the current session, empty while disconnected.
    pub fn variables(&self) -> &[VarHeader] {
        self.session
            .as_ref()
            .map(|s| s.vars.as_slice())
            .unwrap_or_default()
    }
}

impl Default for IrsdkSource {
    fn default() -> Self {
        Self::new(DEFAULT_PATH)
    }
}

impl TelemetrySource for IrsdkSource {
    fn connect(&mut self) -> bool {
        if self.session.is_some() {
            return true;
        }
        match Session::open(&self.path) {
            Ok(session) => {
                log::info!(
                    "Attached to iRacing telemetry at {} ({} variables)",
                    self.path.display(),
                    session.vars.len()
                );
                self.session = Some(session);
                true
            }
            Err(e) => {
                log::debug!("iRacing telemetry unavailable: {}", e);
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn freeze_latest(&mut self) -> Result<(), SourceError> {
        self.session
            .as_mut()
            .ok_or(SourceError::NotConnected)?
            .freeze()
    }

    fn read_variable(&self, name: &str) -> Result<Option<f64>, SourceError> {
        let session = self.session.as_ref().ok_or(SourceError::NotConnected)?;
        session
            .index
            .get(name)
            .map(|&i| session.vars[i].decode(&session.frame))
            .transpose()
    }

    fn disconnect(&mut self) {
        if self.session.take().is_some() {
            log::info!("Detached from iRacing telemetry");
        }
    }
}

/// Reads `len` bytes at `offset`, rejecting ranges that run past the end of the file
/// before anything is allocated.
fn read_at(file: &mut File, offset: usize, len: usize) -> Result<Vec<u8>, SourceError> {
    let file_len = file.metadata()?.len();
    let end = (offset as u64).checked_add(len as u64);
    if end.is_none_or(|end| end > file_len) {
        return Err(SourceError::Malformed(format!(
            "range {offset}+{len} exceeds file length {file_len}"
        )));
    }

    file.seek(SeekFrom::Start(offset as u64))?;
    let mut buf = vec![0; len];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], SourceError> {
    bytes
        .get(..N)
        .and_then(|s| <[u8; N]>::try_from(s).ok())
        .ok_or_else(|| SourceError::Malformed(format!("expected {N} bytes")))
}

fn read_i32(bytes: &[u8], at: usize) -> Result<i32, SourceError> {
    bytes
        .get(at..)
        .ok_or_else(|| SourceError::Malformed(format!("truncated at offset {at}")))
        .and_then(fixed::<4>)
        .map(i32::from_le_bytes)
}

fn read_str(bytes: &[u8], at: usize, len: usize) -> Result<String, SourceError> {
    let raw = bytes
        .get(at..at + len)
        .ok_or_else(|| SourceError::Malformed(format!("truncated string at offset {at}")))?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).trim().to_string())
}

fn to_usize(value: i32, what: &str) -> Result<usize, SourceError> {
    usize::try_from(value).map_err(|_| SourceError::Malformed(format!("negative {what}: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct TestVar {
        name: &'static str,
        kind: VarType,
        count: usize,
    }

    fn var(name: &'static str, kind: VarType, count: usize) -> TestVar {
        TestVar { name, kind, count }
    }

    fn encode(kind: VarType, value: f64) -> Vec<u8> {
        match kind {
            VarType::Char | VarType::Bool => vec![value as u8],
            VarType::Int | VarType::BitField => (value as i32).to_le_bytes().to_vec(),
            VarType::Float => (value as f32).to_le_bytes().to_vec(),
            VarType::Double => value.to_le_bytes().to_vec(),
        }
    }

    /// Builds a memory image with one data buffer per `(tick, values)` entry, where
    /// `values[v]` holds the elements of variable `v`.
    fn image(status: i32, vars: &[TestVar], bufs: &[(i32, Vec<Vec<f64>>)]) -> Vec<u8> {
        let offsets: Vec<usize> = vars
            .iter()
            .scan(0, |acc, v| {
                let at = *acc;
                *acc += v.kind.size() * v.count;
                Some(at)
            })
            .collect();
        let buf_len: usize = vars.iter().map(|v| v.kind.size() * v.count).sum();
        let var_header_offset = HEADER_LEN;
        let data_offset = var_header_offset + vars.len() * VAR_HEADER_LEN;

        let mut out = vec![0u8; data_offset + buf_len * bufs.len()];
        let mut put = |at: usize, bytes: &[u8]| out[at..at + bytes.len()].copy_from_slice(bytes);

        put(0, &2i32.to_le_bytes());
        put(4, &status.to_le_bytes());
        put(8, &60i32.to_le_bytes());
        put(24, &(vars.len() as i32).to_le_bytes());
        put(28, &(var_header_offset as i32).to_le_bytes());
        put(32, &(bufs.len() as i32).to_le_bytes());
        put(36, &(buf_len as i32).to_le_bytes());

        for (i, v) in vars.iter().enumerate() {
            let base = var_header_offset + i * VAR_HEADER_LEN;
            put(base, &(v.kind as i32).to_le_bytes());
            put(base + 4, &(offsets[i] as i32).to_le_bytes());
            put(base + 8, &(v.count as i32).to_le_bytes());
            put(base + 16, v.name.as_bytes());
            put(base + 48, b"test variable");
            put(base + 112, b"m/s^2");
        }

        for (b, (tick, values)) in bufs.iter().enumerate() {
            let buf_offset = data_offset + b * buf_len;
            put(VAR_BUF_BASE + b * VAR_BUF_LEN, &tick.to_le_bytes());
            put(
                VAR_BUF_BASE + b * VAR_BUF_LEN + 4,
                &(buf_offset as i32).to_le_bytes(),
            );
            for (v, elems) in values.iter().enumerate() {
                for (e, value) in elems.iter().enumerate() {
                    let at = buf_offset + offsets[v] + e * vars[v].kind.size();
                    put(at, &encode(vars[v].kind, *value));
                }
            }
        }
        out
    }

    fn write_image(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn standard_vars() -> Vec<TestVar> {
        vec![
            var("LongAccel", VarType::Float, 1),
            var("LatAccel_ST", VarType::Float, 6),
            var("Pitch", VarType::Double, 1),
            var("Gear", VarType::Int, 1),
            var("OnPitRoad", VarType::Bool, 1),
        ]
    }

    fn standard_values(long: f64) -> Vec<Vec<f64>> {
        vec![
            vec![long],
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 4.5],
            vec![0.02],
            vec![3.0],
            vec![1.0],
        ]
    }

    #[test]
    fn test_reads_scalars_and_newest_array_element() {
        let file = write_image(&image(1, &standard_vars(), &[(7, standard_values(-9.5))]));
        let mut source = IrsdkSource::new(file.path());

        assert!(source.connect());
        source.freeze_latest().unwrap();

        assert_eq!(source.read_variable("LongAccel").unwrap(), Some(-9.5));
        assert_eq!(source.read_variable("LatAccel_ST").unwrap(), Some(4.5));
        assert_eq!(source.read_variable("Pitch").unwrap(), Some(0.02));
        assert_eq!(source.read_variable("Gear").unwrap(), Some(3.0));
        assert_eq!(source.read_variable("OnPitRoad").unwrap(), Some(1.0));
        assert_eq!(source.read_variable("Roll").unwrap(), None);
    }

    #[test]
    fn test_variable_table_metadata() {
        let file = write_image(&image(1, &standard_vars(), &[(1, standard_values(0.0))]));
        let mut source = IrsdkSource::new(file.path());
        assert!(source.variables().is_empty());
        assert!(source.connect());

        let lat = &source.variables()[1];
        assert_eq!(lat.name.as_str(), "LatAccel_ST");
        assert_eq!(lat.kind, VarType::Float);
        assert_eq!(lat.count, 6);
        assert_eq!(lat.unit, "m/s^2");
        assert_eq!(lat.desc, "test variable");
    }

    #[test]
    fn test_freeze_picks_highest_tick_buffer() {
        let bufs = [
            (41, standard_values(1.0)),
            (43, standard_values(3.0)),
            (42, standard_values(2.0)),
        ];
        let file = write_image(&image(1, &standard_vars(), &bufs));
        let mut source = IrsdkSource::new(file.path());

        assert!(source.connect());
        source.freeze_latest().unwrap();
        assert_eq!(source.read_variable("LongAccel").unwrap(), Some(3.0));
    }

    #[test]
    fn test_connect_requires_connected_status() {
        let file = write_image(&image(0, &standard_vars(), &[(1, standard_values(0.0))]));
        let mut source = IrsdkSource::new(file.path());

        assert!(!source.connect());
        assert!(!source.is_connected());
        assert!(matches!(
            source.read_variable("LongAccel"),
            Err(SourceError::NotConnected)
        ));
    }

    #[test]
    fn test_missing_file_does_not_connect() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = IrsdkSource::new(dir.path().join("absent"));
        assert!(!source.connect());
    }

    #[test]
    fn test_freeze_fails_once_simulator_exits() {
        let file = write_image(&image(1, &standard_vars(), &[(1, standard_values(0.0))]));
        let mut source = IrsdkSource::new(file.path());
        assert!(source.connect());

        std::fs::write(
            file.path(),
            image(0, &standard_vars(), &[(2, standard_values(0.0))]),
        )
        .unwrap();

        assert!(matches!(
            source.freeze_latest(),
            Err(SourceError::NotConnected)
        ));
        source.disconnect();
        assert!(!source.is_connected());
    }

    #[test]
    fn test_unknown_var_type_is_rejected() {
        let mut bytes = vec![0u8; VAR_HEADER_LEN];
        bytes[..4].copy_from_slice(&9i32.to_le_bytes());
        bytes[16..21].copy_from_slice(b"Bogus");

        match VarHeader::parse(&bytes) {
            Err(SourceError::UnknownVarType { name, kind }) => {
                assert_eq!(name.as_str(), "Bogus");
                assert_eq!(kind, 9);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_header_rejects_bad_buffer_count() {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[32..36].copy_from_slice(&7i32.to_le_bytes());
        assert!(matches!(
            Header::parse(&bytes),
            Err(SourceError::Malformed(_))
        ));
    }

    fn patch_i32(bytes: &mut [u8], at: usize, value: i32) {
        bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn test_oversized_variable_count_is_rejected() {
        let mut bytes = image(1, &standard_vars(), &[(1, standard_values(0.0))]);
        patch_i32(&mut bytes, 24, i32::MAX);
        let file = write_image(&bytes);
        let mut source = IrsdkSource::new(file.path());

        assert!(!source.connect());
        assert!(!source.is_connected());

        let header = Header::parse(&bytes[..HEADER_LEN]).unwrap();
        let mut session = Session {
            file: File::open(file.path()).unwrap(),
            num_vars: 0,
            vars: Vec::new(),
            index: HashMap::new(),
            frame: Vec::new(),
        };
        assert!(matches!(
            session.reload_vars(&header),
            Err(SourceError::Malformed(_))
        ));
    }

    #[test]
    fn test_variable_table_past_end_of_file_is_rejected() {
        let mut bytes = image(1, &standard_vars(), &[(1, standard_values(0.0))]);
        patch_i32(&mut bytes, 24, MAX_VARS as i32);
        let file = write_image(&bytes);
        let mut source = IrsdkSource::new(file.path());

        assert!(!source.connect());
    }

    #[test]
    fn test_torn_buffer_length_fails_freeze() {
        let bytes = image(1, &standard_vars(), &[(1, standard_values(0.0))]);
        let file = write_image(&bytes);
        let mut source = IrsdkSource::new(file.path());
        assert!(source.connect());

        let mut torn = bytes.clone();
        patch_i32(&mut torn, 36, i32::MAX);
        std::fs::write(file.path(), torn).unwrap();

        assert!(matches!(
            source.freeze_latest(),
            Err(SourceError::Malformed(_))
        ));
    }
}
