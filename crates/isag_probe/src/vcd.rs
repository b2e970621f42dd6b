//! Value Change Dump loading and replay.
//!
//! [`load_vcd`] parses an IEEE 1364 VCD file into a [`LoadedWaveform`]: the
//! declared signals with their hierarchical names and a time-ordered value
//! history per signal. [`VcdReplayProbe`] serves that waveform through
//! [`SignalProbe`], so a test bench can be evaluated against a recorded
//! simulation instead of a live one.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use isag_common::{Logic, LogicVec};
use thiserror::Error;

use crate::time::parse_time_unit;
use crate::{ProbeError, SignalProbe};

/// Errors that can occur while loading a VCD file.
#[derive(Debug, Error)]
pub enum VcdLoadError {
    /// An I/O error occurred while reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A parse error at a specific line number.
    #[error("parse error at line {line}: {message}")]
    ParseError {
        /// The 1-based line number where the error occurred.
        line: usize,
        /// Description of the error.
        message: String,
    },
    /// The VCD file has a structural format error.
    #[error("format error: {0}")]
    FormatError(String),
}

/// A signal declared by a `$var` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VcdSignal {
    /// Dotted hierarchical name built from the enclosing scopes.
    pub name: String,
    /// Declared bit width.
    pub width: u32,
}

/// A fully loaded waveform.
#[derive(Clone, Debug, Default)]
pub struct LoadedWaveform {
    /// Femtoseconds per VCD time unit.
    pub fs_per_unit: u64,
    /// Signals in declaration order.
    pub signals: Vec<VcdSignal>,
    /// Per-signal `(time_fs, value)` histories, parallel to `signals`.
    pub histories: Vec<Vec<(u64, LogicVec)>>,
    /// Last timestamp in the file, in femtoseconds.
    pub end_time_fs: u64,
}

impl LoadedWaveform {
    /// Finds a signal by exact dotted name.
    pub fn signal_index(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.name == name)
    }

    /// Finds a signal whose dotted name is `name` or ends with `.name`.
    ///
    /// Returns `None` when nothing matches or more than one signal matches
    /// the suffix.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.signal_index(name) {
            return Some(idx);
        }
        let suffix = format!(".{name}");
        let mut matches = self
            .signals
            .iter()
            .enumerate()
            .filter(|(_, s)| s.name.ends_with(&suffix));
        match (matches.next(), matches.next()) {
            (Some((idx, _)), None) => Some(idx),
            _ => None,
        }
    }

    /// Returns the value of signal `idx` at `time_fs`.
    ///
    /// Before the first recorded change every bit is `X`.
    pub fn value_at(&self, idx: usize, time_fs: u64) -> LogicVec {
        let history = &self.histories[idx];
        let pos = history.partition_point(|(t, _)| *t <= time_fs);
        if pos == 0 {
            LogicVec::filled(self.signals[idx].width, Logic::X)
        } else {
            history[pos - 1].1.clone()
        }
    }
}

/// Loads a VCD waveform from any reader.
///
/// # Errors
///
/// Returns [`VcdLoadError`] on I/O errors, malformed sections or value
/// changes, timestamps that go backwards, or a missing `$enddefinitions`.
pub fn load_vcd<R: Read>(mut reader: R) -> Result<LoadedWaveform, VcdLoadError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    VcdParser::new(&text).parse()
}

/// Loads a VCD file from a filesystem path.
pub fn load_vcd_file(path: &Path) -> Result<LoadedWaveform, VcdLoadError> {
    let file = std::fs::File::open(path)?;
    load_vcd(std::io::BufReader::new(file))
}

/// Whitespace-token parser over the whole file.
struct VcdParser<'a> {
    tokens: Vec<(usize, &'a str)>,
    pos: usize,
    waveform: LoadedWaveform,
    id_to_signals: HashMap<&'a str, Vec<usize>>,
    scopes: Vec<&'a str>,
    current_time_fs: u64,
}

impl<'a> VcdParser<'a> {
    fn new(text: &'a str) -> Self {
        let tokens = text
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |t| (i + 1, t)))
            .collect();
        Self {
            tokens,
            pos: 0,
            waveform: LoadedWaveform {
                fs_per_unit: 1,
                ..LoadedWaveform::default()
            },
            id_to_signals: HashMap::new(),
            scopes: Vec::new(),
            current_time_fs: 0,
        }
    }

    fn next_token(&mut self) -> Option<(usize, &'a str)> {
        let tok = self.tokens.get(self.pos).copied();
        self.pos += 1;
        tok
    }

    fn error(line: usize, message: impl Into<String>) -> VcdLoadError {
        VcdLoadError::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Collects the tokens of a section up to its `$end`.
    fn section_body(&mut self, keyword: &str, line: usize) -> Result<Vec<&'a str>, VcdLoadError> {
        let mut body = Vec::new();
        loop {
            match self.next_token() {
                Some((_, "$end")) => return Ok(body),
                Some((_, tok)) => body.push(tok),
                None => return Err(Self::error(line, format!("unterminated {keyword}"))),
            }
        }
    }

    fn parse(mut self) -> Result<LoadedWaveform, VcdLoadError> {
        self.parse_header()?;
        self.parse_changes()?;
        Ok(self.waveform)
    }

    fn parse_header(&mut self) -> Result<(), VcdLoadError> {
        while let Some((line, tok)) = self.next_token() {
            match tok {
                "$timescale" => {
                    let body = self.section_body(tok, line)?.concat();
                    self.waveform.fs_per_unit = if body.is_empty() {
                        1
                    } else {
                        parse_time_unit(&body).map_err(|e| Self::error(line, e))?
                    };
                }
                "$scope" => {
                    let body = self.section_body(tok, line)?;
                    if let Some(name) = body.get(1).or(body.first()).copied() {
                        self.scopes.push(name);
                    }
                }
                "$upscope" => {
                    self.section_body(tok, line)?;
                    self.scopes.pop();
                }
                "$var" => {
                    let body = self.section_body(tok, line)?;
                    self.declare(&body, line)?;
                }
                "$enddefinitions" => {
                    self.section_body(tok, line)?;
                    return Ok(());
                }
                t if t.starts_with('$') => {
                    self.section_body(t, line)?;
                }
                other => {
                    return Err(Self::error(
                        line,
                        format!("unexpected '{other}' in header"),
                    ));
                }
            }
        }
        Err(VcdLoadError::FormatError(
            "missing $enddefinitions".to_string(),
        ))
    }

    /// Registers a `$var <type> <width> <id> <name> [range]` declaration.
    fn declare(&mut self, body: &[&'a str], line: usize) -> Result<(), VcdLoadError> {
        let [_var_type, width, id, name, ..] = body else {
            return Err(Self::error(line, format!("invalid $var: {}", body.join(" "))));
        };
        let width: u32 = width
            .parse()
            .map_err(|_| Self::error(line, format!("invalid width in $var: {width}")))?;

        let name = if self.scopes.is_empty() {
            (*name).to_string()
        } else {
            format!("{}.{}", self.scopes.join("."), name)
        };

        let idx = self.waveform.signals.len();
        self.waveform.signals.push(VcdSignal { name, width });
        self.waveform.histories.push(Vec::new());
        self.id_to_signals.entry(*id).or_default().push(idx);
        Ok(())
    }

    fn parse_changes(&mut self) -> Result<(), VcdLoadError> {
        while let Some((line, tok)) = self.next_token() {
            match tok {
                "$dumpvars" | "$dumpall" | "$dumpon" | "$dumpoff" | "$end" => {}
                t if t.starts_with('$') => {
                    self.section_body(t, line)?;
                }
                t if t.starts_with('#') => self.advance_time(&t[1..], line)?,
                t if t.starts_with(['b', 'B']) => {
                    let (_, id) = self
                        .next_token()
                        .ok_or_else(|| Self::error(line, format!("missing identifier after {t}")))?;
                    self.record(id, &t[1..], line)?;
                }
                t if t.starts_with(['r', 'R']) => {
                    // Real values carry no logic state.
                    self.next_token();
                }
                t => {
                    let split = t.chars().next().map_or(0, char::len_utf8);
                    let (value, id) = t.split_at(split);
                    if id.is_empty() {
                        return Err(Self::error(line, format!("invalid value change: {t}")));
                    }
                    self.record(id, value, line)?;
                }
            }
        }
        Ok(())
    }

    fn advance_time(&mut self, digits: &str, line: usize) -> Result<(), VcdLoadError> {
        let t: u64 = digits
            .parse()
            .map_err(|_| Self::error(line, format!("invalid timestamp: #{digits}")))?;
        let fs = t
            .checked_mul(self.waveform.fs_per_unit)
            .ok_or_else(|| Self::error(line, format!("timestamp out of range: #{digits}")))?;
        if fs < self.current_time_fs {
            return Err(Self::error(line, format!("timestamp goes backwards: #{digits}")));
        }
        self.current_time_fs = fs;
        self.waveform.end_time_fs = fs;
        Ok(())
    }

    fn record(&mut self, id: &str, bits: &str, line: usize) -> Result<(), VcdLoadError> {
        let Some(indices) = self.id_to_signals.get(id) else {
            log::debug!("line {line}: value change for undeclared id '{id}'");
            return Ok(());
        };
        let parsed = LogicVec::from_binary_str(bits)
            .filter(|v| v.width() > 0)
            .ok_or_else(|| Self::error(line, format!("invalid value '{bits}'")))?;

        for &idx in indices {
            let width = self.waveform.signals[idx].width;
            let value = extend_to_width(&parsed, width);
            self.waveform.histories[idx].push((self.current_time_fs, value));
        }
        Ok(())
    }
}

/// Left-extends a value with `0`, or with `X`/`Z` when its top bit is one.
fn extend_to_width(value: &LogicVec, width: u32) -> LogicVec {
    let fill = match value.get(value.width() - 1) {
        Logic::X => Logic::X,
        Logic::Z => Logic::Z,
        _ => Logic::Zero,
    };
    value.resized(width, fill)
}

/// Replays a [`LoadedWaveform`] as if it were a running simulator.
///
/// Paths are accepted in either `/` or `.` hierarchy notation and match a
/// VCD signal by full name or by unique suffix. Writes are kept as forced
/// values that shadow the recording for the rest of the replay, since a
/// recorded run cannot react to them.
#[derive(Debug)]
pub struct VcdReplayProbe {
    waveform: LoadedWaveform,
    fs_per_time_unit: u64,
    now: u64,
    forced: HashMap<String, LogicVec>,
    resolved: HashMap<String, usize>,
}

impl VcdReplayProbe {
    /// Creates a probe where one runner time unit is `fs_per_time_unit` femtoseconds.
    pub fn new(waveform: LoadedWaveform, fs_per_time_unit: u64) -> Self {
        Self {
            waveform,
            fs_per_time_unit: fs_per_time_unit.max(1),
            now: 0,
            forced: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    /// Returns the replayed waveform.
    pub fn waveform(&self) -> &LoadedWaveform {
        &self.waveform
    }

    /// Returns the value last written to `path`, if any.
    pub fn forced(&self, path: &str) -> Option<&LogicVec> {
        self.forced.get(&normalize_path(path))
    }

    /// Last time covered by the recording, in runner time units.
    pub fn end_time(&self) -> u64 {
        self.waveform.end_time_fs / self.fs_per_time_unit
    }

    fn lookup(&mut self, path: &str) -> Result<usize, ProbeError> {
        if let Some(&idx) = self.resolved.get(path) {
            return Ok(idx);
        }
        let idx = self
            .waveform
            .resolve(path)
            .ok_or_else(|| ProbeError::UnknownSignal {
                path: path.to_string(),
            })?;
        self.resolved.insert(path.to_string(), idx);
        Ok(idx)
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_matches('/').replace('/', ".")
}

impl SignalProbe for VcdReplayProbe {
    fn get_signal_state(&mut self, path: &str) -> Result<LogicVec, ProbeError> {
        let path = normalize_path(path);
        if let Some(value) = self.forced.get(&path) {
            return Ok(value.clone());
        }
        let idx = self.lookup(&path)?;
        let time_fs = self.now.saturating_mul(self.fs_per_time_unit);
        Ok(self.waveform.value_at(idx, time_fs))
    }

    fn set_signal_state(&mut self, path: &str, value: LogicVec) -> Result<(), ProbeError> {
        let path = normalize_path(path);
        log::debug!("t={} force {} <= {}", self.now, path, value);
        self.forced.insert(path, value);
        Ok(())
    }

    fn run_for(&mut self, time_units: u64) -> Result<(), ProbeError> {
        let requested = self.now.saturating_add(time_units);
        if requested > self.end_time() {
            return Err(ProbeError::EndOfTrace {
                end: self.end_time(),
                requested,
            });
        }
        self.now = requested;
        Ok(())
    }

    fn now(&self) -> u64 {
        self.now
    }
}
