use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FraError;

const RUN_DIGITS: usize = 3;
const TONE_PREFIX: &str = "tone_number_";

/// Raw samples keyed by `<channel><run:03>`, e.g. `di0P000`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataResource {
    runs: BTreeMap<String, Vec<f64>>,
}

impl DataResource {
    pub fn new(runs: BTreeMap<String, Vec<f64>>) -> Self {
        Self { runs }
    }

    /// Single-run resource, handy for synthetic recordings.
    pub fn from_channels<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: AsRef<str>,
    {
        let runs = channels
            .into_iter()
            .map(|(name, samples)| (format!("{}{:03}", name.as_ref(), 0), samples))
            .collect();
        Self { runs }
    }

    pub fn insert_run(&mut self, channel: &str, run: usize, samples: Vec<f64>) {
        self.runs.insert(format!("{channel}{run:03}"), samples);
    }

    /// All runs of `channel` concatenated in run order.
    pub fn channel(&self, channel: &str) -> Result<Vec<f64>, FraError> {
        let mut runs: Vec<(usize, &Vec<f64>)> = Vec::new();
        // metadata keys and other channels are skipped
        let candidates = self
            .runs
            .iter()
            .filter(|(label, _)| label.starts_with(channel));
        for (label, samples) in candidates {
            let (name, run) = split_label(label)?;
            if name == channel {
                runs.push((run, samples));
            }
        }
        if runs.is_empty() {
            return Err(FraError::Format(format!("channel `{channel}` has no runs")));
        }
        runs.sort_by_key(|(run, _)| *run);
        for (expected, (run, _)) in runs.iter().enumerate() {
            if *run != expected {
                return Err(FraError::Format(format!(
                    "channel `{channel}` is missing run {expected:03}"
                )));
            }
        }
        Ok(runs
            .into_iter()
            .flat_map(|(_, samples)| samples.iter().copied())
            .collect())
    }
}

fn split_label(label: &str) -> Result<(&str, usize), FraError> {
    let malformed = || FraError::Format(format!("malformed channel label `{label}`"));
    if label.len() <= RUN_DIGITS || !label.is_char_boundary(label.len() - RUN_DIGITS) {
        return Err(malformed());
    }
    let (name, digits) = label.split_at(label.len() - RUN_DIGITS);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let run = digits.parse().map_err(|_| malformed())?;
    Ok((name, run))
}

/// One stimulus presentation as declared by the header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StimulusEvent {
    pub ordinal: usize,
    pub frequency: f64,
    pub level: f64,
    pub extras: Vec<f64>,
    pub rise_time: Option<f64>,
}

impl StimulusEvent {
    pub fn new(ordinal: usize, frequency: f64, level: f64) -> Self {
        Self {
            ordinal,
            frequency,
            level,
            extras: Vec::new(),
            rise_time: None,
        }
    }
}

/// Per-file stimulus header. Keys other than `tone_number_NNN` are ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderResource {
    entries: BTreeMap<String, Value>,
}

impl HeaderResource {
    pub fn new(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }

    /// Header declaring plain `(frequency, level, 0.0)` tones in order.
    pub fn from_tones(tones: &[(f64, f64)]) -> Self {
        let entries = tones
            .iter()
            .enumerate()
            .map(|(i, &(frequency, level))| {
                (
                    format!("{TONE_PREFIX}{i:03}"),
                    Value::from(vec![frequency, level, 0.0]),
                )
            })
            .collect();
        Self { entries }
    }

    pub fn tone_count(&self) -> usize {
        self.entries
            .keys()
            .filter(|key| key.starts_with("tone_"))
            .count()
    }

    /// Declared stimuli ordered by ordinal.
    pub fn events(&self) -> Result<Vec<StimulusEvent>, FraError> {
        let mut events = Vec::new();
        for (key, value) in &self.entries {
            let Some(ordinal) = key.strip_prefix(TONE_PREFIX) else {
                continue;
            };
            let ordinal: usize = ordinal
                .parse()
                .map_err(|_| FraError::Format(format!("bad tone key `{key}`")))?;
            events.push(parse_event(ordinal, key, value)?);
        }
        events.sort_by_key(|event| event.ordinal);
        for (expected, event) in events.iter().enumerate() {
            if event.ordinal != expected {
                return Err(FraError::Format(format!(
                    "header is missing tone {expected:03}"
                )));
            }
        }
        Ok(events)
    }
}

fn parse_event(ordinal: usize, key: &str, value: &Value) -> Result<StimulusEvent, FraError> {
    let fields = value
        .as_array()
        .ok_or_else(|| FraError::Format(format!("`{key}` is not a sequence")))?
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| FraError::Format(format!("`{key}` has a non-numeric field")))
        })
        .collect::<Result<Vec<f64>, _>>()?;
    if fields.len() < 2 {
        return Err(FraError::Format(format!(
            "`{key}` needs frequency and level, got {} fields",
            fields.len()
        )));
    }
    Ok(StimulusEvent {
        ordinal,
        frequency: fields[0],
        level: fields[1],
        extras: fields[2..].to_vec(),
        rise_time: fields.get(3).copied(),
    })
}

/// Something that can hand over the two companion resources of a recording.
pub trait RecordingStore: Sync {
    fn open(&self, stem: &str) -> Result<(DataResource, HeaderResource), FraError>;
}

/// In-memory store useful for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    recordings: HashMap<String, (DataResource, HeaderResource)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stem: impl Into<String>, data: DataResource, header: HeaderResource) {
        self.recordings.insert(stem.into(), (data, header));
    }
}

impl RecordingStore for MemoryStore {
    fn open(&self, stem: &str) -> Result<(DataResource, HeaderResource), FraError> {
        self.recordings
            .get(stem)
            .cloned()
            .ok_or_else(|| FraError::ResourceUnavailable {
                stem: stem.to_string(),
                reason: "not in store".into(),
            })
    }
}

/// Reads `<root>/<stem><data_suffix>` and `<root>/<stem><header_suffix>` as JSON.
pub struct DirectoryStore {
    root: PathBuf,
    data_suffix: String,
    header_suffix: String,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            data_suffix: "d.json".into(),
            header_suffix: "h.json".into(),
        }
    }

    pub fn with_suffixes(mut self, data: &str, header: &str) -> Self {
        self.data_suffix = data.to_string();
        self.header_suffix = header.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, stem: &str, suffix: &str) -> Result<String, FraError> {
        let path = self.root.join(format!("{stem}{suffix}"));
        fs::read_to_string(&path).map_err(|e| FraError::ResourceUnavailable {
            stem: stem.to_string(),
            reason: format!("{}: {e}", path.display()),
        })
    }
}

impl RecordingStore for DirectoryStore {
    fn open(&self, stem: &str) -> Result<(DataResource, HeaderResource), FraError> {
        let data: DataResource = serde_json::from_str(&self.read(stem, &self.data_suffix)?)?;
        let header: HeaderResource =
            serde_json::from_str(&self.read(stem, &self.header_suffix)?)?;
        Ok((data, header))
    }
}
