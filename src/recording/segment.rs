use std::cmp::Ordering;

use log::{debug, warn};
use serde::Serialize;

use crate::config::{AcquisitionConfig, TriggerConfig};
use crate::error::FraError;
use crate::recording::source::{DataResource, HeaderResource, StimulusEvent};

/// Fixed-length slice of the signal channel around one stimulus onset.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseWindow {
    pub tone_id: String,
    /// Sample index of the onset in the concatenated trace.
    pub onset: usize,
    pub samples: Vec<f64>,
}

/// A window joined with the stimulus that produced it.
#[derive(Clone, Debug)]
pub struct StimulusResponse {
    pub window: ResponseWindow,
    pub event: StimulusEvent,
}

impl StimulusResponse {
    pub fn tone_id(&self) -> &str {
        &self.window.tone_id
    }
}

/// Outcome of the `levels x frequencies == combinations` check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GridCheck {
    pub levels: usize,
    pub frequencies: usize,
    pub combinations: usize,
}

impl GridCheck {
    pub fn of(events: &[StimulusEvent]) -> Self {
        let mut levels: Vec<f64> = events.iter().map(|e| e.level).collect();
        let mut frequencies: Vec<f64> = events.iter().map(|e| e.frequency).collect();
        let mut pairs: Vec<(f64, f64)> = events.iter().map(|e| (e.level, e.frequency)).collect();
        sort_dedup(&mut levels);
        sort_dedup(&mut frequencies);
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        pairs.dedup_by(|a, b| a.0.total_cmp(&b.0) == Ordering::Equal && a.1.total_cmp(&b.1) == Ordering::Equal);
        Self {
            levels: levels.len(),
            frequencies: frequencies.len(),
            combinations: pairs.len(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.levels * self.frequencies == self.combinations
    }

    pub fn to_error(&self) -> FraError {
        FraError::GridInconsistency {
            levels: self.levels,
            frequencies: self.frequencies,
            combinations: self.combinations,
        }
    }
}

pub(crate) fn sort_dedup(values: &mut Vec<f64>) {
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
}

/// Windows of one recording plus its grid check.
#[derive(Clone, Debug)]
pub struct Segmentation {
    pub responses: Vec<StimulusResponse>,
    pub grid: GridCheck,
}

/// Sample indices where the trigger goes active after a quiet gap.
pub fn detect_onsets(trigger: &[f64], config: &TriggerConfig) -> Vec<usize> {
    let mut onsets = Vec::new();
    let mut previous: Option<usize> = None;
    for (index, &value) in trigger.iter().enumerate() {
        if value <= config.threshold {
            continue;
        }
        match previous {
            None => onsets.push(index),
            Some(last) if index - last > config.min_onset_gap => onsets.push(index),
            _ => {}
        }
        previous = Some(index);
    }
    onsets
}

/// Copy `[onset - pre, onset - pre + len)` out of `signal`, zero-filling
/// whatever falls outside the trace.
pub fn extract_window(signal: &[f64], onset: usize, acquisition: &AcquisitionConfig) -> Vec<f64> {
    let len = acquisition.window_len();
    let pre = acquisition.pre_samples();
    let mut window = vec![0.0; len];
    let start = onset as isize - pre as isize;
    for (offset, slot) in window.iter_mut().enumerate() {
        let index = start + offset as isize;
        if index < 0 {
            continue;
        }
        match signal.get(index as usize) {
            Some(&sample) => *slot = sample,
            None => break,
        }
    }
    window
}

pub struct Segmenter {
    acquisition: AcquisitionConfig,
    trigger: TriggerConfig,
}

impl Segmenter {
    pub fn new(acquisition: AcquisitionConfig, trigger: TriggerConfig) -> Self {
        Self {
            acquisition,
            trigger,
        }
    }

    /// Cut one recording into stimulus-locked windows.
    pub fn segment(
        &self,
        stem: &str,
        data: &DataResource,
        header: &HeaderResource,
        signal_channel: &str,
        trigger_channel: &str,
    ) -> Result<Segmentation, FraError> {
        let signal = data.channel(signal_channel)?;
        let trigger = data.channel(trigger_channel)?;
        let events = header.events()?;
        if header.tone_count() != events.len() {
            return Err(FraError::Format(format!(
                "header has {} tone entries but only {} numbered tones",
                header.tone_count(),
                events.len()
            )));
        }
        self.segment_traces(stem, &signal, &trigger, events)
    }

    pub fn segment_traces(
        &self,
        stem: &str,
        signal: &[f64],
        trigger: &[f64],
        events: Vec<StimulusEvent>,
    ) -> Result<Segmentation, FraError> {
        if signal.len() != trigger.len() {
            warn!(
                "{stem}: signal has {} samples, trigger has {}",
                signal.len(),
                trigger.len()
            );
        }
        let onsets = detect_onsets(trigger, &self.trigger);
        if onsets.is_empty() {
            return Err(FraError::EmptyTrigger);
        }
        if onsets.len() != events.len() {
            return Err(FraError::ToneCountMismatch {
                declared: events.len(),
                detected: onsets.len(),
            });
        }
        debug!("{stem}: onsets at {onsets:?}");

        let grid = GridCheck::of(&events);
        let responses = onsets
            .into_iter()
            .zip(events)
            .map(|(onset, event)| StimulusResponse {
                window: ResponseWindow {
                    tone_id: format!("{stem}/{:03}", event.ordinal),
                    onset,
                    samples: extract_window(signal, onset, &self.acquisition),
                },
                event,
            })
            .collect();
        Ok(Segmentation { responses, grid })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorCode;

    pub(crate) fn pulse_train(len: usize, onsets: &[usize], width: usize) -> Vec<f64> {
        let mut trigger = vec![0.0; len];
        for &onset in onsets {
            for sample in trigger.iter_mut().skip(onset).take(width) {
                *sample = 1.0;
            }
        }
        trigger
    }

    fn segmenter() -> Segmenter {
        Segmenter::new(AcquisitionConfig::default(), TriggerConfig::default())
    }

    #[test]
    fn recovers_known_onsets_in_order() {
        let onsets = [500, 2_000, 2_301, 9_000];
        let trigger = pulse_train(10_000, &onsets, 1);
        assert_eq!(detect_onsets(&trigger, &TriggerConfig::default()), onsets);
    }

    #[test]
    fn chatter_inside_one_pulse_is_one_onset() {
        let mut trigger = pulse_train(5_000, &[1_000], 200);
        trigger[1_050] = 0.0;
        trigger[1_120] = 0.2;
        // re-activation 300 samples after the last active one is still chatter
        trigger[1_499] = 1.0;
        assert_eq!(detect_onsets(&trigger, &TriggerConfig::default()), vec![1_000]);
    }

    #[test]
    fn threshold_is_strict() {
        let trigger = vec![0.0, 0.5, 0.5, 0.0];
        assert!(detect_onsets(&trigger, &TriggerConfig::default()).is_empty());
    }

    #[test]
    fn windows_keep_fixed_length_at_both_ends() {
        let acq = AcquisitionConfig::default();
        let signal: Vec<f64> = (0..1_000).map(|i| i as f64).collect();

        let early = extract_window(&signal, 50, &acq);
        assert_eq!(early.len(), acq.window_len());
        assert_eq!(early[149], 0.0);
        assert_eq!(early[150], 0.0);
        assert_eq!(early[151], 1.0);
        assert_eq!(early[200], 50.0);

        let late = extract_window(&signal, 900, &acq);
        assert_eq!(late.len(), acq.window_len());
        assert_eq!(late[0], 700.0);
        assert_eq!(late[299], 999.0);
        assert!(late[300..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn tone_count_mismatch_is_reported() {
        let trigger = pulse_train(10_000, &[1_000, 5_000], 10);
        let signal = vec![0.0; 10_000];
        let events = vec![
            StimulusEvent::new(0, 4_000.0, 60.0),
            StimulusEvent::new(1, 8_000.0, 60.0),
            StimulusEvent::new(2, 4_000.0, 40.0),
        ];
        let err = segmenter()
            .segment_traces("A001", &signal, &trigger, events)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ToneCountMismatch);
    }

    #[test]
    fn flat_trigger_is_empty_trigger() {
        let err = segmenter()
            .segment_traces(
                "A001",
                &[0.0; 100],
                &[0.0; 100],
                vec![StimulusEvent::new(0, 1.0, 1.0)],
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptyTrigger);
    }

    #[test]
    fn pairs_windows_with_header_by_ordinal() {
        let data = DataResource::from_channels([
            ("di0P", (0..10_000).map(|i| i as f64).collect::<Vec<_>>()),
            ("di4P", pulse_train(10_000, &[1_000, 5_000], 10)),
        ]);
        let header = HeaderResource::from_tones(&[(4_000.0, 60.0), (8_000.0, 60.0)]);
        let seg = segmenter()
            .segment("A007", &data, &header, "di0P", "di4P")
            .unwrap();
        assert_eq!(seg.responses.len(), 2);
        assert_eq!(seg.responses[1].tone_id(), "A007/001");
        assert_eq!(seg.responses[1].event.frequency, 8_000.0);
        assert_eq!(seg.responses[1].window.onset, 5_000);
        assert_eq!(seg.responses[1].window.samples[200], 5_000.0);
        assert!(seg.grid.is_consistent());
    }

    #[test]
    fn sparse_grid_is_flagged_not_dropped() {
        let trigger = pulse_train(10_000, &[100, 5_100], 20);
        let events = vec![
            StimulusEvent::new(0, 4_000.0, 60.0),
            StimulusEvent::new(1, 8_000.0, 40.0),
        ];
        let seg = segmenter()
            .segment_traces("A001", &vec![1.0; 10_000], &trigger, events)
            .unwrap();
        assert_eq!(seg.responses.len(), 2);
        assert!(!seg.grid.is_consistent());
        assert_eq!(seg.grid.to_error().code(), ErrorCode::GridInconsistency);
    }
}
