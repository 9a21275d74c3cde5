use std::{fs::File, io::BufWriter, path::Path};

use serde::{Deserialize, Serialize};

use crate::{BodyState, Result, Scenario};

/// Configuration options for the trace recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSettings {
    /// Keep one frame out of every `stride` offered.
    pub stride: usize,
    /// Upper bound on stored frames; later frames are dropped.
    pub max_frames: Option<usize>,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            stride: 1,
            max_frames: None,
        }
    }
}

/// Summary of one engine step as written to a trace file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub time: f64,
    pub source: BodyState,
    pub observer: BodyState,
    pub wavefront_count: usize,
    pub observed_frequency: Option<f64>,
    pub detected: bool,
}

#[derive(Debug, Serialize)]
struct TraceFile<'a> {
    scenario: Scenario,
    frames: &'a [FrameRecord],
}

/// Collects per-frame records and persists them as JSON.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    settings: TraceSettings,
    frames: Vec<FrameRecord>,
    offered: usize,
    is_recording: bool,
}

impl TraceRecorder {
    pub fn new(settings: TraceSettings) -> Self {
        Self {
            settings,
            frames: Vec::new(),
            offered: 0,
            is_recording: false,
        }
    }

    pub fn start(&mut self) {
        self.frames.clear();
        self.offered = 0;
        self.is_recording = true;
    }

    pub fn stop(&mut self) {
        self.is_recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn record(&mut self, frame: FrameRecord) {
        if !self.is_recording {
            return;
        }

        let stride = self.settings.stride.max(1);
        let keep = self.offered % stride == 0;
        self.offered += 1;
        if !keep {
            return;
        }

        if let Some(limit) = self.settings.max_frames {
            if self.frames.len() >= limit {
                return;
            }
        }
        self.frames.push(frame);
    }

    pub fn to_json(&self, scenario: Scenario) -> Result<String> {
        let trace = TraceFile {
            scenario,
            frames: &self.frames,
        };
        Ok(serde_json::to_string_pretty(&trace)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>, scenario: Scenario) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        let trace = TraceFile {
            scenario,
            frames: &self.frames,
        };
        serde_json::to_writer_pretty(writer, &trace)?;
        tracing::info!(path = ?path.as_ref(), frames = self.frames.len(), "trace written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector2;

    fn frame(time: f64) -> FrameRecord {
        let state = BodyState {
            position: Vector2::new(1.0, 2.0),
            velocity: Vector2::zeros(),
            is_actively_controlled: false,
        };
        FrameRecord {
            time,
            source: state,
            observer: state,
            wavefront_count: 3,
            observed_frequency: Some(4.0),
            detected: false,
        }
    }

    #[test]
    fn ignores_frames_while_stopped() {
        let mut recorder = TraceRecorder::new(TraceSettings::default());
        recorder.record(frame(0.0));
        assert!(recorder.frames().is_empty());

        recorder.start();
        recorder.record(frame(0.1));
        recorder.stop();
        recorder.record(frame(0.2));
        assert_eq!(recorder.frames().len(), 1);
    }

    #[test]
    fn honours_stride_and_limit() {
        let mut recorder = TraceRecorder::new(TraceSettings {
            stride: 3,
            max_frames: Some(2),
        });
        recorder.start();
        for i in 0..10 {
            recorder.record(frame(i as f64));
        }

        let times: Vec<f64> = recorder.frames().iter().map(|f| f.time).collect();
        assert_eq!(times, vec![0.0, 3.0]);
    }

    #[test]
    fn serializes_scenario_and_frames() {
        let mut recorder = TraceRecorder::new(TraceSettings::default());
        recorder.start();
        recorder.record(frame(0.5));

        let json = recorder.to_json(Scenario::SourceApproaching).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["scenario"], "SourceApproaching");
        assert_eq!(value["frames"][0]["time"], 0.5);
        assert_eq!(value["frames"][0]["observed_frequency"], 4.0);
    }

    #[test]
    fn writes_trace_file() {
        let mut recorder = TraceRecorder::new(TraceSettings::default());
        recorder.start();
        recorder.record(frame(0.0));

        let path = std::env::temp_dir().join(format!("doppler-trace-{}.json", std::process::id()));
        recorder.write_to(&path, Scenario::Free).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(raw.contains("\"wavefront_count\": 3"));
    }
}
