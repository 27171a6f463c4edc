// Sliding-window sequence construction
use super::telemetry::Reading;

/// Window length the shipped models were trained with
pub const DEFAULT_TIME_STEPS: usize = 30;

/// A fixed-length run of consecutive values, labelled with the timestamp of
/// the reading that immediately follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub values: Vec<f64>,
    pub label_time: String,
}

impl Window {
    pub fn width(&self) -> usize {
        self.values.len()
    }
}

/// Build `max(N - time_steps, 0)` overlapping windows.
///
/// Window `i` covers `readings[i..i + time_steps]` and carries the time of
/// `readings[i + time_steps]`, i.e. the first reading after the window.
pub fn create_sequences(readings: &[Reading], time_steps: usize) -> Vec<Window> {
    if time_steps == 0 {
        return Vec::new();
    }

    let count = readings.len().saturating_sub(time_steps);
    (0..count)
        .map(|i| Window {
            values: readings[i..i + time_steps].iter().map(|r| r.value).collect(),
            label_time: readings[i + time_steps].time.clone(),
        })
        .collect()
}
