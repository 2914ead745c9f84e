use std::time::Duration;

/// Accumulated per-stage durations across runs.
#[derive(Debug, Default, Clone)]
pub struct TimeCalc {
    runs: usize,
    duration: Vec<Duration>,
}

impl TimeCalc {
    pub fn total(&self) -> Duration {
        self.duration.iter().sum::<Duration>()
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Average duration of one full run.
    pub fn avg(&self) -> Duration {
        match self.runs {
            0 => Duration::ZERO,
            n => self.total() / n as u32,
        }
    }

    /// Average duration of stage `i`, if it was ever recorded.
    pub fn avg_i(&self, i: usize) -> Option<Duration> {
        match self.runs {
            0 => None,
            n => self.duration.get(i).map(|d| *d / n as u32),
        }
    }

    pub fn add_or_push(&mut self, i: usize, x: Duration) {
        if self.duration.len() <= i {
            self.duration.resize(i + 1, Duration::ZERO);
        }
        self.duration[i] += x;
    }

    /// Marks the end of one run.
    pub fn finish_run(&mut self) {
        self.runs += 1;
    }

    pub fn clear(&mut self) {
        self.runs = Default::default();
        self.duration = Default::default();
    }
}
