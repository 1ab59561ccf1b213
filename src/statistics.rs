use chrono::{DateTime, Local};
use std::fmt;
use std::time::{Duration, Instant};

fn as_secs_f64(d: Duration) -> f64 {
    d.as_secs() as f64 + (d.subsec_nanos() as f64 / 1_000_000_000 as f64)
}

/// Per-call latency and byte samples of one kind of operation.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Stats {
    latency: Vec<Duration>,
    bytes: Vec<usize>,
}

impl Stats {
    pub fn new() -> Stats {
        Stats {
            latency: Vec::new(),
            bytes: Vec::new(),
        }
    }

    pub fn total_latency(&self) -> Duration {
        self.latency.iter().fold(Duration::new(0, 0), |acc, s| acc + *s)
    }

    pub fn total_bytes(&self) -> usize {
        self.bytes.iter().sum()
    }

    pub fn max_latency(&self) -> Option<Duration> {
        self.latency.iter().max().cloned()
    }

    pub fn record(&mut self, latency: Duration, bytes: usize) {
        self.latency.push(latency);
        self.bytes.push(bytes);
    }

    pub fn num_ops(&self) -> usize {
        self.bytes.len()
    }

    pub fn ops_per_second(&self) -> f64 {
        (self.num_ops() as f64) / as_secs_f64(self.total_latency())
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let total_latency = self.total_latency();
        let total_bytes = self.total_bytes();
        let num_ops = self.num_ops();
        let avg_latency = match total_latency.checked_div(num_ops as u32) {
            Some(quotient) => format!("{}.{:09}", quotient.as_secs(), quotient.subsec_nanos()),
            None => String::from("(inf)"),
        };
        write!(
            f,
            "Completed {} operations ({} bytes) in {}.{:09} s\n",
            num_ops,
            total_bytes,
            total_latency.as_secs(),
            total_latency.subsec_nanos()
        )?;
        write!(f, " - Average latency = {}\n", avg_latency)?;
        if let Some(max) = self.max_latency() {
            write!(f, " - Max latency = {}.{:09}\n", max.as_secs(), max.subsec_nanos())?;
        }
        write!(f, " - Bytes/Operation = {}\n", (total_bytes as f64) / (num_ops as f64))?;
        write!(f, " - Operations/Second = {}\n", self.ops_per_second())?;
        Ok(())
    }
}

impl ::std::ops::Add for Stats {
    type Output = Stats;
    fn add(self, rhs: Stats) -> Self::Output {
        Stats {
            latency: [&self.latency[..], &rhs.latency[..]].concat(),
            bytes: [&self.bytes[..], &rhs.bytes[..]].concat(),
        }
    }
}

/// Wall-clock span of one benchmark phase.
#[derive(Clone, Debug, Serialize)]
pub struct PhaseTiming {
    pub phase: String,
    pub started: String,
    pub finished: String,
    pub elapsed: Duration,
}

impl fmt::Display for PhaseTiming {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {}.{:09} s ({} .. {})",
            self.phase,
            self.elapsed.as_secs(),
            self.elapsed.subsec_nanos(),
            self.started,
            self.finished
        )
    }
}

/// Times a phase against both the monotonic and the local clock, logging
/// the local start and end like `date` would.
pub struct PhaseClock {
    phase: String,
    started_at: DateTime<Local>,
    start: Instant,
}

const CLOCK_FORMAT: &'static str = "%a %b %e %H:%M:%S %Y";

impl PhaseClock {
    pub fn start<S: Into<String>>(phase: S) -> PhaseClock {
        let phase = phase.into();
        let started_at = Local::now();
        info!("Start time: {} {}", phase, started_at.format(CLOCK_FORMAT));
        PhaseClock {
            phase: phase,
            started_at: started_at,
            start: Instant::now(),
        }
    }

    pub fn stop(self) -> PhaseTiming {
        let elapsed = self.start.elapsed();
        let finished_at = Local::now();
        info!("End time: {} {}", self.phase, finished_at.format(CLOCK_FORMAT));
        PhaseTiming {
            phase: self.phase,
            started: self.started_at.format(CLOCK_FORMAT).to_string(),
            finished: finished_at.format(CLOCK_FORMAT).to_string(),
            elapsed: elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_and_rates() {
        let mut stats = Stats::new();
        stats.record(Duration::from_millis(250), 10);
        stats.record(Duration::from_millis(750), 30);
        assert_eq!(stats.num_ops(), 2);
        assert_eq!(stats.total_bytes(), 40);
        assert_eq!(stats.total_latency(), Duration::from_secs(1));
        assert_eq!(stats.max_latency(), Some(Duration::from_millis(750)));
        assert!((stats.ops_per_second() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn add_merges_samples() {
        let mut a = Stats::new();
        a.record(Duration::from_millis(1), 1);
        let mut b = Stats::new();
        b.record(Duration::from_millis(2), 2);
        b.record(Duration::from_millis(3), 3);
        let total = a + b;
        assert_eq!(total.num_ops(), 3);
        assert_eq!(total.total_bytes(), 6);
        assert_eq!(total.total_latency(), Duration::from_millis(6));
    }

    #[test]
    fn empty_stats_display() {
        let text = Stats::new().to_string();
        assert!(text.starts_with("Completed 0 operations (0 bytes)"));
        assert!(text.contains("Average latency = (inf)"));
    }

    #[test]
    fn phase_clock_measures_elapsed() {
        let clock = PhaseClock::start("create");
        let timing = clock.stop();
        assert_eq!(timing.phase, "create");
        assert!(!timing.started.is_empty());
        assert!(!timing.finished.is_empty());
    }
}
