//! Telemetry Sampler
//!
//! Turns a monotonically increasing under-run counter plus instantaneous
//! resource usage into per-tick samples. The counter baseline is state owned
//! by the [`Sampler`] and threaded through successive calls.

use crate::command_exec::CommandRunner;
use crate::error::{AirtightError, Result};
use crate::telemetry::TelemetrySample;
use chrono::Utc;
use std::time::Duration;
use sysinfo::System;
use tracing::{debug, warn};

/// Source of the cumulative under-run count
pub trait UnderrunCounter {
    fn total_underruns(&mut self) -> Result<u64>;
}

/// Source of instantaneous resource usage
pub trait ResourceGauge {
    /// Global CPU usage since the previous call, 0-100
    fn cpu_percent(&mut self) -> f32;

    /// Memory usage, 0-100
    fn ram_percent(&mut self) -> f32;
}

/// Reads the PipeWire graph error counters from `pw-top`
pub struct PwTopCounter<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> PwTopCounter<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> UnderrunCounter for PwTopCounter<R> {
    fn total_underruns(&mut self) -> Result<u64> {
        if !self.runner.is_available("pw-top") {
            return Err(AirtightError::DependencyMissing("pw-top".to_string()));
        }
        let output = self.runner.run("pw-top", &["-b", "-n", "1"])?;
        if !output.success() {
            return Err(AirtightError::DependencyMissing(format!(
                "pw-top ({})",
                output.failure_summary()
            )));
        }
        Ok(parse_pw_top_errors(&output.stdout))
    }
}

/// Sum the `ERR` column of the last table in batch-mode `pw-top` output
pub fn parse_pw_top_errors(output: &str) -> u64 {
    let mut err_column: Option<usize> = None;
    let mut total = 0u64;

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if let Some(idx) = fields.iter().position(|f| *f == "ERR") {
            // A new header starts a new table
            err_column = Some(idx);
            total = 0;
            continue;
        }
        if let Some(idx) = err_column {
            if let Some(count) = fields.get(idx).and_then(|f| f.parse::<u64>().ok()) {
                total += count;
            }
        }
    }

    total
}

/// CPU and memory usage via sysinfo
pub struct SysinfoGauge {
    system: System,
}

impl SysinfoGauge {
    /// Primes the CPU counters so the first reading is meaningful
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        Self { system }
    }
}

impl Default for SysinfoGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceGauge for SysinfoGauge {
    fn cpu_percent(&mut self) -> f32 {
        self.system.refresh_cpu_usage();
        self.system.global_cpu_info().cpu_usage()
    }

    fn ram_percent(&mut self) -> f32 {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return 0.0;
        }
        (self.system.used_memory() as f64 / total as f64 * 100.0) as f32
    }
}

/// Produces samples from a counter and a gauge
pub struct Sampler<C: UnderrunCounter, G: ResourceGauge> {
    counter: C,
    gauge: G,
    baseline: Option<u64>,
    high_cpu_percent: f32,
    counter_warned: bool,
}

impl<C: UnderrunCounter, G: ResourceGauge> Sampler<C, G> {
    /// Reads the counter once to establish the baseline
    pub fn new(counter: C, gauge: G, high_cpu_percent: f32) -> Self {
        let mut sampler = Self {
            counter,
            gauge,
            baseline: None,
            high_cpu_percent,
            counter_warned: false,
        };
        sampler.baseline = sampler.read_counter();
        sampler
    }

    pub fn baseline(&self) -> Option<u64> {
        self.baseline
    }

    fn read_counter(&mut self) -> Option<u64> {
        match self.counter.total_underruns() {
            Ok(total) => Some(total),
            Err(e) => {
                if !self.counter_warned {
                    warn!("Under-run counter unavailable, reporting zero: {}", e);
                    self.counter_warned = true;
                }
                None
            }
        }
    }

    /// Under-runs since the last successful read.
    ///
    /// A failed read reports zero and keeps the baseline; a counter that went
    /// backwards (audio server restarted) rebases without reporting.
    fn new_underruns(&mut self) -> u64 {
        let Some(current) = self.read_counter() else {
            return 0;
        };
        let delta = match self.baseline {
            Some(previous) if current >= previous => current - previous,
            Some(previous) => {
                debug!("Under-run counter reset ({} -> {})", previous, current);
                0
            }
            None => 0,
        };
        self.baseline = Some(current);
        delta
    }

    /// Take one sample
    pub fn sample(&mut self) -> TelemetrySample {
        let cpu = self.gauge.cpu_percent();
        let ram = self.gauge.ram_percent();
        let new_underruns = self.new_underruns();
        TelemetrySample::new(Utc::now(), cpu, ram, new_underruns, self.high_cpu_percent)
    }

    /// Sample `ticks` times, blocking `interval` between ticks.
    ///
    /// `on_sample` sees each sample as it is taken. Only a complete window
    /// is returned.
    pub fn collect_window<F>(
        &mut self,
        ticks: u32,
        interval: Duration,
        mut on_sample: F,
    ) -> Vec<TelemetrySample>
    where
        F: FnMut(&TelemetrySample),
    {
        let mut samples = Vec::with_capacity(ticks as usize);
        for tick in 0..ticks {
            let sample = self.sample();
            on_sample(&sample);
            samples.push(sample);
            if tick + 1 < ticks && !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
        samples
    }
}
