/// Runtime configuration shared by Resonar crates.
#[derive(Debug, Clone)]
pub struct Config {
    /// Worker threads for the [`crate::TaskPool`]. `None` picks one per CPU.
    pub worker_threads: Option<usize>,
    pub benchmark: BenchmarkMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            worker_threads: None,
            benchmark: BenchmarkMode::Off,
        }
    }
}

impl Config {
    /// Number of worker threads to spawn, never fewer than two so a blocked
    /// engine call cannot stall every continuation.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(num_cpus::get).max(2)
    }

    /// Apply the benchmark mode. Profiling needs the `profiling` feature.
    pub fn apply(&self) {
        match self.benchmark {
            BenchmarkMode::Off => {}
            BenchmarkMode::On => crate::profiling::init_profiling("127.0.0.1:8585"),
            BenchmarkMode::WithWebserver => crate::profiling::init_profiling("0.0.0.0:8585"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkMode {
    /// Benchmarking is disabled
    Off,
    /// Scopes are recorded and served on the loopback interface
    On,
    /// Scopes are recorded and served on every interface, for a remote `puffin_viewer`
    WithWebserver,
}
