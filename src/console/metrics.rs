use serde::Serialize;

use crate::helpers::clamp_percent;

/// Small deterministic generator (splitmix64). Good enough for mock data and
/// placeholder metrics; never used for anything security related.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform float in `[lo, hi)`.
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + unit * (hi - lo)
    }

    /// Uniform integer in `[lo, hi]`.
    pub fn range_u32(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as u64 + 1;
        lo + (self.next_u64() % span) as u32
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LiveUsage {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub network: f64,
}

impl LiveUsage {
    pub fn clamped(self) -> Self {
        Self {
            cpu: clamp_percent(self.cpu),
            memory: clamp_percent(self.memory),
            disk: clamp_percent(self.disk),
            network: clamp_percent(self.network),
        }
    }
}

/// Source of instantaneous and historical usage numbers for the dashboard.
pub trait MetricsSource: Send {
    fn current(&mut self) -> LiveUsage;

    /// `points` samples of cpu and memory usage, oldest first.
    fn trend(&mut self, points: usize) -> Vec<LiveUsage>;
}

/// Placeholder metrics: random values in fixed bands. Stands in until a real
/// metrics backend is wired up.
pub struct SimulatedMetrics {
    rng: SeededRng,
}

impl SimulatedMetrics {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SeededRng::new(seed),
        }
    }
}

impl MetricsSource for SimulatedMetrics {
    fn current(&mut self) -> LiveUsage {
        LiveUsage {
            cpu: self.rng.range_f64(20.0, 80.0),
            memory: self.rng.range_f64(30.0, 90.0),
            disk: self.rng.range_f64(40.0, 70.0),
            network: self.rng.range_f64(10.0, 60.0),
        }
    }

    fn trend(&mut self, points: usize) -> Vec<LiveUsage> {
        (0..points).map(|_| self.current()).collect()
    }
}
