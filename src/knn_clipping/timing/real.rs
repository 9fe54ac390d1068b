use std::time::{Duration, Instant};

/// Timer that tracks elapsed time when timing is enabled.
pub struct Timer(Instant);

impl Timer {
    #[inline]
    pub fn start() -> Self {
        Self(Instant::now())
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Wall-clock time per pipeline phase. Phases that did not run stay zero.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimings {
    pub total: Duration,
    pub preprocess: Duration,
    pub knn_build: Duration,
    pub hull: Duration,
    pub cell_construction: Duration,
    pub assemble: Duration,
    pub areas: Duration,
    pub density: Duration,
    pub normalize: Duration,
}

impl PhaseTimings {
    fn phases(&self) -> [(&'static str, Duration); 8] {
        [
            ("preprocess", self.preprocess),
            ("knn_build", self.knn_build),
            ("hull", self.hull),
            ("cell_construction", self.cell_construction),
            ("assemble", self.assemble),
            ("areas", self.areas),
            ("density", self.density),
            ("normalize", self.normalize),
        ]
    }

    pub fn report(&self, label: &str, n: usize) {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        let total_secs = self.total.as_secs_f64();
        let pct = |d: Duration| {
            if total_secs > 0.0 {
                d.as_secs_f64() / total_secs * 100.0
            } else {
                0.0
            }
        };

        tracing::info!(label, n, total_ms = ms(self.total), "timing");
        for (phase, d) in self.phases() {
            if d.as_nanos() > 0 {
                tracing::info!(label, phase, ms = ms(d), pct = pct(d), "phase");
            }
        }
    }
}

/// Collects phase durations; `finish` stamps the total since `new`.
pub struct TimingBuilder {
    start: Instant,
    timings: PhaseTimings,
}

impl TimingBuilder {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            timings: PhaseTimings::default(),
        }
    }

    pub fn set_preprocess(&mut self, d: Duration) {
        self.timings.preprocess = d;
    }

    pub fn set_knn_build(&mut self, d: Duration) {
        self.timings.knn_build = d;
    }

    pub fn set_hull(&mut self, d: Duration) {
        self.timings.hull = d;
    }

    pub fn set_cell_construction(&mut self, d: Duration) {
        self.timings.cell_construction = d;
    }

    pub fn set_assemble(&mut self, d: Duration) {
        self.timings.assemble = d;
    }

    pub fn set_areas(&mut self, d: Duration) {
        self.timings.areas = d;
    }

    pub fn set_density(&mut self, d: Duration) {
        self.timings.density = d;
    }

    pub fn set_normalize(&mut self, d: Duration) {
        self.timings.normalize = d;
    }

    pub fn finish(mut self) -> PhaseTimings {
        self.timings.total = self.start.elapsed();
        self.timings
    }
}
