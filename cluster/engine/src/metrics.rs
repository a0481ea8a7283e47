use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

pub struct Metrics {
    latency: Mutex<Histogram<u64>>, // micros
    requests: Mutex<(Instant, u64)>,
    errors: Mutex<u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            latency: Mutex::new(Histogram::new(3).expect("hist")),
            requests: Mutex::new((Instant::now(), 0)),
            errors: Mutex::new(0),
        }
    }

    pub fn observe_request(&self, dur: Duration) {
        let micros = dur.as_micros() as u64;
        let _ = self.latency.lock().record(micros);
        self.requests.lock().1 += 1;
    }

    pub fn inc_error(&self) {
        *self.errors.lock() += 1;
    }

    pub fn request_count(&self) -> u64 {
        self.requests.lock().1
    }

    pub fn error_count(&self) -> u64 {
        *self.errors.lock()
    }

    pub fn format(&self) -> String {
        let h = self.latency.lock();
        let p50 = h.value_at_quantile(0.50) as f64 / 1000.0;
        let p95 = h.value_at_quantile(0.95) as f64 / 1000.0;
        let p99 = h.value_at_quantile(0.99) as f64 / 1000.0;

        // QPS since start
        let q = self.requests.lock();
        let elapsed = q.0.elapsed().as_secs_f64().max(1.0);
        let qps = q.1 as f64 / elapsed;
        let errors = *self.errors.lock();

        format!(
            "requests {}\nqps {:.2}\np50_ms {:.3}\np95_ms {:.3}\np99_ms {:.3}\nerrors {}\n",
            q.1, qps, p50, p95, p99, errors
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
