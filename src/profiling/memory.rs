//! @ai:module:intent Background process-memory sampler with its own cadence
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResourceSampler, ResourceSeries, ProcessMemorySampler
//! @ai:module:stateless false

use serde::{Deserialize, Serialize};
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// @ai:intent Append-only time series attached verbatim to a workload report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSeries {
    pub interval_ms: u64,
    /// Milliseconds since the sampler started.
    pub timestamps_ms: Vec<u64>,
    pub rss_bytes: Vec<u64>,
    pub peak_rss_bytes: u64,
}

impl ResourceSeries {
    pub fn len(&self) -> usize {
        self.timestamps_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps_ms.is_empty()
    }
}

/// @ai:intent Trait for samplers that run independently of request pacing
pub trait ResourceSampler: Send {
    /// @ai:intent Begin sampling; a second call while running is ignored
    fn start(&mut self);

    /// @ai:intent Cancel sampling and return everything collected
    fn stop(&mut self) -> impl std::future::Future<Output = ResourceSeries> + Send;
}

#[derive(Debug)]
struct Sample {
    elapsed_ms: u64,
    rss_bytes: u64,
}

struct RunningSampler {
    stop_tx: oneshot::Sender<()>,
    samples_rx: mpsc::UnboundedReceiver<Sample>,
    task: JoinHandle<()>,
}

/// @ai:intent Samples this process's resident memory on a background task
pub struct ProcessMemorySampler {
    interval: Duration,
    running: Option<RunningSampler>,
}

impl ProcessMemorySampler {
    /// @ai:intent Create an idle sampler
    /// @ai:pre interval > 0
    /// @ai:effects pure
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// @ai:intent Read resident set size of `pid`, zero when unavailable
    /// @ai:effects io
    fn read_rss(sys: &mut System, pid: Option<Pid>) -> u64 {
        let Some(pid) = pid else {
            return 0;
        };

        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        sys.process(pid).map(|p| p.memory()).unwrap_or(0)
    }

    async fn sample_loop(
        interval: Duration,
        mut stop_rx: oneshot::Receiver<()>,
        samples_tx: mpsc::UnboundedSender<Sample>,
    ) {
        let pid = sysinfo::get_current_pid().ok();
        let mut sys = System::new();
        let started = Instant::now();

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    let sample = Sample {
                        elapsed_ms: started.elapsed().as_millis() as u64,
                        rss_bytes: Self::read_rss(&mut sys, pid),
                    };

                    if samples_tx.send(sample).is_err() {
                        break;
                    }
                }
            }
        }
    }
}

impl ResourceSampler for ProcessMemorySampler {
    /// @ai:effects spawn
    fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let (samples_tx, samples_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::sample_loop(self.interval, stop_rx, samples_tx));

        tracing::debug!("Memory sampler started ({:?} interval)", self.interval);

        self.running = Some(RunningSampler {
            stop_tx,
            samples_rx,
            task,
        });
    }

    /// @ai:effects state:write
    async fn stop(&mut self) -> ResourceSeries {
        let mut series = ResourceSeries {
            interval_ms: self.interval.as_millis() as u64,
            ..Default::default()
        };

        let Some(running) = self.running.take() else {
            return series;
        };

        let RunningSampler {
            stop_tx,
            mut samples_rx,
            task,
        } = running;

        let _ = stop_tx.send(());

        if let Err(e) = task.await {
            tracing::warn!("Memory sampler task ended abnormally: {}", e);
        }

        while let Ok(sample) = samples_rx.try_recv() {
            series.peak_rss_bytes = series.peak_rss_bytes.max(sample.rss_bytes);
            series.timestamps_ms.push(sample.elapsed_ms);
            series.rss_bytes.push(sample.rss_bytes);
        }

        tracing::debug!("Memory sampler stopped with {} samples", series.len());
        series
    }
}
