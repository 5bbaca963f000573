use crate::types::{CohortReport, GenerationSummary};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Telemetry sink the population manager reports to.
pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_cohort_complete(&mut self, generation: usize, report: &CohortReport);
    fn on_generation_complete(&mut self, summary: &GenerationSummary);
}

impl<C: ProgressCallback + ?Sized> ProgressCallback for &mut C {
    fn on_generation_start(&mut self, generation: usize) {
        (**self).on_generation_start(generation);
    }

    fn on_cohort_complete(&mut self, generation: usize, report: &CohortReport) {
        (**self).on_cohort_complete(generation, report);
    }

    fn on_generation_complete(&mut self, summary: &GenerationSummary) {
        (**self).on_generation_complete(summary);
    }
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        log::info!("Start generation {}", generation);
    }

    fn on_cohort_complete(&mut self, generation: usize, report: &CohortReport) {
        log::info!(
            "Generation {} cohort {}: {} steps, {}/{} survived, \
             {} loss deaths, {} stagnation deaths",
            generation,
            report.variant,
            report.steps,
            report.survivors,
            report.agents,
            report.loss_deaths,
            report.stagnation_deaths
        );
    }

    fn on_generation_complete(&mut self, summary: &GenerationSummary) {
        log::info!(
            "Generation {} complete. Best fitness: {:.4}, best ever: {:.4}{}",
            summary.generation,
            summary.best_fitness,
            summary.best_ever_fitness,
            if summary.checkpointed { " (checkpointed)" } else { "" }
        );
        for r in &summary.pool {
            let fate = match r.death {
                Some((cause, step)) => format!("{:?} at {}", cause, step),
                None => "alive".to_string(),
            };
            log::info!(
                "  agent {}/{} - fitness: {:.4}, prob: {:.4}, trades: {}, ptrades: {}, \
                 profit: {:.4}, steps: {}, holding: {}, b/s/h: {}/{}/{}, {}",
                r.generation,
                r.agent_id,
                r.fitness,
                r.probability,
                r.trade_count,
                r.profitable_trade_count,
                r.profit,
                r.step_count,
                r.holding_steps,
                r.actions.buy,
                r.actions.sell,
                r.actions.hold,
                fate
            );
        }
    }
}

// For handing progress to another thread
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

pub enum ProgressMessage {
    GenerationStart(usize),
    CohortComplete { generation: usize, report: CohortReport },
    GenerationComplete(GenerationSummary),
}

impl ChannelProgressCallback {
    pub fn new(sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_cohort_complete(&mut self, generation: usize, report: &CohortReport) {
        let _ = self.sender.send(ProgressMessage::CohortComplete {
            generation,
            report: report.clone(),
        });
    }

    fn on_generation_complete(&mut self, summary: &GenerationSummary) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete(summary.clone()));
    }
}

#[derive(Serialize)]
struct RunLogLine<'a> {
    timestamp: String,
    #[serde(flatten)]
    summary: &'a GenerationSummary,
}

/// Appends one timestamped JSON line per generation to a run log file.
/// Write failures are logged and otherwise ignored.
pub struct RunLogCallback {
    path: PathBuf,
}

impl RunLogCallback {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, summary: &GenerationSummary) -> crate::error::Result<()> {
        let line = serde_json::to_string(&RunLogLine {
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
        })?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl ProgressCallback for RunLogCallback {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_cohort_complete(&mut self, _generation: usize, _report: &CohortReport) {}

    fn on_generation_complete(&mut self, summary: &GenerationSummary) {
        if let Err(e) = self.append(summary) {
            log::warn!("Failed to append to run log {}: {}", self.path.display(), e);
        }
    }
}

/// Fans every event out to several callbacks, in order.
#[derive(Default)]
pub struct ProgressFanout {
    callbacks: Vec<Box<dyn ProgressCallback>>,
}

impl ProgressFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, callback: impl ProgressCallback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }
}

impl ProgressCallback for ProgressFanout {
    fn on_generation_start(&mut self, generation: usize) {
        for c in self.callbacks.iter_mut() {
            c.on_generation_start(generation);
        }
    }

    fn on_cohort_complete(&mut self, generation: usize, report: &CohortReport) {
        for c in self.callbacks.iter_mut() {
            c.on_cohort_complete(generation, report);
        }
    }

    fn on_generation_complete(&mut self, summary: &GenerationSummary) {
        for c in self.callbacks.iter_mut() {
            c.on_generation_complete(summary);
        }
    }
}
