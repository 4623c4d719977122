//! CLI-specific progress handling
//!
//! A spinner for the terminal, with every checkpoint still going to the log.

use std::time::Duration;

use butterfly_edgeroute::ingest::{IngestObserver, IngestProgress, LogObserver, Phase};
use butterfly_edgeroute::prune::PruneReport;
use indicatif::{ProgressBar, ProgressStyle};

/// Creates a spinner for CLI display
pub fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Import observer showing a spinner and forwarding to [`LogObserver`]
pub struct ProgressManager {
    pub pb: ProgressBar,
    log: LogObserver,
}

impl ProgressManager {
    pub fn new(message: &str) -> Self {
        let pb = create_spinner();
        pb.set_message(message.to_string());
        Self {
            pb,
            log: LogObserver,
        }
    }

    /// Hidden spinner, log output only
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
            log: LogObserver,
        }
    }

    pub fn finish(&self, message: &str) {
        self.pb.finish_with_message(message.to_string());
    }
}

impl IngestObserver for ProgressManager {
    fn phase_started(&mut self, phase: Phase) {
        self.pb.set_message(format!("{phase}..."));
        let log = &mut self.log;
        self.pb.suspend(|| log.phase_started(phase));
    }

    fn phase_finished(&mut self, phase: Phase, elapsed: Duration) {
        let log = &mut self.log;
        self.pb.suspend(|| log.phase_finished(phase, elapsed));
    }

    fn ways_started(&mut self, progress: &IngestProgress) {
        self.pb.set_message("parsing ways...");
        let log = &mut self.log;
        self.pb.suspend(|| log.ways_started(progress));
    }

    fn progress(&mut self, p: &IngestProgress) {
        self.pb.set_message(format!(
            "{} elements, {} locations, {} edges",
            p.elements, p.locations, p.edges
        ));
        let log = &mut self.log;
        self.pb.suspend(|| log.progress(p));
    }

    fn slow_ways(&mut self, ways: u64, elapsed: Duration) {
        let log = &mut self.log;
        self.pb.suspend(|| log.slow_ways(ways, elapsed));
    }

    fn pruned(&mut self, report: &PruneReport) {
        let log = &mut self.log;
        self.pb.suspend(|| log.pruned(report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_manager_updates_message() {
        let mut manager = ProgressManager::hidden();
        manager.phase_started(Phase::Build);
        manager.progress(&IngestProgress {
            elements: 10,
            locations: 4,
            edges: 3,
            ..IngestProgress::default()
        });
        assert_eq!(manager.pb.message(), "10 elements, 4 locations, 3 edges");
        manager.finish("done");
    }
}
