// file: src/pipeline/progress.rs
// description: progress bars for batch and file checkpoints during a run
// reference: uses indicatif for progress bars

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(total_files: usize, visible: bool) -> Self {
        Self::with_color(total_files, visible, true)
    }

    pub fn with_color(total_files: usize, visible: bool, colored: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let multi_progress = MultiProgress::with_draw_target(target);

        let main_bar = create_progress_bar(&multi_progress, total_files as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
        }
    }

    pub fn hidden() -> Self {
        Self::with_color(0, false, false)
    }

    pub fn start_batch(&self, batch: usize, total_batches: usize, files: usize) {
        self.main_bar
            .set_message(format!("batch {}/{} ({} files)", batch, total_batches, files));
    }

    pub fn file_done(&self, file_name: &str, imported: usize, failed: usize) {
        self.main_bar.inc(1);
        self.detail_bar.set_message(format!(
            "{} | imported: {} | failed: {}",
            file_name, imported, failed
        ));
    }

    pub fn position(&self) -> u64 {
        self.main_bar.position()
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("import complete");
        self.detail_bar.finish_and_clear();
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if !self.main_bar.is_finished() {
            self.finish();
        }
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let template = if colored {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"
    } else {
        "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"
    };
    let chars = if colored { "█▓▒░" } else { "=>-" };

    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars);
    bar.set_style(style);
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_tracker_counts_files() {
        let tracker = ProgressTracker::new(3, false);
        tracker.start_batch(1, 1, 3);
        tracker.file_done("a.html", 1, 0);
        tracker.file_done("b.html", 1, 0);

        assert_eq!(tracker.position(), 2);
        tracker.finish();
    }
}
