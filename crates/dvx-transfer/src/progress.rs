//! Progress reporting for transfer runs
//!
//! Observable side effect only; nothing here participates in correctness.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar over the run's units of work
pub fn unit_progress(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} units ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message("Transferring data values".to_string());
    pb
}

/// Create a spinner for indeterminate operations (catalog queries, probes)
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_progress_length() {
        let pb = unit_progress(42);
        assert_eq!(pb.length(), Some(42));
    }

    #[test]
    fn test_spinner_ticks() {
        let pb = spinner("Probing instances...");
        assert!(!pb.is_finished());
        pb.finish();
    }
}
