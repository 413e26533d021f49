//! Download progress reporting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Callback type for reporting download progress.
/// Arguments: source URL, bytes downloaded, total bytes (0 if unknown), MiB/s, is_complete
pub type ProgressFn = Arc<dyn Fn(&str, u64, u64, f64, bool) + Send + Sync>;

const BAR_TEMPLATE: &str =
    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// Returns the default progress function, which draws `indicatif` bars on stderr.
///
/// The bars are hidden automatically when stderr is not a terminal. Each
/// source URL gets its own bar, so one callback can be shared by concurrent
/// downloads; a bar is cleared when its download completes.
pub fn default_progress_fn() -> ProgressFn {
    let multi = MultiProgress::new();
    let bars: Mutex<HashMap<String, ProgressBar>> = Mutex::default();

    Arc::new(move |src: &str, current: u64, total: u64, _mib_per_sec: f64, complete: bool| {
        let Ok(mut bars) = bars.lock() else {
            return;
        };
        let bar = bars
            .entry(src.to_owned())
            .or_insert_with(|| multi.add(new_bar(src, total)));
        bar.set_position(current);
        if complete {
            if let Some(bar) = bars.remove(src) {
                bar.finish_and_clear();
                multi.remove(&bar);
            }
        }
    })
}

fn new_bar(src: &str, total: u64) -> ProgressBar {
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    let name = src.rsplit('/').next().unwrap_or(src);
    ProgressBar::new(total)
        .with_style(style)
        .with_message(format!("downloading {name}"))
}

/// Tracks elapsed time for a single download and feeds a [`ProgressFn`].
pub(crate) struct Reporter<'a> {
    progress: Option<&'a ProgressFn>,
    src: &'a str,
    total: u64,
    downloaded: u64,
    start: std::time::Instant,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(progress: Option<&'a ProgressFn>, src: &'a str, total: u64) -> Self {
        Self {
            progress,
            src,
            total,
            downloaded: 0,
            start: std::time::Instant::now(),
        }
    }

    pub(crate) fn advance(&mut self, bytes: usize) {
        self.downloaded += bytes as u64;
        self.report(false);
    }

    pub(crate) fn finish(&self) {
        self.report(true);
    }

    pub(crate) fn downloaded(&self) -> u64 {
        self.downloaded
    }

    fn report(&self, complete: bool) {
        if let Some(progress) = self.progress {
            let elapsed = self.start.elapsed().as_secs_f64();
            let mib_per_sec = if elapsed > 0.0 {
                (self.downloaded as f64) / (1024.0 * 1024.0) / elapsed
            } else {
                0.0
            };
            progress(self.src, self.downloaded, self.total, mib_per_sec, complete);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_accumulates_and_completes() {
        let seen: Arc<Mutex<Vec<(u64, bool)>>> = Arc::default();
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(
            move |_src: &str, current: u64, total: u64, _rate: f64, complete: bool| {
                assert_eq!(total, 10);
                sink.lock().unwrap().push((current, complete));
            },
        );

        let mut reporter = Reporter::new(Some(&progress), "https://example.com/a.zip", 10);
        reporter.advance(4);
        reporter.advance(6);
        reporter.finish();

        assert_eq!(reporter.downloaded(), 10);
        assert_eq!(*seen.lock().unwrap(), vec![(4, false), (10, false), (10, true)]);
    }

    #[test]
    fn default_progress_fn_accepts_updates() {
        let progress = default_progress_fn();
        progress("https://example.com/a.zip", 1, 2, 0.0, false);
        progress("https://example.com/a.zip", 2, 2, 0.0, true);
    }

    #[test]
    fn default_progress_fn_keeps_one_bar_per_source() {
        let progress = default_progress_fn();
        let a = "https://example.com/a.zip";
        let b = "https://example.com/b.zip";
        progress(a, 1, 4, 0.0, false);
        progress(b, 1, 8, 0.0, false);
        progress(a, 4, 4, 0.0, true);
        progress(b, 8, 8, 0.0, true);
        // a finished source starts a fresh bar
        progress(a, 1, 4, 0.0, false);
        progress(a, 4, 4, 0.0, true);
    }

    #[test]
    fn default_progress_fn_is_shared_across_threads() {
        let progress = default_progress_fn();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let progress = progress.clone();
                std::thread::spawn(move || {
                    let src = format!("https://example.com/{i}.zip");
                    for n in 1..=16 {
                        progress(&src, n, 16, 0.0, n == 16);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
