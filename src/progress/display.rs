//! Progress bar display management and coordination.
//!
//! [`ProgressDisplay`] is shared by the manager, the workers and the stats
//! aggregator. The manager grows the main bar on every submission, workers
//! drive one child bar per blob in transfer and the aggregator advances the
//! main bar once per processed blob.
//!
//! ```rust
//! use stor_client::progress::{ProgressDisplay, StyleOptions};
//!
//! let display = ProgressDisplay::new(StyleOptions::hidden());
//! display.add_expected();
//!
//! let child = display.create_child_progress(1024);
//! child.inc(1024);
//! display.finish_child(child);
//!
//! display.increment_main();
//! display.finish();
//! ```

use crate::progress::StyleOptions;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};

/// Progress display manager that coordinates multiple progress bars.
///
/// Cloning is cheap; every clone draws to the same bars.
#[derive(Clone)]
pub struct ProgressDisplay {
    multi: MultiProgress,
    main: ProgressBar,
    style_options: StyleOptions,
}

impl ProgressDisplay {
    /// Create a display whose main bar starts with no expected blobs.
    pub fn new(style_options: StyleOptions) -> Self {
        let multi = match style_options.is_enabled() {
            true => MultiProgress::new(),
            false => MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        };

        let main = multi.add(style_options.main().clone().to_progress_bar(0));
        main.tick();

        Self {
            multi,
            main,
            style_options,
        }
    }

    /// The main progress bar.
    pub fn main(&self) -> &ProgressBar {
        &self.main
    }

    /// Account for one more submitted blob.
    pub fn add_expected(&self) {
        self.main.inc_length(1);
    }

    /// Create a child progress bar for a blob of `size` bytes.
    ///
    /// `size` is 0 when the store did not announce a length.
    pub fn create_child_progress(&self, size: u64) -> ProgressBar {
        self.multi
            .add(self.style_options.child().clone().to_progress_bar(size))
    }

    /// Increment the main progress bar by one.
    pub fn increment_main(&self) {
        self.main.inc(1);
    }

    /// Finish a child progress bar based on configuration.
    pub fn finish_child(&self, pb: ProgressBar) {
        if self.style_options.child().clear {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
        self.multi.remove(&pb);
    }

    /// Finish the main bar, clearing or keeping it based on configuration.
    pub fn finish(&self) {
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }
}
