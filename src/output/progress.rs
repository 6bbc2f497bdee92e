use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Spinner shown on stderr while a collector runs
pub struct CollectionProgress {
    pb: ProgressBar,
}

impl CollectionProgress {
    pub fn start(collector: &str, pipelines: usize) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Collection").underlined());
        let pb = create_spinner(
            bright_yellow(format!(
                "Collecting {collector} for {pipelines} pipeline(s)"
            ))
            .to_string(),
        );
        Self { pb }
    }

    pub fn finish(self, rows: usize) {
        self.pb
            .finish_with_message(bright_green(format!("Collected {rows} row(s) ✓")).to_string());
        eprintln!();
    }

    pub fn abandon(self) {
        self.pb.abandon();
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
