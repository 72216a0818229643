use indicatif::{ProgressBar, ProgressStyle};

pub struct BenchProgress {
    bar: ProgressBar,
    enabled: bool,
}

impl BenchProgress {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self {
                bar: ProgressBar::hidden(),
                enabled: false,
            };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            bar.set_style(style);
        }

        Self { bar, enabled: true }
    }

    pub fn update(&self, case: &str, iteration: u32, iterations: u32) {
        if self.enabled {
            self.bar
                .set_message(format!("{} | iteration {}/{}", case, iteration, iterations));
            self.bar.tick();
        }
    }

    pub fn finish(&self) {
        if self.enabled {
            self.bar.finish_and_clear();
        }
    }
}
