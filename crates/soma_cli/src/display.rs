use soma_reasoning::{Entry, Snapshot, Source};

const RESET: &str = "\x1b[0m";
const GRAY: &str = "\x1b[90m";

fn color(source: Source) -> &'static str {
    match source {
        Source::Sense => "\x1b[36m",
        Source::Bio => "\x1b[33m",
        Source::Psych => "\x1b[34m",
        Source::Mind => "\x1b[32m",
    }
}

/// Terminal renderer. One line per entry: simulated time, source tag, text.
#[derive(Debug, Clone, Copy)]
pub struct Display {
    color: bool,
}

impl Display {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn render(&self, entry: &Entry) -> String {
        let time = entry.timestamp.format("%H:%M:%S");
        let tag = entry.source.name().to_uppercase();
        if self.color {
            format!(
                "{GRAY}{time}{RESET} {}[{tag:<5}]{RESET} {entry}",
                color(entry.source)
            )
        } else {
            format!("{time} [{tag:<5}] {entry}")
        }
    }

    pub fn entry(&self, entry: &Entry) {
        println!("{}", self.render(entry));
    }

    /// Out-of-band notice from the shell itself.
    pub fn notice(&self, text: &str) {
        if self.color {
            println!("{GRAY}-- {text}{RESET}");
        } else {
            println!("-- {text}");
        }
    }

    pub fn status(&self, snapshot: &Snapshot) {
        let bio = &snapshot.bio;
        self.notice(&format!(
            "{}{}",
            snapshot.sim_time.format("%Y-%m-%d %H:%M:%S"),
            if snapshot.paused { " (paused)" } else { "" }
        ));
        self.notice(&format!(
            "body: temp {:.1}C, heart {:.0} bpm, sugar {:.2}, hydration {:.2}, fatigue {:.2}, pain {:.2}",
            bio.body_temp, bio.heart_rate, bio.blood_sugar, bio.hydration, bio.fatigue, bio.pain
        ));
        self.notice(&format!("mind: {}", snapshot.psych.summary()));
    }
}
