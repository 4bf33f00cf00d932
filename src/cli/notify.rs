use std::io::Write;

/// Transient, non-fatal messages for the user.
pub trait Notifier {
    fn notice(&mut self, message: &str);
}

/// Prints notices to stderr.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notice(&mut self, message: &str) {
        let _ = writeln!(std::io::stderr(), "{}", message);
    }
}

/// Keeps notices in memory.
#[derive(Debug, Default)]
pub struct CollectNotifier {
    pub notices: Vec<String>,
}

impl Notifier for CollectNotifier {
    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
