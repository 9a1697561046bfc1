/// Events emitted while a perception cycle runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    ScanStart { total_channels: u64 },
    ChannelScanned { locator: String },
    ScanFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards progress events to an optional callback.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn silent_reporter_accepts_events() {
        ProgressReporter::new().report(Progress::PhaseFinish);
    }

    #[test]
    fn callback_receives_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        reporter.report(Progress::ScanStart { total_channels: 2 });
        reporter.report(Progress::ChannelScanned {
            locator: "job.log".to_string(),
        });
        reporter.report(Progress::ScanFinish);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Progress::ScanStart { total_channels: 2 },
                Progress::ChannelScanned {
                    locator: "job.log".to_string()
                },
                Progress::ScanFinish,
            ]
        );
    }
}
