use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

/// A restartable producer of text lines.
///
/// Every call to [`LineSource::open`] must yield a reader positioned at the
/// beginning of the content, so that the same source can be scanned again in a
/// later perception cycle.
pub trait LineSource: fmt::Debug {
    /// A human-readable identity used in diagnostics (a path, a label, ...).
    fn locator(&self) -> String;

    /// Opens a fresh reader over the whole content of this source.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying content cannot be accessed.
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>>;

    /// Reports whether [`LineSource::open`] is expected to succeed.
    fn can_be_read(&self) -> bool {
        true
    }
}

/// Short in-memory text, one entry per line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSource {
    label: String,
    lines: Vec<String>,
}

impl TextSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: "text".to_string(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_line(line: impl Into<String>) -> Self {
        Self::new([line.into()])
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl LineSource for TextSource {
    fn locator(&self) -> String {
        format!("{} ({} lines)", self.label, self.lines.len())
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        let mut buffer = String::new();
        for line in &self.lines {
            buffer.push_str(line);
            buffer.push('\n');
        }
        Ok(Box::new(Cursor::new(buffer.into_bytes())))
    }
}

/// A text file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for FileSource {
    fn locator(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn can_be_read(&self) -> bool {
        self.path.is_file() && File::open(&self.path).is_ok()
    }
}

/// A snapshot of environment variables rendered as `KEY=VALUE` lines in
/// sorted key order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentSource {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSource {
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Captures the environment of the current process.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

impl LineSource for EnvironmentSource {
    fn locator(&self) -> String {
        format!("environment ({} variables)", self.vars.len())
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        let mut buffer = String::new();
        for (key, value) in &self.vars {
            buffer.push_str(key);
            buffer.push('=');
            buffer.push_str(value);
            buffer.push('\n');
        }
        Ok(Box::new(Cursor::new(buffer.into_bytes())))
    }

    fn can_be_read(&self) -> bool {
        !self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read_all(source: &dyn LineSource) -> Vec<String> {
        source
            .open()
            .unwrap()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn text_source_yields_its_lines() {
        let source = TextSource::new(["first", "second"]);
        assert_eq!(read_all(&source), vec!["first", "second"]);
    }

    #[test]
    fn text_source_is_restartable() {
        let source = TextSource::from_line("only line");
        assert_eq!(read_all(&source), read_all(&source));
    }

    #[test]
    fn empty_text_source_yields_nothing() {
        let source = TextSource::new(Vec::<String>::new());
        assert!(read_all(&source).is_empty());
    }

    #[test]
    fn file_source_reads_file_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PATH and blabla in file").unwrap();
        let source = FileSource::new(file.path());
        assert!(source.can_be_read());
        assert_eq!(read_all(&source), vec!["PATH and blabla in file"]);
        assert_eq!(source.locator(), file.path().display().to_string());
    }

    #[test]
    fn missing_file_cannot_be_read() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.log"));
        assert!(!source.can_be_read());
        assert!(source.open().is_err());
    }

    #[test]
    fn environment_source_renders_sorted_pairs() {
        let vars = BTreeMap::from([
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("HOME".to_string(), "/home/acc".to_string()),
        ]);
        let source = EnvironmentSource::new(vars);
        assert_eq!(read_all(&source), vec!["HOME=/home/acc", "PATH=/usr/bin"]);
    }

    #[test]
    fn empty_environment_cannot_be_read() {
        assert!(!EnvironmentSource::default().can_be_read());
    }
}
