use camino::Utf8PathBuf;
use glassprobe_config::DISCARD_SINK;
use glassprobe_core::MeasureError;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Where downloaded bytes go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SinkDestination {
    #[default]
    Discard,
    File(Utf8PathBuf),
}

impl SinkDestination {
    /// `"/dev/null"` and the empty string mean discard; anything else is a file path.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == DISCARD_SINK {
            SinkDestination::Discard
        } else {
            SinkDestination::File(Utf8PathBuf::from(s))
        }
    }
}

/// Open output for one session. Partial contents are expected when a
/// transfer stops early.
#[derive(Debug)]
pub enum ByteSink {
    Discard,
    File(File),
}

impl ByteSink {
    pub async fn open(dest: &SinkDestination) -> Result<Self, MeasureError> {
        match dest {
            SinkDestination::Discard => Ok(ByteSink::Discard),
            SinkDestination::File(path) => File::create(path.as_std_path())
                .await
                .map(ByteSink::File)
                .map_err(|e| MeasureError::Sink(format!("failed to create {path}: {e}"))),
        }
    }

    pub async fn write(&mut self, buf: &[u8]) -> Result<(), MeasureError> {
        match self {
            ByteSink::Discard => Ok(()),
            ByteSink::File(f) => f
                .write_all(buf)
                .await
                .map_err(|e| MeasureError::Sink(e.to_string())),
        }
    }

    pub async fn flush(&mut self) -> Result<(), MeasureError> {
        match self {
            ByteSink::Discard => Ok(()),
            ByteSink::File(f) => f.flush().await.map_err(|e| MeasureError::Sink(e.to_string())),
        }
    }
}
