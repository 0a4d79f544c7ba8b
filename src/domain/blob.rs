//! Opaque attachment references and upload progress observation.
//!
//! An [`ExternalBlob`] stands in for binary attachment data without the rest
//! of the crate knowing how it is stored: it is either raw bytes staged on the
//! client or a direct-access URL handed back by the backend. Upload progress
//! is observed as a single-consumer stream of monotonically non-decreasing
//! percentages that terminates at 100 or on failure.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use url::Url;

/// Handle to binary attachment data, resolvable to bytes or a direct URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalBlob {
    source: BlobSource,
    #[serde(skip)]
    progress: Option<ProgressReporter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BlobSource {
    Bytes(Bytes),
    Remote(Url),
}

impl PartialEq for ExternalBlob {
    /// Equality compares only the blob's source; the progress reporter is
    /// transport state, not identity.
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl ExternalBlob {
    /// Stage raw bytes read from the client once at submit time.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            source: BlobSource::Bytes(bytes.into()),
            progress: None,
        }
    }

    /// Reference an already-stored attachment by its direct-access URL.
    pub fn from_url(url: Url) -> Self {
        Self {
            source: BlobSource::Remote(url),
            progress: None,
        }
    }

    /// The staged bytes, if this blob was built from bytes.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.source {
            BlobSource::Bytes(bytes) => Some(bytes),
            BlobSource::Remote(_) => None,
        }
    }

    /// The direct-access URL, if this blob references stored data.
    pub fn direct_url(&self) -> Option<&Url> {
        match &self.source {
            BlobSource::Bytes(_) => None,
            BlobSource::Remote(url) => Some(url),
        }
    }

    pub fn len(&self) -> usize {
        match &self.source {
            BlobSource::Bytes(bytes) => bytes.len(),
            BlobSource::Remote(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach a progress stream to this blob.
    ///
    /// Returns the blob carrying a [`ProgressReporter`] for the transport to
    /// drive, plus the stream the submitting widget consumes.
    pub fn with_upload_progress(mut self) -> (Self, UploadProgress) {
        let (reporter, progress) = ProgressReporter::channel();
        self.progress = Some(reporter);
        (self, progress)
    }

    /// The reporter the actor implementation drives during upload, if any.
    pub fn progress_reporter(&self) -> Option<&ProgressReporter> {
        self.progress.as_ref()
    }
}

/// A single observed step of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Percent complete, 0 through 100.
    Percent(u8),
    /// The upload failed; no further updates follow.
    Failed,
}

/// Producer side of an upload progress stream.
///
/// Regressive or duplicate percentages are dropped so consumers always see a
/// monotonically non-decreasing sequence. Once 100 or a failure has been
/// reported the reporter goes quiet.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
    last: Arc<AtomicU8>,
    started: Arc<AtomicBool>,
    done: Arc<AtomicBool>,
}

impl ProgressReporter {
    fn channel() -> (Self, UploadProgress) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                last: Arc::new(AtomicU8::new(0)),
                started: Arc::new(AtomicBool::new(false)),
                done: Arc::new(AtomicBool::new(false)),
            },
            UploadProgress {
                rx,
                finished: false,
            },
        )
    }

    /// Report percent complete; clamped to 100, regressions and duplicates ignored.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        if self.done.load(Ordering::SeqCst) {
            return;
        }
        let previous = self.last.load(Ordering::SeqCst);
        if percent < previous || (percent == previous && self.started.load(Ordering::SeqCst)) {
            return;
        }
        self.last.store(percent, Ordering::SeqCst);
        self.started.store(true, Ordering::SeqCst);
        let _ = self.tx.send(ProgressUpdate::Percent(percent));
        if percent == 100 {
            self.done.store(true, Ordering::SeqCst);
        }
    }

    /// Terminate the stream with a failure.
    pub fn fail(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.tx.send(ProgressUpdate::Failed);
    }
}

/// Consumer side of an upload progress stream.
///
/// Yields [`ProgressUpdate::Percent`] values in non-decreasing order and ends
/// after `Percent(100)`, a [`ProgressUpdate::Failed`], or once the reporter is
/// dropped.
pub struct UploadProgress {
    rx: mpsc::UnboundedReceiver<ProgressUpdate>,
    finished: bool,
}

impl Stream for UploadProgress {
    type Item = ProgressUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(update)) => {
                if matches!(update, ProgressUpdate::Percent(100) | ProgressUpdate::Failed) {
                    self.finished = true;
                }
                Poll::Ready(Some(update))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[test]
    fn blob_from_bytes_exposes_bytes_only() {
        let blob = ExternalBlob::from_bytes(vec![1u8, 2, 3]);
        assert_eq!(blob.bytes().map(|b| b.len()), Some(3));
        assert!(blob.direct_url().is_none());
        assert!(!blob.is_empty());
    }

    #[test]
    fn blob_from_url_exposes_url_only() {
        let url = Url::parse("https://store.example/blobs/42").expect("valid url");
        let blob = ExternalBlob::from_url(url.clone());
        assert_eq!(blob.direct_url(), Some(&url));
        assert!(blob.bytes().is_none());
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_terminates_at_hundred() {
        let (blob, progress) = ExternalBlob::from_bytes(vec![0u8; 8]).with_upload_progress();
        let reporter = blob.progress_reporter().expect("reporter attached").clone();

        reporter.report(25);
        reporter.report(10); // regression, dropped
        reporter.report(25); // duplicate, dropped
        reporter.report(80);
        reporter.report(100);
        reporter.report(100); // after completion, dropped

        let updates: Vec<ProgressUpdate> = progress.collect().await;
        assert_eq!(
            updates,
            vec![
                ProgressUpdate::Percent(25),
                ProgressUpdate::Percent(80),
                ProgressUpdate::Percent(100),
            ]
        );
    }

    #[tokio::test]
    async fn progress_terminates_on_failure() {
        let (blob, progress) = ExternalBlob::from_bytes(vec![0u8; 8]).with_upload_progress();
        let reporter = blob.progress_reporter().expect("reporter attached").clone();

        reporter.report(40);
        reporter.fail();
        reporter.report(90); // after failure, dropped

        let updates: Vec<ProgressUpdate> = progress.collect().await;
        assert_eq!(
            updates,
            vec![ProgressUpdate::Percent(40), ProgressUpdate::Failed]
        );
    }

    #[tokio::test]
    async fn stream_ends_when_reporter_is_dropped() {
        let (blob, progress) = ExternalBlob::from_bytes(vec![0u8; 8]).with_upload_progress();
        blob.progress_reporter()
            .expect("reporter attached")
            .report(30);
        drop(blob);

        let updates: Vec<ProgressUpdate> = progress.collect().await;
        assert_eq!(updates, vec![ProgressUpdate::Percent(30)]);
    }
}
