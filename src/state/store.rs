use tokio::sync::watch;

use super::data::DataUri;

/// Holds the single image currently shown by the widget.
///
/// Every mutation is broadcast to subscribers, so anything that cares about
/// the image (the view, a test, a future uploader) can follow it without
/// knowing about iced.
#[derive(Debug)]
pub struct ImageStore {
    tx: watch::Sender<Option<DataUri>>,
}

impl ImageStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// The image currently held, if any
    pub fn current_image(&self) -> Option<DataUri> {
        self.tx.borrow().clone()
    }

    pub fn has_image(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replace the current image. There is no history.
    pub fn set_image(&self, image: DataUri) {
        tracing::debug!(mime = image.mime(), len = image.as_str().len(), "image set");
        self.tx.send_replace(Some(image));
    }

    /// Drop the current image
    pub fn clear(&self) {
        tracing::debug!("image cleared");
        self.tx.send_replace(None);
    }

    /// Receive a notification on every `set_image` and `clear`
    pub fn subscribe(&self) -> watch::Receiver<Option<DataUri>> {
        self.tx.subscribe()
    }
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::new()
    }
}
