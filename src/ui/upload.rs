/// Image upload widget
///
/// Three ways in (camera, file picker, drag-and-drop), one way out (remove).
/// Every path ends as a `DataUri` in the `ImageStore`; the view renders
/// straight from the store.
///
/// Camera and file reads run as tasks and are not sequenced: whichever
/// result arrives last is the image that stays.

use iced::widget::image::{Handle, Image};
use iced::widget::{button, column, container, row, text};
use iced::{event, window, Alignment, Border, Color, ContentFit, Element, Event, Length, Subscription, Task, Theme};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use crate::capture::camera::{CameraBridge, CameraOptions, CaptureError};
use crate::capture::reader::{self, ReadError};
use crate::state::data::DataUri;
use crate::state::store::ImageStore;

/// Side length of the image frame in logical pixels
const FRAME_SIZE: f32 = 200.0;

#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked "Take Photo"
    TakePhoto,
    PhotoCaptured(Result<DataUri, CaptureError>),
    /// User clicked "Choose File"
    OpenPicker,
    /// File picker closed, `None` when dismissed
    FileChosen(Option<PathBuf>),
    /// Files are being dragged over the window
    DragEntered,
    /// The drag left the window without dropping
    DragLeft,
    /// A file was dropped onto the window
    FileDropped(PathBuf),
    FileRead(Result<DataUri, ReadError>),
    /// User clicked "Remove Image"
    Remove,
}

/// What the widget is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Placeholder with the capture buttons
    Empty,
    /// Preview plus the remove button
    Populated,
}

pub struct UploadWidget {
    store: ImageStore,
    camera: Arc<dyn CameraBridge>,
    options: CameraOptions,
    /// Decoded preview of the stored image; `None` if its payload is not decodable
    preview: Option<Handle>,
    /// Set while a drag hovers; the first dropped file clears it
    accepting_drop: bool,
    /// File whose read was started last, until a read result comes back
    reading: Option<PathBuf>,
}

impl UploadWidget {
    pub fn new(camera: Arc<dyn CameraBridge>, options: CameraOptions) -> Self {
        Self {
            store: ImageStore::new(),
            camera,
            options,
            preview: None,
            accepting_drop: false,
            reading: None,
        }
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn surface(&self) -> Surface {
        if self.store.has_image() {
            Surface::Populated
        } else {
            Surface::Empty
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TakePhoto => Task::perform(self.capture(), Message::PhotoCaptured),
            Message::PhotoCaptured(Ok(image)) => {
                self.show(image);
                Task::none()
            }
            Message::PhotoCaptured(Err(e)) => {
                tracing::error!(error = %e, "Error taking photo");
                Task::none()
            }
            Message::OpenPicker => Task::perform(pick_image(), Message::FileChosen),
            Message::FileChosen(Some(path)) => self.read_file(path),
            Message::FileChosen(None) => Task::none(),
            Message::DragEntered => {
                self.accepting_drop = true;
                Task::none()
            }
            Message::DragLeft => {
                self.accepting_drop = false;
                Task::none()
            }
            Message::FileDropped(path) => {
                // Only the first file of a multi-file drop counts
                if std::mem::take(&mut self.accepting_drop) {
                    self.read_file(path)
                } else {
                    tracing::debug!(path = %path.display(), "ignoring extra dropped file");
                    Task::none()
                }
            }
            Message::FileRead(result) => {
                self.reading = None;
                match result {
                    Ok(image) => self.show(image),
                    Err(e) => tracing::warn!(error = %e, "could not read image file"),
                }
                Task::none()
            }
            Message::Remove => {
                self.store.clear();
                self.preview = None;
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<Message> {
        let populated = self.surface() == Surface::Populated;

        let content: Element<Message> = match (populated, &self.preview) {
            (true, Some(handle)) => Image::new(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            (true, None) => text("Preview unavailable").size(14).into(),
            (false, _) => column![
                row![
                    button("Take Photo")
                        .on_press(Message::TakePhoto)
                        .style(button::success)
                        .padding([8, 16]),
                    button("Choose File")
                        .on_press(Message::OpenPicker)
                        .style(button::primary)
                        .padding([8, 16]),
                ]
                .spacing(16),
                text(match &self.reading {
                    Some(path) => format!(
                        "Reading {}...",
                        path.file_name().unwrap_or_default().to_string_lossy()
                    ),
                    None => "or drop an image here".to_string(),
                })
                .size(12),
            ]
            .spacing(12)
            .align_x(Alignment::Center)
            .into(),
        };

        let frame = container(content)
            .center_x(FRAME_SIZE)
            .center_y(FRAME_SIZE)
            .style(move |_theme: &Theme| frame_style(populated));

        let remove = populated.then(|| {
            button("Remove Image")
                .on_press(Message::Remove)
                .style(button::danger)
                .padding([8, 16])
        });

        column![frame]
            .push_maybe(remove)
            .spacing(16)
            .align_x(Alignment::Center)
            .into()
    }

    /// Start a capture with this widget's camera options
    fn capture(&self) -> impl Future<Output = Result<DataUri, CaptureError>> + Send + 'static {
        let camera = Arc::clone(&self.camera);
        let options = self.options.clone();
        async move { camera.capture(&options).await }
    }

    /// Start reading `path` if it is an image; anything else is dropped
    /// without a log line
    fn read_file(&mut self, path: PathBuf) -> Task<Message> {
        if reader::image_mime(&path).is_none() {
            return Task::none();
        }
        self.reading = Some(path.clone());
        Task::perform(reader::read_data_uri(path), Message::FileRead)
    }

    /// Replace whatever is shown with `image`
    fn show(&mut self, image: DataUri) {
        self.preview = match image.decode() {
            Ok(bytes) => Some(Handle::from_bytes(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, mime = image.mime(), "image has no previewable payload");
                None
            }
        };
        tracing::info!(mime = image.mime(), "🖼️  image updated");
        self.store.set_image(image);
    }
}

/// Window drag-and-drop events, routed to the widget
pub fn subscription() -> Subscription<Message> {
    event::listen_with(|event, _status, _window| on_event(event))
}

fn on_event(event: Event) -> Option<Message> {
    match event {
        Event::Window(window::Event::FileHovered(_)) => Some(Message::DragEntered),
        Event::Window(window::Event::FilesHoveredLeft) => Some(Message::DragLeft),
        Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
        _ => None,
    }
}

/// Show the native file chooser, limited to image types
async fn pick_image() -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title("Select an Image")
        .add_filter("Images", reader::picker_extensions().as_slice())
        .pick_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}

fn frame_style(populated: bool) -> container::Style {
    let color = if populated {
        Color::from_rgb8(0x99, 0x99, 0x99)
    } else {
        Color::from_rgb8(0xcc, 0xcc, 0xcc)
    };

    container::Style {
        border: Border {
            color,
            width: 2.0,
            radius: 8.0.into(),
        },
        ..container::Style::default()
    }
}
