use iced::widget::{column, container, text};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};

mod capture;
mod config;
mod logging;
mod state;
mod ui;

use config::Config;
use ui::upload::{self, UploadWidget};

/// Main application state
struct ImageUploadApp {
    /// The one widget this shell hosts
    upload: UploadWidget,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    Upload(upload::Message),
}

impl ImageUploadApp {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = Config::load();
        let upload = UploadWidget::new(config.camera_bridge(), config.camera.options.clone());

        tracing::info!("🎨 Image Upload initialized");

        (ImageUploadApp { upload }, Task::none())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Upload(message) => self.upload.update(message).map(Message::Upload),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let content = column![
            text("Image Upload Demo").size(32),
            self.upload.view().map(Message::Upload),
        ]
        .spacing(32)
        .padding(32)
        .max_width(800.0)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        upload::subscription().map(Message::Upload)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn main() -> iced::Result {
    logging::init();

    iced::application(
        "Image Upload Demo",
        ImageUploadApp::update,
        ImageUploadApp::view,
    )
    .subscription(ImageUploadApp::subscription)
    .theme(ImageUploadApp::theme)
    .centered()
    .run_with(ImageUploadApp::new)
}
