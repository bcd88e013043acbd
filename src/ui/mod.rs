/// User interface components
///
/// - `upload` - the image upload widget and its window-event subscription

pub mod upload;
