/// Image acquisition module
///
/// This module handles getting image bytes in from the host:
/// - Taking photos through a camera bridge (camera.rs)
/// - Reading local files into data URIs (reader.rs)

pub mod camera;
pub mod reader;
