/// State management module
///
/// This module handles all widget state:
/// - The data URI type every input is normalized into (data.rs)
/// - The observable image store the view renders from (store.rs)

pub mod data;
pub mod store;
