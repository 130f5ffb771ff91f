//! ML model components

pub mod classifier;
pub mod inference;
pub mod loader;

pub use classifier::Classifier;
pub use inference::OnnxClassifier;
pub use loader::ModelLoader;
