//! Draw routing
//!
//! - [`SceneRegistry`]: concurrent stage → subpass → pipeline → callbacks index
//! - [`DrawRegistration`] / [`UniqueDrawRegistration`]: removal handles
//! - [`DrawEnvironment`] / [`DrawFn`]: what a callback receives

pub mod draw;
pub mod registration;
pub mod registry;

pub use draw::{DrawEnvironment, DrawFn};
pub use registration::{DrawKey, DrawRegistration, UniqueDrawRegistration};
pub use registry::SceneRegistry;
