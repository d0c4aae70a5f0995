//! Renderer-facing handles.
//!
//! Scenes receive a [`RenderCtx`] (device, queue, target formats and size) and a
//! [`RenderTarget`] (encoder + attachments) for each frame.

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};
