//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (with or without a window)
//! - creating & configuring the Surface (swapchain) and its depth buffer
//! - acquiring frames and providing encoders/views for rendering

mod depth;
mod gpu;
mod surface;

pub use gpu::{Gpu, GpuDevice, GpuFrame, GpuInit, SurfaceErrorAction};

#[cfg(test)]
pub(crate) use gpu::test_support;
