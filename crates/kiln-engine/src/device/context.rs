use std::sync::Arc;

use anyhow::{Context, Result};

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub power_preference: wgpu::PowerPreference,

    /// Pick an sRGB surface format when `true`, a linear (`Unorm`) one when
    /// `false`. UI colors are blended as stored, so the default is `false`.
    pub prefer_srgb: bool,

    pub present_mode: wgpu::PresentMode,

    /// Used only if the surface supports it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Limits requested from the adapter. Texture uploads are checked
    /// against the resulting `max_texture_dimension_2d`.
    pub required_limits: wgpu::Limits,

    pub frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_limits: wgpu::Limits::default(),
            frame_latency: 2,
        }
    }
}

/// Logical device and queue, shared by the window surface and the render
/// bridge. Cloning is cheap.
#[derive(Clone)]
pub struct GpuContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter: wgpu::AdapterInfo,
    max_texture_dimension: u32,
}

impl GpuContext {
    /// Opens a device on `adapter` with the limits asked for in `init`.
    pub async fn open(adapter: &wgpu::Adapter, init: &GpuInit) -> Result<Self> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kiln device"),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device")?;

        let max_texture_dimension = device.limits().max_texture_dimension_2d;
        let adapter = adapter.get_info();
        log::info!(
            "gpu: {} ({:?}), max texture {max_texture_dimension}px",
            adapter.name,
            adapter.backend
        );

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter,
            max_texture_dimension,
        })
    }

    /// Opens a device with no surface attached, for offscreen rendering.
    ///
    /// Fails when the machine exposes no adapter at all.
    pub fn headless(init: &GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .context("no GPU adapter available")?;
        pollster::block_on(Self::open(&adapter, init))
    }

    #[inline]
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    #[inline]
    pub fn adapter(&self) -> &wgpu::AdapterInfo {
        &self.adapter
    }

    /// `max_texture_dimension_2d` of the opened device.
    #[inline]
    pub fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter.name)
            .field("max_texture_dimension", &self.max_texture_dimension)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_ask_for_a_linear_surface() {
        let init = GpuInit::default();
        assert!(!init.prefer_srgb);
        assert_eq!(init.required_limits.max_texture_dimension_2d, 8192);
    }
}
