/// One acquired swapchain image plus the encoder recording into it.
///
/// Short-lived: the next frame cannot be acquired while this one holds the
/// surface texture. Hand it back through [`Gpu::submit`](super::Gpu::submit).
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
