mod scene;

use anyhow::Result;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use glines_engine::core::{App, AppControl, FrameCtx};
use glines_engine::device::GpuInit;
use glines_engine::lines::{
    IDENTITY_MVP, LineRenderer, LineRendererInit, LineVertex, LinesError, WgpuLineBackend,
};
use glines_engine::logging::{LoggingConfig, init_logging};
use glines_engine::render::{RenderCtx, RenderTarget};
use glines_engine::window::{Runtime, RuntimeConfig};

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

/// Renderers are created on the first frame, once a device exists.
struct Renderers {
    /// Orbiting wireframe: static geometry, animated transform.
    world: LineRenderer<WgpuLineBackend>,
    world_count: u32,
    /// Reference segments in clip space: animated colors, identity transform.
    overlay: LineRenderer<WgpuLineBackend>,
}

#[derive(Default)]
struct LinesStudio {
    renderers: Option<Renderers>,
}

impl LinesStudio {
    fn draw(
        &mut self,
        rctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        t: f32,
    ) -> Result<(), LinesError> {
        let renderers = match self.renderers.take() {
            Some(r) => r,
            None => create_renderers(rctx)?,
        };
        let Renderers {
            world,
            world_count,
            overlay,
        } = self.renderers.insert(renderers);

        let vp = scene::orbit_view_projection(rctx.aspect(), t);
        world.render(target, *world_count, &vp.to_cols_array())?;

        let n = overlay.update(&scene::pulsing_segments(t))?;
        overlay.render(target, n, &IDENTITY_MVP)?;
        Ok(())
    }
}

fn create_renderers(rctx: &RenderCtx<'_>) -> Result<Renderers, LinesError> {
    let mut world_vertices: Vec<LineVertex> = Vec::new();
    world_vertices.extend(scene::floor_grid(10, 0.5, [0.25, 0.25, 0.3]));
    world_vertices.extend(scene::cube_wireframe(0.75, [0.9, 0.8, 0.3]));
    world_vertices.extend(scene::axes(1.5));

    let mut world = LineRenderer::initialize(
        WgpuLineBackend::from_ctx(rctx).with_label("studio world"),
        LineRendererInit {
            max_vertices: world_vertices.len(),
        },
    )?;
    let world_count = world.update(&world_vertices)?;

    let overlay = LineRenderer::initialize(
        WgpuLineBackend::from_ctx(rctx).with_label("studio overlay"),
        LineRendererInit::default(),
    )?;

    log::info!("studio renderers ready ({world_count} world vertices)");
    Ok(Renderers {
        world,
        world_count,
        overlay,
    })
}

impl App for LinesStudio {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let t = ctx.time.elapsed;
        let mut drawn = Ok(());
        let control = ctx.render(CLEAR, |rctx, target| {
            drawn = self.draw(rctx, target, t);
        });

        if let Err(e) = drawn {
            log::error!("line rendering failed: {e}");
            return AppControl::Exit;
        }
        control
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(
        RuntimeConfig {
            title: "glines studio".to_string(),
            initial_size: LogicalSize::new(960.0, 640.0),
        },
        GpuInit::default(),
        LinesStudio::default(),
    )
}
