//! wgpu 渲染器实现
//!
//! 本模块实现了基于 wgpu 的场景渲染器，包括：
//! - 三角形和点两条渲染管线
//! - 资源管理（顶点缓冲、索引缓冲、Uniform 缓冲、深度纹理）
//! - 相机集成

use bytemuck::{Pod, Zeroable};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::event_loop::EventLoopWindowTarget;

use crate::component::Camera;
use crate::core::config::{ViewerConfig, WindowConfig};
use crate::core::error::{GraphicsError, Result};
use crate::core::math::Vector3;
use crate::gfx::wgpu::backend::WgpuBackend;
use crate::renderer::vertex::{DrawBatch, SceneVertex, Topology};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform Buffer Object
///
/// 必须使用 #[repr(C)] 保证内存布局与着色器一致。
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct UniformBufferObject {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
}

impl UniformBufferObject {
    fn from_camera(camera: &Camera) -> Self {
        let eye = camera.position();
        Self {
            view_proj: *camera.view_proj_matrix().as_ref(),
            eye: [eye.x, eye.y, eye.z, 1.0],
        }
    }
}

/// 已上传到 GPU 的一个绘制批次
struct GpuBatch {
    topology: Topology,
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    count: u32,
}

/// 场景包围球
#[derive(Debug, Clone, Copy)]
pub struct SceneBounds {
    pub center: Vector3,
    pub radius: f32,
}

/// wgpu 场景渲染器
pub struct Renderer {
    gfx: WgpuBackend,

    triangle_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    // 视图不持有纹理，两者一起保存
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    batches: Vec<GpuBatch>,
    camera: Camera,
    clear_color: wgpu::Color,
}

impl Renderer {
    /// 创建窗口并上传所有批次
    pub fn new(
        target: &EventLoopWindowTarget<()>,
        title: &str,
        batches: &[DrawBatch],
        bounds: SceneBounds,
        window_config: &WindowConfig,
        viewer_config: &ViewerConfig,
    ) -> Result<Self> {
        // 1. 创建 wgpu 后端
        let gfx = WgpuBackend::new(target, title, window_config, viewer_config)?;

        // 2. 加载着色器模块
        debug!("Loading shaders");
        let shader_module = gfx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../renderer/shaders/scene.wgsl").into()),
        });

        // 3. 创建 Uniform Buffer
        let uniform_buffer = gfx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<UniformBufferObject>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // 4. 创建 Bind Group
        let bind_group_layout = gfx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = gfx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = gfx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // 5. 创建渲染管线
        debug!("Creating render pipelines");
        let triangle_pipeline = create_pipeline(
            &gfx,
            &pipeline_layout,
            &shader_module,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let point_pipeline = create_pipeline(
            &gfx,
            &pipeline_layout,
            &shader_module,
            wgpu::PrimitiveTopology::PointList,
        );

        // 6. 创建深度纹理
        let (depth_texture, depth_view) =
            create_depth_texture(&gfx.device, gfx.surface_config.width, gfx.surface_config.height);

        // 7. 上传几何数据
        let batches: Vec<GpuBatch> = batches
            .iter()
            .filter(|b| !b.is_empty())
            .map(|b| upload_batch(&gfx.device, b))
            .collect();
        info!(batches = batches.len(), "Uploaded geometry to GPU");

        // 8. 初始化相机
        let aspect = gfx.surface_config.width as f32 / gfx.surface_config.height as f32;
        let camera = Camera::framing(bounds.center, bounds.radius, aspect);

        let [r, g, b] = viewer_config.background;
        let clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };

        Ok(Self {
            gfx,
            triangle_pipeline,
            point_pipeline,
            uniform_buffer,
            bind_group,
            depth_texture,
            depth_view,
            batches,
            camera,
            clear_color,
        })
    }

    /// 绘制一帧
    pub fn draw(&mut self) -> Result<()> {
        // 1. 获取交换链纹理
        let output = match self.gfx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost or outdated, reconfiguring");
                self.resize();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                debug!("Surface acquire timed out, skipping frame");
                return Ok(());
            }
            Err(e) => {
                return Err(
                    GraphicsError::SwapchainError(format!("Failed to acquire next image: {}", e)).into(),
                )
            }
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // 2. 更新相机矩阵
        let ubo = UniformBufferObject::from_camera(&self.camera);
        self.gfx.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[ubo]));

        // 3. 录制渲染通道
        let mut encoder = self.gfx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.bind_group, &[]);

            for batch in &self.batches {
                match batch.topology {
                    Topology::Triangles => render_pass.set_pipeline(&self.triangle_pipeline),
                    Topology::Points => render_pass.set_pipeline(&self.point_pipeline),
                }
                render_pass.set_vertex_buffer(0, batch.vertex_buffer.slice(..));
                match &batch.index_buffer {
                    Some(index_buffer) => {
                        render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..batch.count, 0, 0..1);
                    }
                    None => render_pass.draw(0..batch.count, 0..1),
                }
            }
        }

        // 4. 提交命令
        self.gfx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// 处理窗口大小调整
    pub fn resize(&mut self) {
        let size = self.gfx.window().inner_size();

        if size.width > 0 && size.height > 0 {
            debug!("Resizing to {}x{}", size.width, size.height);

            self.gfx.reconfigure_surface(size.width, size.height);

            let (texture, view) = create_depth_texture(&self.gfx.device, size.width, size.height);
            self.depth_texture = texture;
            self.depth_view = view;

            self.camera.set_aspect(size.width as f32 / size.height as f32);
        }
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// 获取窗口引用
    pub fn window(&self) -> &winit::window::Window {
        self.gfx.window()
    }
}

fn create_pipeline(
    gfx: &WgpuBackend,
    layout: &wgpu::PipelineLayout,
    shader_module: &wgpu::ShaderModule,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    gfx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(match topology {
            wgpu::PrimitiveTopology::PointList => "Point Pipeline",
            _ => "Triangle Pipeline",
        }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader_module,
            entry_point: "vs_main",
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x3,
                    2 => Float32x3,
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader_module,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: gfx.surface_config.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn upload_batch(device: &wgpu::Device, batch: &DrawBatch) -> GpuBatch {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Vertex Buffer"),
        contents: bytemuck::cast_slice(&batch.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let (index_buffer, count) = if batch.indices.is_empty() {
        (None, batch.vertices.len() as u32)
    } else {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&batch.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        (Some(buffer), batch.indices.len() as u32)
    };

    GpuBatch {
        topology: batch.topology,
        vertex_buffer,
        index_buffer,
        count,
    }
}
