//! 查看器模块
//!
//! 对外提供 `Viewer::draw_geometries`：打开一个窗口显示一组几何体，
//! 阻塞直到用户关闭窗口。整个进程只创建一个事件循环，
//! 每次显示都在同一个事件循环上运行（`run_on_demand`）。
//!
//! # 交互
//!
//! - 左键拖动：旋转
//! - 滚轮：缩放
//! - Esc 或关闭按钮：关闭窗口，管线继续

use tracing::{debug, info, warn};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;

use crate::core::config::{Config, ViewerConfig, WindowConfig};
use crate::core::error::{GraphicsError, PipelineError, Result};
use crate::core::math::Vector3;
use crate::geometry::{AxisAlignedBoundingBox, PointCloud, TriangleMesh, VoxelGrid};
use crate::gfx::wgpu::{Renderer, SceneBounds};

pub mod vertex;

use vertex::DrawBatch;

/// 可显示的几何体
#[derive(Debug, Clone)]
pub enum Geometry {
    Mesh(TriangleMesh),
    PointCloud(PointCloud),
    VoxelGrid(VoxelGrid),
}

impl Geometry {
    /// 几何体的包围盒，空几何体返回 `None`
    pub fn bounding_box(&self) -> Option<AxisAlignedBoundingBox> {
        match self {
            Geometry::Mesh(mesh) => mesh.axis_aligned_bounding_box(),
            Geometry::PointCloud(pcd) => pcd.axis_aligned_bounding_box(),
            Geometry::VoxelGrid(grid) => grid
                .voxels()
                .iter()
                .map(|v| grid.voxel_bounds(v.grid_index))
                .reduce(|a, b| a.union(&b)),
        }
    }
}

impl From<TriangleMesh> for Geometry {
    fn from(mesh: TriangleMesh) -> Self {
        Geometry::Mesh(mesh)
    }
}

impl From<PointCloud> for Geometry {
    fn from(pcd: PointCloud) -> Self {
        Geometry::PointCloud(pcd)
    }
}

impl From<VoxelGrid> for Geometry {
    fn from(grid: VoxelGrid) -> Self {
        Geometry::VoxelGrid(grid)
    }
}

/// 所有几何体的包围球
pub fn scene_bounds(geometries: &[Geometry]) -> Option<SceneBounds> {
    let bbox = geometries
        .iter()
        .filter_map(Geometry::bounding_box)
        .reduce(|a, b| a.union(&b))?;
    let center = bbox.center();
    Some(SceneBounds {
        center: Vector3::new(center.x as f32, center.y as f32, center.z as f32),
        radius: (bbox.extent().norm() * 0.5) as f32,
    })
}

/// 拖动一个窗口宽度对应的旋转角度（弧度）
const ROTATE_SPEED: f32 = std::f32::consts::PI;

/// 每格滚轮的缩放倍率
const ZOOM_STEP: f32 = 0.9;

/// 几何体查看器
pub struct Viewer {
    event_loop: Option<EventLoop<()>>,
    window: WindowConfig,
    settings: ViewerConfig,
}

impl Viewer {
    /// 创建查看器
    ///
    /// 查看器被禁用时不创建事件循环，`draw_geometries` 只记录日志。
    pub fn new(config: &Config) -> Result<Self> {
        let event_loop = if config.viewer.enabled {
            let event_loop = EventLoop::new()
                .map_err(|e| GraphicsError::WindowCreation(format!("Failed to create event loop: {}", e)))?;
            Some(event_loop)
        } else {
            info!("Viewer disabled, geometry will not be displayed");
            None
        };

        Ok(Self {
            event_loop,
            window: config.window.clone(),
            settings: config.viewer.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.event_loop.is_some()
    }

    /// 显示几何体，直到窗口被关闭
    pub fn draw_geometries(&mut self, geometries: &[Geometry], window_name: &str) -> Result<()> {
        let Some(event_loop) = self.event_loop.as_mut() else {
            debug!(window = window_name, count = geometries.len(), "Skipping display");
            return Ok(());
        };

        let Some(bounds) = scene_bounds(geometries) else {
            warn!(window = window_name, "Nothing to display");
            return Ok(());
        };

        let batches: Vec<DrawBatch> = geometries.iter().map(DrawBatch::from).collect();
        let mut renderer = Renderer::new(
            event_loop,
            window_name,
            &batches,
            bounds,
            &self.window,
            &self.settings,
        )?;
        info!(window = window_name, "Viewer window opened, close it to continue");

        let window_id = renderer.window().id();
        let mut failure: Option<PipelineError> = None;
        let mut dragging = false;
        let mut last_cursor: Option<(f64, f64)> = None;

        renderer.window().request_redraw();

        event_loop
            .run_on_demand(|event, elwt| {
                elwt.set_control_flow(ControlFlow::Wait);

                let Event::WindowEvent { window_id: id, event } = event else {
                    return;
                };
                if id != window_id {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                logical_key: Key::Named(NamedKey::Escape),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    } => elwt.exit(),

                    WindowEvent::Resized(_) => {
                        renderer.resize();
                        renderer.window().request_redraw();
                    }

                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => {
                        dragging = state == ElementState::Pressed;
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if let (true, Some((x, y))) = (dragging, last_cursor) {
                            let width = renderer.window().inner_size().width.max(1) as f32;
                            let dx = (position.x - x) as f32 / width;
                            let dy = (position.y - y) as f32 / width;
                            renderer.camera_mut().rotate(-dx * ROTATE_SPEED, dy * ROTATE_SPEED);
                            renderer.window().request_redraw();
                        }
                        last_cursor = Some((position.x, position.y));
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let lines = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(p) => (p.y / 40.0) as f32,
                        };
                        renderer.camera_mut().zoom(ZOOM_STEP.powf(lines));
                        renderer.window().request_redraw();
                    }

                    WindowEvent::RedrawRequested => {
                        if let Err(e) = renderer.draw() {
                            failure = Some(e);
                            elwt.exit();
                        }
                    }

                    _ => {}
                }
            })
            .map_err(|e| GraphicsError::WindowCreation(format!("Event loop error: {}", e)))?;

        drop(renderer);
        debug!(window = window_name, "Viewer window closed");

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
