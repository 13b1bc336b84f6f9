//! Per-frame orchestration: camera, tile selection, compositing and drawing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tiny_skia::{
    Color, FilterQuality, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Shader, Stroke,
    Transform,
};
use tokio::runtime::Handle;
use tracing::{debug, trace};

use super::input::{starts_drag, wheel_motion, InputEvent, WheelConfig};
use crate::camera::{Camera, CameraConfig};
use crate::composite::{CompositeRequest, CompositorStats, TileCompositor};
use crate::coord::{
    world_to_line, world_to_tile, LinePosition, TileLayout, TilePosition, WorldPosition,
};
use crate::fetch::{
    FetchConfig, OutlineLoader, OutlineRequest, OutlineSource, TileFetchQueue, TileSource,
};
use crate::geometry::Box2D;
use crate::index::FileIndex;
use crate::layer::VisualizationLayer;
use crate::quadtree::{required_tiles, TileAddress, TilingConfig};

const CLEAR: [u8; 4] = [9, 9, 11, 255];
const GRID: [u8; 3] = [255, 255, 255];
const ORIGIN: [u8; 4] = [239, 68, 68, 255];
const BOUNDS: [u8; 4] = [250, 204, 21, 255];
const TILE_BORDER: [u8; 4] = [34, 211, 238, 160];
const OUTLINE: [u8; 4] = [255, 255, 255, 255];

/// Drawing options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Draw the cell grid while zoomed in.
    pub grid: bool,
    /// Grid opacity at the lowest eye height.
    pub grid_alpha: f64,
    /// Eye height at which the grid has faded out completely.
    pub grid_fade_z: f64,
    /// Origin marker and grid bounds.
    pub debug: bool,
    pub tile_borders: bool,
    pub frame_interval: Duration,
    pub wheel: WheelConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            grid: true,
            grid_alpha: 0.15,
            grid_fade_z: 64.0,
            debug: false,
            tile_borders: false,
            frame_interval: Duration::from_millis(16),
            wheel: WheelConfig::default(),
        }
    }
}

/// Everything a viewer needs besides its collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewerConfig {
    pub camera: CameraConfig,
    pub tiling: TilingConfig,
    pub fetch: FetchConfig,
    pub render: RenderConfig,
}

/// What is under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub screen: (f64, f64),
    pub world: WorldPosition,
    pub tile: TilePosition,
    /// `None` over the unused tail of the grid.
    pub line: Option<LinePosition>,
    pub path: Option<String>,
}

/// Counters for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugInfo {
    pub frame: u64,
    pub eye: (f64, f64, f64),
    pub viewport: Box2D,
    pub pixels_per_unit: f64,
    pub required: usize,
    pub ready: usize,
    pub hover: Option<Hover>,
    pub compositor: CompositorStats,
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.eye;
        writeln!(f, "frame {}", self.frame)?;
        writeln!(f, "eye ({:.2}, {:.2}, {:.2}) {:.3} px/cell", x, y, z, self.pixels_per_unit)?;
        writeln!(f, "viewport {}", self.viewport)?;
        writeln!(f, "tiles {}/{} ready", self.ready, self.required)?;
        writeln!(f, "{}", self.compositor)?;
        write!(f, "fetch {}", self.compositor.fetch)?;
        if let Some(hover) = &self.hover {
            write!(f, "\nhover world {} tile {}", hover.world, hover.tile)?;
            if let Some(line) = hover.line {
                write!(f, " line {}", line)?;
            }
            if let Some(path) = &hover.path {
                write!(f, " {}", path)?;
            }
        }
        Ok(())
    }
}

/// Interactive map of one repository snapshot.
pub struct Viewer {
    config: RenderConfig,
    tiling: TilingConfig,
    camera: Camera,
    layout: TileLayout,
    repo: String,
    commit: String,
    layer: VisualizationLayer,
    index: Option<FileIndex>,
    compositor: TileCompositor,
    outlines: Option<OutlineLoader>,
    runtime: Handle,
    pointer: Option<(f64, f64)>,
    drag: Option<(f64, f64)>,
    hover: Option<Hover>,
    viewport: Box2D,
    required: Vec<CompositeRequest>,
    frame: u64,
}

impl Viewer {
    pub fn new(
        repo: impl Into<String>,
        commit: impl Into<String>,
        layout: TileLayout,
        tiles: Arc<dyn TileSource>,
        config: ViewerConfig,
        runtime: Handle,
    ) -> Self {
        let fetch = TileFetchQueue::new(tiles, config.fetch, runtime.clone());
        let mut camera = Camera::new(config.camera);
        camera.snap_to_box(&layout.root_box());
        Self {
            config: config.render,
            tiling: config.tiling,
            camera,
            layout,
            repo: repo.into(),
            commit: commit.into(),
            layer: VisualizationLayer::default(),
            index: None,
            compositor: TileCompositor::new(fetch, runtime.clone()),
            outlines: None,
            runtime,
            pointer: None,
            drag: None,
            hover: None,
            viewport: Box2D::new(),
            required: Vec::new(),
            frame: 0,
        }
    }

    /// Enables file lookup for the hovered line.
    pub fn with_index(mut self, index: FileIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Enables outlining the hovered file.
    pub fn with_outlines(mut self, source: Arc<dyn OutlineSource>) -> Self {
        self.outlines = Some(OutlineLoader::new(source, self.runtime.clone()));
        self
    }

    pub fn set_layer(&mut self, layer: VisualizationLayer) {
        if layer != self.layer {
            debug!(layer = %layer, "Switching visualization layer");
            self.layer = layer;
        }
    }

    pub fn layer(&self) -> VisualizationLayer {
        self.layer
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn render_config_mut(&mut self) -> &mut RenderConfig {
        &mut self.config
    }

    pub fn compositor(&self) -> &TileCompositor {
        &self.compositor
    }

    pub fn hover(&self) -> Option<&Hover> {
        self.hover.as_ref()
    }

    /// Composites wanted by the last update, coarsest first.
    pub fn required(&self) -> &[CompositeRequest] {
        &self.required
    }

    /// Frames the whole grid.
    pub fn fit(&mut self) {
        self.camera.snap_to_box(&self.layout.root_box());
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Wheel { dx, dy, modifiers } => {
                let (dx, dy, dz) = wheel_motion(dx, dy, modifiers, &self.config.wheel);
                self.camera.dolly(dx, dy, dz);
            }
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => {
                self.pointer = Some((x, y));
                if starts_drag(button, modifiers) {
                    self.drag = Some((x, y));
                }
            }
            InputEvent::PointerMove { x, y } => {
                if let Some((lx, ly)) = self.drag {
                    self.drag_to(lx, ly, x, y);
                    self.drag = Some((x, y));
                }
                self.pointer = Some((x, y));
            }
            InputEvent::PointerUp { .. } => self.drag = None,
            InputEvent::PointerLeave => {
                self.pointer = None;
                self.drag = None;
            }
            InputEvent::Resize { width, height } => self.camera.set_screen_size(width, height),
        }
    }

    /// Keeps the world point grabbed at `(from)` under the pointer at `(to)`.
    fn drag_to(&mut self, fx: f64, fy: f64, tx: f64, ty: f64) {
        let (ax, ay) = self.camera.to_world(fx, fy);
        let (bx, by) = self.camera.to_world(tx, ty);
        let eye = self.camera.eye();
        self.camera.snap_xy(eye.x - (bx - ax), eye.y - (by - ay));
    }

    /// Recomputes viewport, hover and required tiles, and forwards the
    /// requirement to the compositor.
    pub fn update(&mut self) {
        self.frame += 1;
        self.viewport = self.camera.world_bounds();
        self.update_hover();

        let ppu = self.camera.pixels_per_world_unit();
        self.required = required_tiles(&self.viewport, &self.layout, ppu, &self.tiling)
            .filter_map(|bounds| TileAddress::from_box(&bounds))
            .map(|address| self.layer.composite_request(address, &self.repo, &self.commit))
            .collect();
        trace!(frame = self.frame, required = self.required.len(), "Frame update");
        self.compositor.update(&self.required);
    }

    fn update_hover(&mut self) {
        let lod = self.required.iter().map(|r| r.tile.lod).min().unwrap_or(0);
        self.hover = self.pointer.and_then(|(sx, sy)| {
            let (wx, wy) = self.camera.to_world(sx, sy);
            let world = self.layout.world_at(wx, wy)?;
            let tile = world_to_tile(world, lod).ok()?;
            let line = world_to_line(world, &self.layout)
                .ok()
                .filter(|line| *line < self.layout.line_count());
            let path = line
                .and_then(|line| self.index.as_ref()?.entry_for_line(line))
                .map(|entry| entry.path.clone());
            Some(Hover {
                screen: (sx, sy),
                world,
                tile,
                line,
                path,
            })
        });

        let wanted = self
            .hover
            .as_ref()
            .and_then(|hover| hover.line)
            .and_then(|line| self.index.as_ref()?.entry_for_line(line))
            .and_then(|entry| entry.hash.clone())
            .map(|hash| OutlineRequest {
                repo: self.repo.clone(),
                commit: self.commit.clone(),
                hash,
            });
        if let Some(outlines) = &mut self.outlines {
            outlines.update(wanted, self.layout.grid_side());
        }
    }

    /// Updates and draws one frame into `target`.
    pub fn tick(&mut self, target: &mut Pixmap) -> DebugInfo {
        self.camera
            .set_screen_size(f64::from(target.width()), f64::from(target.height()));
        if self.frame == 0 {
            self.fit();
        }
        self.update();
        let ready = self.draw(target);
        self.debug_info(ready)
    }

    /// Draws the current state. Returns the number of bitmaps drawn.
    pub fn draw(&self, target: &mut Pixmap) -> usize {
        let [r, g, b, a] = CLEAR;
        target.fill(Color::from_rgba8(r, g, b, a));
        self.draw_grid(target);

        let mut ready = 0;
        for request in &self.required {
            let Some(bitmap) = self.compositor.get(request) else {
                continue;
            };
            if let Some(rect) = self.screen_rect(&request.tile.address().bounds()) {
                draw_bitmap(target, &bitmap, rect);
                ready += 1;
            }
        }

        if self.config.tile_borders {
            for request in &self.required {
                if let Some(rect) = self.screen_rect(&request.tile.address().bounds()) {
                    stroke(target, &PathBuilder::from_rect(rect), TILE_BORDER, 1.0);
                }
            }
        }
        if self.config.debug {
            self.draw_debug(target);
        }
        self.draw_hover_outline(target);
        ready
    }

    /// Current grid opacity; fades linearly to zero at `grid_fade_z`.
    pub fn grid_alpha(&self) -> f64 {
        let z = self.camera.eye().z;
        self.config.grid_alpha * (1.0 - z / self.config.grid_fade_z).clamp(0.0, 1.0)
    }

    fn draw_grid(&self, target: &mut Pixmap) {
        let alpha = self.grid_alpha();
        if !self.config.grid || alpha <= 0.0 {
            return;
        }
        let bounds = self.viewport.intersection(&self.layout.root_box());
        if bounds.is_empty() {
            return;
        }

        let mut pb = PathBuilder::new();
        for x in (bounds.min_x.ceil() as i64)..=(bounds.max_x.floor() as i64) {
            let (sx, top) = self.camera.to_screen(x as f64, bounds.max_y);
            let (_, bottom) = self.camera.to_screen(x as f64, bounds.min_y);
            pb.move_to(sx as f32, top as f32);
            pb.line_to(sx as f32, bottom as f32);
        }
        for y in (bounds.min_y.ceil() as i64)..=(bounds.max_y.floor() as i64) {
            let (left, sy) = self.camera.to_screen(bounds.min_x, y as f64);
            let (right, _) = self.camera.to_screen(bounds.max_x, y as f64);
            pb.move_to(left as f32, sy as f32);
            pb.line_to(right as f32, sy as f32);
        }
        if let Some(path) = pb.finish() {
            let [r, g, b] = GRID;
            let a = (alpha * 255.0).round() as u8;
            stroke(target, &path, [r, g, b, a], 1.0);
        }
    }

    fn draw_debug(&self, target: &mut Pixmap) {
        if let Some(rect) = self.screen_rect(&self.layout.root_box()) {
            stroke(target, &PathBuilder::from_rect(rect), BOUNDS, 1.0);
        }

        let (ox, oy) = self.camera.to_screen(0.0, 0.0);
        let (ox, oy) = (ox as f32, oy as f32);
        let mut pb = PathBuilder::new();
        pb.move_to(ox - 6.0, oy);
        pb.line_to(ox + 6.0, oy);
        pb.move_to(ox, oy - 6.0);
        pb.line_to(ox, oy + 6.0);
        if let Some(path) = pb.finish() {
            stroke(target, &path, ORIGIN, 2.0);
        }
    }

    fn draw_hover_outline(&self, target: &mut Pixmap) {
        let Some(outline) = self.outlines.as_ref().and_then(OutlineLoader::get) else {
            return;
        };
        let mut pb = PathBuilder::new();
        for segment in &outline.segments {
            let (fx, fy) = self.camera.to_screen(segment.from.0, segment.from.1);
            let (tx, ty) = self.camera.to_screen(segment.to.0, segment.to.1);
            pb.move_to(fx as f32, fy as f32);
            pb.line_to(tx as f32, ty as f32);
        }
        if let Some(path) = pb.finish() {
            stroke(target, &path, OUTLINE, 2.0);
        }
    }

    /// Screen rectangle of a world box, snapped to whole pixels.
    fn screen_rect(&self, bounds: &Box2D) -> Option<Rect> {
        let (left, top) = self.camera.to_screen(bounds.min_x, bounds.max_y);
        let (right, bottom) = self.camera.to_screen(bounds.max_x, bounds.min_y);
        Rect::from_ltrb(
            left.round() as f32,
            top.round() as f32,
            right.round() as f32,
            bottom.round() as f32,
        )
    }

    fn debug_info(&self, ready: usize) -> DebugInfo {
        let eye = self.camera.eye();
        DebugInfo {
            frame: self.frame,
            eye: (eye.x, eye.y, eye.z),
            viewport: self.viewport,
            pixels_per_unit: self.camera.pixels_per_world_unit(),
            required: self.required.len(),
            ready,
            hover: self.hover.clone(),
            compositor: self.compositor.stats(),
        }
    }

    /// Waits until every started fetch, colorization and outline load has
    /// finished.
    pub async fn settle(&mut self) {
        while self.compositor.next_event().await {}
        if let Some(outlines) = &mut self.outlines {
            outlines.settle().await;
        }
    }

    /// Draws frames into `target` until every required tile is on screen,
    /// nothing is left in flight, or `max_frames` frames have been drawn.
    /// Used for headless snapshots.
    pub async fn render_settled(&mut self, target: &mut Pixmap, max_frames: u32) -> DebugInfo {
        let mut info = self.tick(target);
        for _ in 1..max_frames.max(1) {
            if self.compositor.is_complete() {
                break;
            }
            if !self.compositor.next_event().await {
                debug!(frame = self.frame, "Nothing in flight, stopping early");
                break;
            }
            info = self.tick(target);
        }
        info
    }

    /// Drops every requirement, aborting in-flight work.
    pub fn shutdown(&mut self) {
        self.required.clear();
        self.compositor.update(&[]);
        if let Some(outlines) = &mut self.outlines {
            outlines.update(None, self.layout.grid_side());
        }
        debug!(frame = self.frame, "Viewer released all tiles");
    }
}

impl fmt::Debug for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewer")
            .field("repo", &self.repo)
            .field("commit", &self.commit)
            .field("layer", &self.layer.kind)
            .field("frame", &self.frame)
            .finish()
    }
}

fn paint(color: [u8; 4]) -> Paint<'static> {
    let [r, g, b, a] = color;
    Paint {
        shader: Shader::SolidColor(Color::from_rgba8(r, g, b, a)),
        anti_alias: true,
        ..Default::default()
    }
}

fn stroke(target: &mut Pixmap, path: &Path, color: [u8; 4], width: f32) {
    let stroke = Stroke {
        width,
        ..Default::default()
    };
    target.stroke_path(path, &paint(color), &stroke, Transform::identity(), None);
}

/// Draws a tile bitmap into `rect`, one crisp block per cell. Bitmap row 0 is
/// the tile's lowest world row, which sits at the bottom of the screen.
fn draw_bitmap(target: &mut Pixmap, bitmap: &Pixmap, rect: Rect) {
    let sx = rect.width() / bitmap.width() as f32;
    let sy = rect.height() / bitmap.height() as f32;
    let transform = Transform::from_row(sx, 0.0, 0.0, -sy, rect.left(), rect.bottom());
    let paint = PixmapPaint {
        quality: FilterQuality::Nearest,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, bitmap.as_ref(), &paint, transform, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::line_to_world;
    use crate::fetch::testing::GatedSource;
    use crate::index::IndexEntry;
    use crate::render::input::{Modifiers, PointerButton};
    use glam::DVec3;

    fn viewer(source: &Arc<GatedSource>, lines: u64, config: ViewerConfig) -> Viewer {
        let tiles: Arc<dyn TileSource> = source.clone();
        Viewer::new(
            "repo",
            "commit",
            TileLayout::new(lines),
            tiles,
            config,
            Handle::current(),
        )
    }

    fn pixel(surface: &Pixmap, x: u32, y: u32) -> [u8; 3] {
        let px = surface.pixel(x, y).unwrap();
        [px.red(), px.green(), px.blue()]
    }

    #[tokio::test]
    async fn test_tiles_are_drawn_once_ready() {
        let source = Arc::new(GatedSource::open(7));
        let mut viewer = viewer(&source, 16, ViewerConfig::default());
        let mut surface = Pixmap::new(64, 64).unwrap();

        let info = viewer.tick(&mut surface);
        assert_eq!(info.required, 1);
        assert_eq!(info.ready, 0);
        assert_eq!(pixel(&surface, 40, 40), [9, 9, 11]);

        viewer.settle().await;
        let info = viewer.tick(&mut surface);
        assert_eq!(info.ready, 1);
        assert_eq!(pixel(&surface, 40, 40), [248, 248, 248]);
    }

    #[tokio::test]
    async fn test_first_tick_frames_whole_grid() {
        let source = Arc::new(GatedSource::open(1));
        let mut viewer = viewer(&source, 16, ViewerConfig::default());
        let mut surface = Pixmap::new(64, 64).unwrap();
        let info = viewer.tick(&mut surface);

        let root = viewer.layout().root_box();
        assert!(info.viewport.contains_box(&root.expand(-1e-6)));
        assert!((info.pixels_per_unit - 16.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_hover_resolves_line() {
        let source = Arc::new(GatedSource::open(1));
        let mut viewer = viewer(&source, 16, ViewerConfig::default()).with_index(FileIndex::new(
            vec![IndexEntry {
                path: "src/lib.rs".into(),
                line_offset: 0,
                line_count: 16,
                hash: None,
            }],
        ));
        let mut surface = Pixmap::new(64, 64).unwrap();
        viewer.tick(&mut surface);

        viewer.handle_input(InputEvent::PointerMove { x: 24.0, y: 24.0 });
        viewer.tick(&mut surface);

        let hover = viewer.hover().unwrap();
        assert_eq!(hover.world, WorldPosition::new(1, 2));
        let line = hover.line.unwrap();
        assert_eq!(line_to_world(line, viewer.layout()).unwrap(), hover.world);
        assert_eq!(hover.path.as_deref(), Some("src/lib.rs"));

        viewer.handle_input(InputEvent::PointerLeave);
        viewer.tick(&mut surface);
        assert!(viewer.hover().is_none());
    }

    #[tokio::test]
    async fn test_hover_clears_outside_grid() {
        let source = Arc::new(GatedSource::open(1));
        let mut viewer = viewer(&source, 16, ViewerConfig::default());
        let mut surface = Pixmap::new(64, 64).unwrap();
        viewer.tick(&mut surface);
        viewer.camera_mut().snap(DVec3::new(2.0, 2.0, 40.0));

        viewer.handle_input(InputEvent::PointerMove { x: 1.0, y: 1.0 });
        viewer.tick(&mut surface);
        assert!(viewer.hover().is_none());
    }

    #[tokio::test]
    async fn test_hover_past_last_line_has_no_line() {
        let source = Arc::new(GatedSource::open(1));
        let mut viewer = viewer(&source, 10, ViewerConfig::default());
        let mut surface = Pixmap::new(64, 64).unwrap();
        viewer.tick(&mut surface);

        let world = line_to_world(15, viewer.layout()).unwrap();
        let (sx, sy) = viewer
            .camera()
            .to_screen(f64::from(world.x) + 0.5, f64::from(world.y) + 0.5);
        viewer.handle_input(InputEvent::PointerMove { x: sx, y: sy });
        viewer.tick(&mut surface);

        let hover = viewer.hover().unwrap();
        assert_eq!(hover.world, world);
        assert_eq!(hover.line, None);
    }

    #[tokio::test]
    async fn test_middle_drag_keeps_point_under_pointer() {
        let source = Arc::new(GatedSource::open(1));
        let mut viewer = viewer(&source, 16, ViewerConfig::default());
        let mut surface = Pixmap::new(64, 64).unwrap();
        viewer.tick(&mut surface);

        let grabbed = viewer.camera().to_world(10.0, 10.0);
        viewer.handle_input(InputEvent::PointerDown {
            x: 10.0,
            y: 10.0,
            button: PointerButton::Middle,
            modifiers: Modifiers::NONE,
        });
        viewer.handle_input(InputEvent::PointerMove { x: 30.0, y: 14.0 });
        let (wx, wy) = viewer.camera().to_world(30.0, 14.0);
        assert!((wx - grabbed.0).abs() < 1e-9);
        assert!((wy - grabbed.1).abs() < 1e-9);

        viewer.handle_input(InputEvent::PointerUp {
            button: PointerButton::Middle,
        });
        let eye = viewer.camera().eye();
        viewer.handle_input(InputEvent::PointerMove { x: 50.0, y: 50.0 });
        assert_eq!(viewer.camera().eye(), eye);
    }

    #[tokio::test]
    async fn test_zoom_wheel_changes_height() {
        let source = Arc::new(GatedSource::open(1));
        let mut viewer = viewer(&source, 16, ViewerConfig::default());
        let z = viewer.camera().eye().z;
        viewer.handle_input(InputEvent::Wheel {
            dx: 0.0,
            dy: 120.0,
            modifiers: Modifiers::ZOOM,
        });
        assert!(viewer.camera().eye().z > z);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_fetches() {
        let source = Arc::new(GatedSource::gated(1));
        let mut viewer = viewer(&source, 1 << 16, ViewerConfig::default());
        let mut surface = Pixmap::new(256, 256).unwrap();
        let info = viewer.tick(&mut surface);
        assert!(info.compositor.fetch.in_flight > 0);

        viewer.shutdown();
        assert_eq!(viewer.compositor().fetch().in_flight_count(), 0);
        assert_eq!(viewer.compositor().job_count(), 0);
    }

    #[tokio::test]
    async fn test_required_tiles_respect_cap() {
        let source = Arc::new(GatedSource::gated(1));
        let mut config = ViewerConfig::default();
        config.tiling.max_tiles = 5;
        let mut viewer = viewer(&source, 1 << 20, config);
        let mut surface = Pixmap::new(512, 512).unwrap();
        let info = viewer.tick(&mut surface);
        assert!(info.required <= 5);
        assert!(info.compositor.fetch.in_flight <= config.fetch.max_concurrent);
    }

    #[tokio::test]
    async fn test_grid_fades_with_height() {
        let source = Arc::new(GatedSource::open(1));
        let mut viewer = viewer(&source, 16, ViewerConfig::default());
        viewer.camera_mut().snap(DVec3::new(0.0, 0.0, 0.1));
        let near = viewer.grid_alpha();
        viewer.camera_mut().snap(DVec3::new(0.0, 0.0, 32.0));
        let mid = viewer.grid_alpha();
        viewer.camera_mut().snap(DVec3::new(0.0, 0.0, 100.0));
        assert!(near > mid && mid > 0.0);
        assert_eq!(viewer.grid_alpha(), 0.0);
    }

    #[tokio::test]
    async fn test_debug_overlay_outlines_bounds() {
        let source = Arc::new(GatedSource::gated(1));
        let mut config = ViewerConfig::default();
        config.render.grid = false;
        config.render.debug = true;
        let mut viewer = viewer(&source, 16, config);
        let mut surface = Pixmap::new(64, 64).unwrap();
        viewer.tick(&mut surface);
        viewer.camera_mut().snap(DVec3::new(2.0, 2.0, 20.0));
        viewer.tick(&mut surface);

        let (left, _) = viewer.camera().to_screen(0.0, 2.0);
        assert_ne!(pixel(&surface, left.round() as u32, 32), [9, 9, 11]);
        assert_eq!(pixel(&surface, 32, 32), [9, 9, 11]);
    }

    #[test]
    fn test_debug_info_display() {
        let info = DebugInfo {
            frame: 3,
            eye: (1.0, 2.0, 3.0),
            viewport: Box2D::from_values(0.0, 0.0, 4.0, 4.0),
            pixels_per_unit: 16.0,
            required: 2,
            ready: 1,
            hover: None,
            compositor: CompositorStats::default(),
        };
        let text = info.to_string();
        assert!(text.contains("frame 3"));
        assert!(text.contains("tiles 1/2 ready"));
    }
}
