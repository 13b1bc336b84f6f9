//! Perspective camera looking straight down onto the world plane.
//!
//! The world is the `z = 0` plane. The eye hovers above it at height `z`,
//! always looking at `(eye.x, eye.y, 0)` with `+Y` up, so `z` alone controls
//! zoom. Three spaces are involved:
//!
//! ```text
//! screen (px)            NDC                      world
//! +------> x             (-1, 1)    +y   (1, 1)   grid cells, y up
//! |                              ^
//! v y                      -x <--+--> +x
//!                        (-1,-1)  v -y  (1,-1)
//! ```
//!
//! Matrices are recomputed eagerly on every mutation so reads never see a
//! stale projection.

use std::f64::consts::PI;

use glam::{DMat4, DVec2, DVec3, DVec4};

use crate::geometry::Box2D;

/// Fixed camera parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in radians.
    pub fov_y: f64,
    pub near: f64,
    pub far: f64,
    /// Lowest allowed eye height.
    pub min_eye_z: f64,
    /// Step used by [`Camera::jog`].
    pub jog_amplitude: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y: PI / 3.0,
            near: 0.1,
            far: 1000.0,
            min_eye_z: 0.1,
            jog_amplitude: 0.1,
        }
    }
}

/// Discrete camera nudges, e.g. from arrow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    In,
    Out,
}

/// Pan/zoom camera with cached forward and inverse transforms.
#[derive(Debug, Clone)]
pub struct Camera {
    config: CameraConfig,
    eye: DVec3,
    screen: DVec2,
    perspective: DMat4,
    view: DMat4,
    project: DMat4,
    inverse_perspective: DMat4,
    inverse_view: DMat4,
    inverse: DMat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            config,
            eye: DVec3::new(6.5, 5.0, 5.2),
            screen: DVec2::ONE,
            perspective: DMat4::IDENTITY,
            view: DMat4::IDENTITY,
            project: DMat4::IDENTITY,
            inverse_perspective: DMat4::IDENTITY,
            inverse_view: DMat4::IDENTITY,
            inverse: DMat4::IDENTITY,
        };
        camera.update();
        camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn eye(&self) -> DVec3 {
        self.eye
    }

    /// Screen size in pixels.
    pub fn screen_size(&self) -> (f64, f64) {
        (self.screen.x, self.screen.y)
    }

    /// Combined projection `perspective * view`.
    pub fn project(&self) -> &DMat4 {
        &self.project
    }

    pub fn inverse(&self) -> &DMat4 {
        &self.inverse
    }

    pub fn view(&self) -> &DMat4 {
        &self.view
    }

    pub fn perspective(&self) -> &DMat4 {
        &self.perspective
    }

    pub fn inverse_view(&self) -> &DMat4 {
        &self.inverse_view
    }

    pub fn inverse_perspective(&self) -> &DMat4 {
        &self.inverse_perspective
    }

    /// Sets the screen size; sizes below one pixel are clamped to one.
    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        let size = DVec2::new(width.max(1.0), height.max(1.0));
        if size == self.screen {
            return;
        }
        self.screen = size;
        self.update();
    }

    /// Moves the eye to an absolute position.
    pub fn snap(&mut self, eye: DVec3) {
        self.eye = eye;
        self.update();
    }

    /// Pans to `(x, y)` keeping the current height.
    pub fn snap_xy(&mut self, x: f64, y: f64) {
        self.eye.x = x;
        self.eye.y = y;
        self.update();
    }

    /// Centers on `bounds` and picks the height at which the binding
    /// dimension of the box exactly fills the screen.
    pub fn snap_to_box(&mut self, bounds: &Box2D) {
        let (cx, cy) = bounds.center();
        let (width, height) = bounds.size();
        self.eye.x = cx;
        self.eye.y = cy;

        let aspect = self.aspect();
        let box_aspect = width / height;
        let visible_height = if box_aspect > aspect {
            width / aspect
        } else {
            height
        };
        self.eye.z = visible_height / (2.0 * (self.config.fov_y / 2.0).tan());
        self.update();
    }

    /// Relative move driven by pointer or wheel deltas in screen pixels.
    ///
    /// Pan speed scales with height so the map tracks the pointer at any zoom.
    /// Positive `dy` moves the view down the screen; positive `dz` zooms out.
    pub fn dolly(&mut self, dx: f64, dy: f64, dz: f64) {
        if dx == 0.0 && dy == 0.0 && dz == 0.0 {
            return;
        }
        let z_compensation = self.eye.z * 0.1;
        const XY_FACTOR: f64 = 0.01;
        const Z_FACTOR: f64 = 0.01;
        self.eye.x -= dx * XY_FACTOR * z_compensation;
        self.eye.y += dy * XY_FACTOR * z_compensation;
        self.eye.z += dz * Z_FACTOR * z_compensation;
        self.update();
    }

    pub fn jog(&mut self, direction: Direction) {
        let step = self.config.jog_amplitude;
        match direction {
            Direction::Up => self.eye.y += step,
            Direction::Down => self.eye.y -= step,
            Direction::Left => self.eye.x -= step,
            Direction::Right => self.eye.x += step,
            Direction::In => self.eye.z -= step,
            Direction::Out => self.eye.z += step,
        }
        self.update();
    }

    /// Screen pixel to normalized device coordinates on the near plane.
    pub fn to_ndc(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx / self.screen.x) * 2.0 - 1.0,
            -((sy / self.screen.y) * 2.0 - 1.0),
        )
    }

    /// Screen pixel to the world point under it on the `z = 0` plane.
    ///
    /// The pixel is unprojected as a homogeneous point on the near plane plus
    /// the homogeneous direction of the view ray. The combination whose `z`
    /// vanishes lies on the world plane; dividing by `w` gives the point.
    pub fn to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        let (nx, ny) = self.to_ndc(sx, sy);
        let origin = self.inverse * DVec4::new(nx, ny, 0.0, 1.0);
        let direction = self.inverse * DVec4::new(0.0, 0.0, 1.0, 0.0);
        let hit = origin - direction * (origin.z / direction.z);
        (hit.x / hit.w, hit.y / hit.w)
    }

    /// World point on the `z = 0` plane to screen pixel.
    pub fn to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        let clip = self.project * DVec4::new(wx, wy, 0.0, 1.0);
        let nx = clip.x / clip.w;
        let ny = clip.y / clip.w;
        (
            (nx + 1.0) / 2.0 * self.screen.x,
            (1.0 - ny) / 2.0 * self.screen.y,
        )
    }

    /// World-space box currently visible on screen.
    pub fn world_bounds(&self) -> Box2D {
        let (ax, ay) = self.to_world(0.0, 0.0);
        let (bx, by) = self.to_world(self.screen.x, self.screen.y);
        Box2D::from_values(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
    }

    /// Screen pixels spanned by one world unit at the current zoom.
    pub fn pixels_per_world_unit(&self) -> f64 {
        let visible_height = 2.0 * self.eye.z * (self.config.fov_y / 2.0).tan();
        self.screen.y / visible_height
    }

    fn aspect(&self) -> f64 {
        self.screen.x / self.screen.y
    }

    fn update(&mut self) {
        self.eye.z = self.eye.z.max(self.config.min_eye_z);

        let focal = DVec3::new(self.eye.x, self.eye.y, 0.0);
        self.perspective =
            DMat4::perspective_rh(self.config.fov_y, self.aspect(), self.config.near, self.config.far);
        self.view = DMat4::look_at_rh(self.eye, focal, DVec3::Y);
        self.project = self.perspective * self.view;

        self.inverse_perspective = self.perspective.inverse();
        self.inverse_view = self.view.inverse();
        self.inverse = self.project.inverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn camera_800x600() -> Camera {
        let mut camera = Camera::default();
        camera.set_screen_size(800.0, 600.0);
        camera
    }

    fn assert_close(a: (f64, f64), b: (f64, f64)) {
        assert!(
            (a.0 - b.0).abs() < TOLERANCE && (a.1 - b.1).abs() < TOLERANCE,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_screen_center_maps_to_eye() {
        let camera = camera_800x600();
        let eye = camera.eye();
        assert_close(camera.to_world(400.0, 300.0), (eye.x, eye.y));
        assert_close(camera.to_screen(eye.x, eye.y), (400.0, 300.0));
    }

    #[test]
    fn test_screen_y_grows_downward() {
        let camera = camera_800x600();
        let (_, top) = camera.to_world(400.0, 0.0);
        let (_, bottom) = camera.to_world(400.0, 600.0);
        assert!(top > bottom);
    }

    #[test]
    fn test_round_trip_screen_world_screen() {
        let camera = camera_800x600();
        for &(sx, sy) in &[(0.0, 0.0), (800.0, 600.0), (123.0, 456.0), (799.0, 1.0)] {
            let (wx, wy) = camera.to_world(sx, sy);
            assert_close(camera.to_screen(wx, wy), (sx, sy));
        }
    }

    #[test]
    fn test_round_trip_world_screen_world() {
        let mut camera = camera_800x600();
        camera.snap(DVec3::new(100.0, 50.0, 40.0));
        for &(wx, wy) in &[(100.0, 50.0), (90.0, 45.0), (110.5, 60.25)] {
            let (sx, sy) = camera.to_screen(wx, wy);
            assert_close(camera.to_world(sx, sy), (wx, wy));
        }
    }

    #[test]
    fn test_snap_to_box_covers_box() {
        let mut camera = camera_800x600();
        for bounds in [
            Box2D::from_values(0.0, 0.0, 16.0, 16.0),
            Box2D::from_values(0.0, 0.0, 1024.0, 64.0),
            Box2D::from_values(-10.0, 20.0, 5.0, 400.0),
        ] {
            camera.snap_to_box(&bounds);
            let visible = camera.world_bounds();
            assert!(visible.area() >= bounds.area() - TOLERANCE);
            assert!(visible.expand(TOLERANCE).contains_box(&bounds));
        }
    }

    #[test]
    fn test_snap_to_box_fills_binding_dimension() {
        let mut camera = camera_800x600();
        let wide = Box2D::from_values(0.0, 0.0, 400.0, 100.0);
        camera.snap_to_box(&wide);
        assert!((camera.world_bounds().width() - 400.0).abs() < 1e-6);

        let tall = Box2D::from_values(0.0, 0.0, 100.0, 400.0);
        camera.snap_to_box(&tall);
        assert!((camera.world_bounds().height() - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_dolly_is_noop() {
        let mut camera = camera_800x600();
        let before = camera.eye();
        camera.dolly(0.0, 0.0, 0.0);
        assert_eq!(camera.eye(), before);
    }

    #[test]
    fn test_dolly_pan_scales_with_height() {
        let mut low = camera_800x600();
        low.snap(DVec3::new(0.0, 0.0, 10.0));
        low.dolly(100.0, 0.0, 0.0);

        let mut high = camera_800x600();
        high.snap(DVec3::new(0.0, 0.0, 100.0));
        high.dolly(100.0, 0.0, 0.0);

        assert!((low.eye().x - -1.0).abs() < 1e-9);
        assert!((high.eye().x - -10.0).abs() < 1e-9);
    }

    #[test]
    fn test_eye_height_is_clamped() {
        let mut camera = camera_800x600();
        camera.snap(DVec3::new(0.0, 0.0, -5.0));
        assert_eq!(camera.eye().z, 0.1);
        camera.jog(Direction::In);
        assert_eq!(camera.eye().z, 0.1);
    }

    #[test]
    fn test_jog_directions() {
        let mut camera = camera_800x600();
        camera.snap(DVec3::new(1.0, 1.0, 1.0));
        camera.jog(Direction::Up);
        camera.jog(Direction::Right);
        camera.jog(Direction::Out);
        let eye = camera.eye();
        assert!((eye.x - 1.1).abs() < 1e-12);
        assert!((eye.y - 1.1).abs() < 1e-12);
        assert!((eye.z - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_pixels_per_world_unit_matches_projection() {
        let mut camera = camera_800x600();
        camera.snap(DVec3::new(0.0, 0.0, 20.0));
        let (_, a) = camera.to_screen(0.0, 0.0);
        let (_, b) = camera.to_screen(0.0, 1.0);
        assert!(((a - b) - camera.pixels_per_world_unit()).abs() < 1e-6);
    }

    #[test]
    fn test_to_ndc_corners() {
        let camera = camera_800x600();
        assert_close(camera.to_ndc(0.0, 0.0), (-1.0, 1.0));
        assert_close(camera.to_ndc(800.0, 600.0), (1.0, -1.0));
    }

    #[test]
    fn test_set_screen_size_clamps_to_one_pixel() {
        let mut camera = Camera::default();
        camera.set_screen_size(0.0, -3.0);
        assert_eq!(camera.screen_size(), (1.0, 1.0));
    }
}
