use eframe::egui::{Pos2, Vec2, vec2};

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 4.0;

/// Pan/zoom mapping: `screen = world * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub translate: Vec2,
}

impl Viewport {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate: Vec2::ZERO,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn clamp_scale(scale: f32) -> f32 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

#[derive(Clone, Debug)]
pub struct ViewportController {
    transform: Viewport,
    size: Vec2,
}

impl ViewportController {
    pub fn new(size: Vec2) -> Self {
        Self {
            transform: Viewport::IDENTITY,
            size,
        }
    }

    pub fn transform(&self) -> Viewport {
        self.transform
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Logical center of the drawing surface, in screen coordinates.
    pub fn center(&self) -> Pos2 {
        (self.size * 0.5).to_pos2()
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn zoom_percent(&self) -> f32 {
        self.transform.scale * 100.0
    }

    /// Zooms around the center of the surface.
    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom_by_at(factor, self.center());
    }

    /// Zooms so the world point under `anchor` stays under `anchor`.
    pub fn zoom_by_at(&mut self, factor: f32, anchor: Pos2) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let world = self.screen_to_world(anchor);
        self.transform.scale = clamp_scale(self.transform.scale * factor);
        self.transform.translate = anchor.to_vec2() - world.to_vec2() * self.transform.scale;
    }

    pub fn zoom_to(&mut self, transform: Viewport) {
        if !transform.scale.is_finite()
            || !transform.translate.x.is_finite()
            || !transform.translate.y.is_finite()
        {
            return;
        }

        self.transform = Viewport {
            scale: clamp_scale(transform.scale),
            translate: transform.translate,
        };
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        let delta = vec2(dx, dy);
        if delta.x.is_finite() && delta.y.is_finite() {
            self.transform.translate += delta;
        }
    }

    pub fn reset(&mut self) {
        self.transform = Viewport::IDENTITY;
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.transform.translate) / self.transform.scale).to_pos2()
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.transform.scale + self.transform.translate).to_pos2()
    }
}
