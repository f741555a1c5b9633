//! Carousel layout math for the public page.
//!
//! Pure banding function from (item index, selected index) to the visual
//! transform of one card. Cards fan out from the selected center: the further
//! from the selection, the more offset, rotation and fading. Narrow viewports
//! use tighter offsets and smaller scales, but never change sign or z-order
//! banding.

/// Visual transform parameters for one carousel card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTransform {
    /// Horizontal offset in px, signed by direction from the center
    pub offset: f32,
    /// Y-axis rotation in degrees, opposite sign to the offset
    pub rotation: f32,
    pub scale: f32,
    pub opacity: f32,
    /// Stacking order, higher is closer to the viewer
    pub z_order: u8,
}

impl CardTransform {
    /// The centered card: full size, fully opaque, on top
    pub const CENTER: CardTransform = CardTransform {
        offset: 0.0,
        rotation: 0.0,
        scale: 1.0,
        opacity: 1.0,
        z_order: 10,
    };

    /// Distance band from the selected card (0 = centered, capped at 3)
    pub fn band(&self) -> u8 {
        match self.z_order {
            10 => 0,
            5 => 1,
            2 => 2,
            _ => 3,
        }
    }
}

/// Transform for the card at `item_index` when `selected_index` is centered.
pub fn position_of(item_index: usize, selected_index: usize, mobile: bool) -> CardTransform {
    let diff = item_index as i64 - selected_index as i64;
    let direction = if diff >= 0 { 1.0 } else { -1.0 };

    match diff.unsigned_abs() {
        0 => CardTransform::CENTER,
        1 => CardTransform {
            offset: direction * if mobile { 120.0 } else { 200.0 },
            rotation: -direction * 45.0,
            scale: if mobile { 0.7 } else { 0.8 },
            opacity: 0.7,
            z_order: 5,
        },
        2 => CardTransform {
            offset: direction * if mobile { 200.0 } else { 350.0 },
            rotation: -direction * 60.0,
            scale: if mobile { 0.5 } else { 0.6 },
            opacity: 0.4,
            z_order: 2,
        },
        _ => CardTransform {
            offset: direction * if mobile { 250.0 } else { 450.0 },
            rotation: -direction * 75.0,
            scale: 0.4,
            opacity: 0.2,
            z_order: 1,
        },
    }
}
