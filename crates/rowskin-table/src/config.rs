use rowskin_core::{Color, Insets};

/// Configuration shared by every row skin of a table.
#[derive(Debug, Clone)]
pub struct SkinConfig {
    /// Natural height of a row's cell band.
    pub row_height: f32,
    /// Insets applied around each row's content.
    pub row_insets: Insets,
    /// Edge length of the dirty-cell marker triangle.
    pub marker_size: f32,
    /// Fill of the dirty-cell marker.
    pub marker_color: Color,
    /// Rows realized above and below the viewport.
    pub overscan: usize,
}

impl Default for SkinConfig {
    fn default() -> Self {
        SkinConfig {
            row_height: 24.0,
            row_insets: Insets::ZERO,
            marker_size: 10.0,
            marker_color: Color::BLUE,
            overscan: 2,
        }
    }
}
