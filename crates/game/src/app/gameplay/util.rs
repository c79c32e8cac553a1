fn is_text_bearing_key(key: &str) -> bool {
    TEXT_BEARING_KEYS.contains(&key)
}

/// Store coordinates are unsigned whole pixels.
fn to_wire_coord(value: f32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round().min(u32::MAX as f32) as u32
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Packages sit in one of a fixed number of slots along the bottom-right of
/// the door, picked from the package id.
fn package_slot_position(bounds: DoorBounds, package_id: u64) -> Vec2 {
    let slot = (package_id % PACKAGE_SLOT_COUNT) as f32;
    let half_width = bounds.width / 2.0;
    let slot_width = half_width / PACKAGE_SLOT_COUNT as f32;
    let max_x = (bounds.x + bounds.width - PACKAGE_EXTENT - 5.0).max(bounds.x);
    let x = (bounds.x + half_width + slot * slot_width).min(max_x);
    let y = bounds.y + bounds.height - PACKAGE_EXTENT + 5.0;
    Vec2::new(x, y)
}
