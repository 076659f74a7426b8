/// Limits for player controls.
pub(crate) const MIN_VOLUME: f32 = 0.0;
pub(crate) const MAX_VOLUME: f32 = 1.0;
pub(crate) const VOLUME_STEP: f32 = 0.1;
/// First page of every audiobook.
pub(crate) const FIRST_PAGE: u32 = 1;
