pub mod wallpaper_coordinator;

pub use wallpaper_coordinator::{WallpaperCoordinator, WallpaperEvent};
