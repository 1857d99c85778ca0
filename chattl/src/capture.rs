use xcap::image::EncodableLayout;

use crate::config::Region;

pub fn find_window(app_name: &str) -> Option<xcap::Window> {
	let windows = xcap::Window::all().ok()?;
	windows
		.into_iter()
		.find(|window| window.app_name().ok().as_deref() == Some(app_name))
}

/// Capture the target window and return the full frame.
pub fn capture_window(app_name: &str) -> Option<ce::OwnedImage> {
	let window = find_window(app_name)?;
	let img = window.capture_image().ok()?;
	Some(ce::OwnedImage::from_rgba(img.width() as usize, img.as_bytes()))
}

/// Capture the target window and crop out the configured chat region.
pub fn capture_chat(app_name: &str, region: Region) -> Option<ce::OwnedImage> {
	let frame = capture_window(app_name)?;
	let crop = frame
		.as_image()
		.sub_image(region.x, region.y, region.width, region.height);
	if crop.width() == 0 || crop.height() == 0 {
		return None;
	}
	Some(crop.to_owned_image())
}
