use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints};

use super::app;
use crate::error::{GameError, Result};

/// Asks for the webcam and attaches it to `video`. Failure is reported once
/// to the app; the game keeps running without frames.
pub fn request(video: HtmlVideoElement) {
    wasm_bindgen_futures::spawn_local(async move {
        match open(&video).await {
            Ok(()) => log::info!("camera stream attached"),
            Err(err) => app::camera_failed(&err.to_string()),
        }
    });
}

async fn open(video: &HtmlVideoElement) -> Result<()> {
    let window = web_sys::window().ok_or(GameError::MissingElement("window"))?;
    let devices = window.navigator().media_devices()?;
    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&JsValue::TRUE);
    constraints.set_audio(&JsValue::FALSE);
    let stream: MediaStream = JsFuture::from(devices.get_user_media_with_constraints(&constraints)?)
        .await?
        .dyn_into()?;
    video.set_src_object(Some(&stream));
    JsFuture::from(video.play()?).await?;
    Ok(())
}
