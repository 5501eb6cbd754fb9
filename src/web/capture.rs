use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlVideoElement};

use crate::error::{GameError, Result};

/// Grabs webcam frames into an offscreen canvas and encodes them as JPEG
/// data URLs.
pub struct FrameCapture {
    video: HtmlVideoElement,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    quality: f64,
}

impl FrameCapture {
    pub fn new(
        doc: &Document,
        video: HtmlVideoElement,
        width: u32,
        height: u32,
        quality: f64,
    ) -> Result<Self> {
        let canvas: HtmlCanvasElement = doc
            .create_element("canvas")?
            .dyn_into()
            .map_err(|_| GameError::MissingElement("capture canvas"))?;
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .and_then(|c| c.dyn_into().ok())
            .ok_or(GameError::MissingElement("capture 2d context"))?;
        Ok(Self {
            video,
            canvas,
            ctx,
            quality,
        })
    }

    /// `None` until the camera delivers frames.
    pub fn capture(&self) -> Option<String> {
        if self.video.video_width() == 0 || self.video.video_height() == 0 {
            return None;
        }
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        self.ctx
            .draw_image_with_html_video_element_and_dw_and_dh(&self.video, 0.0, 0.0, w, h)
            .ok()?;
        self.canvas
            .to_data_url_with_type_and_encoder_options(
                "image/jpeg",
                &JsValue::from_f64(self.quality),
            )
            .ok()
    }
}
