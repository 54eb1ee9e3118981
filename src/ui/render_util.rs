use super::{AppView, Arc, Context, FrameInfo, ImageBuffer, ImageFrame, RenderImage, Rgba, Window};
use crate::types::Frame;

pub(super) fn frame_to_image(frame: &Frame) -> Option<Arc<RenderImage>> {
    let mut bgra = frame.rgba.clone();
    // GPUI expects BGRA; convert in place to avoid the async asset pipeline and flicker.
    for px in bgra.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    let buffer = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(frame.width, frame.height, bgra)?;
    Some(Arc::new(RenderImage::new(vec![ImageFrame::new(buffer)])))
}

impl AppView {
    /// Display sink: runs on the UI thread and shows the newest annotated frame.
    pub(super) fn drain_frames(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        let Some(annotated) = self.frames.take_latest() else {
            return;
        };

        let frame = &annotated.frame;
        match frame_to_image(frame) {
            Some(image) => self.replace_latest_image(image, window, cx),
            None => {
                log::warn!(
                    "dropping malformed {}x{} frame ({} bytes)",
                    frame.width,
                    frame.height,
                    frame.rgba.len()
                );
                return;
            }
        }

        self.latest_frame_info = Some(FrameInfo {
            width: frame.width,
            height: frame.height,
            faces: annotated.faces.len(),
        });
    }

    fn replace_latest_image(
        &mut self,
        new_image: Arc<RenderImage>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if let Some(old_image) = self.latest_image.replace(new_image) {
            // Explicitly drop the previous GPU texture; otherwise the sprite atlas keeps
            // every frame and memory will climb rapidly while the camera is running.
            cx.drop_image(old_image, Some(window));
        }
    }
}
