//! Prompt composition.
//!
//! The provider receives the user's prompt with the style modifier and,
//! for videos, the camera and duration directives appended. The stored
//! asset keeps the original prompt.

use crate::generation::{CameraMove, GenerationRequest, GenerationTarget, StyleType};

/// Prompt suffix for each style preset. `None` adds nothing.
pub fn style_modifier(style: StyleType) -> &'static str {
    match style {
        StyleType::None => "",
        StyleType::Cartoon => {
            "in a high-quality 3D claymation style, adorable characters, tilt-shift lens effect, vibrant colors"
        }
        StyleType::Cinematic => {
            "Unreal Engine 5 render, global illumination, raytraced reflections, cinematic 8k, photorealistic depth of field"
        }
        StyleType::Anime => {
            "Cel-shaded 3D anime style, high-end production, hand-painted textures, dynamic lighting"
        }
        StyleType::Realistic => {
            "hyper-realistic photogrammetry, 8k raw photo, natural daylight, extreme detail, high fidelity"
        }
        StyleType::Render => {
            "Octane render, abstract geometric 3D, metallic and glass materials, sub-surface scattering, volumetric fog"
        }
        StyleType::Neon => {
            "3D glowing neon elements, volumetric lighting, dark futuristic environment, synthwave colors"
        }
    }
}

/// Camera directive phrase, e.g. `"cinematic dolly in camera movement"`.
///
/// Only the first hyphen of the movement name becomes a space.
pub fn camera_directive(camera: CameraMove) -> Option<String> {
    if camera == CameraMove::None {
        return None;
    }
    Some(format!(
        "cinematic {} camera movement",
        camera.as_str().replacen('-', " ", 1)
    ))
}

/// Build the full prompt text submitted to the provider.
pub fn compose_prompt(request: &GenerationRequest) -> String {
    let mut prompt = request.prompt().to_string();

    let modifier = style_modifier(request.style());
    if !modifier.is_empty() {
        prompt.push_str(", ");
        prompt.push_str(modifier);
    }

    if let GenerationTarget::Video(video) = request.target() {
        if let Some(camera) = camera_directive(video.animation.camera) {
            prompt.push_str(", ");
            prompt.push_str(&camera);
        }
        prompt.push_str(&format!(", {} cinematic sequence", video.duration.as_str()));
    }

    prompt
}
