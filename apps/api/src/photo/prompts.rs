// Prompt constants for the photo enhancer.

/// Vision rubric applied to the uploaded photo.
pub const PHOTO_ANALYSIS_PROMPT: &str =
    "You are a professional portrait photographer reviewing a photo for use on a CV. \
    Describe the person and assess the photo against this rubric: \
    ATTIRE (how formal and appropriate the clothing is), \
    BACKGROUND (clutter, color, distractions), \
    LIGHTING (direction, evenness, harsh shadows), \
    EXPRESSION (approachability, eye contact), \
    COMPOSITION (framing, head and shoulders placement, crop). \
    For each item give a short assessment and one concrete improvement. \
    Respond in plain text only.";

/// Instruction for generating the improved headshot.
pub const HEADSHOT_PROMPT: &str =
    "Create a professional corporate headshot of the same person shown in the reference notes. \
    Keep their facial features, hair, skin tone and identity unchanged. \
    Use business attire, a clean neutral studio background, soft even lighting, \
    a friendly confident expression, and head-and-shoulders framing. \
    Photorealistic, high resolution, no text or watermarks.";
