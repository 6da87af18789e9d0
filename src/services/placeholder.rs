//! Placeholder image
//!
//! Stand-in SVG shown when the image provider is out of credits.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Prompt characters rendered on the placeholder
pub const PROMPT_PREVIEW_CHARS: usize = 40;

/// Shorten a prompt for display, appending `...` when cut
pub fn prompt_preview(prompt: &str) -> String {
    if prompt.chars().count() > PROMPT_PREVIEW_CHARS {
        let head: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        prompt.to_string()
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Render the placeholder SVG markup
pub fn placeholder_svg(prompt: &str) -> String {
    let preview = escape_xml(&prompt_preview(prompt));
    format!(
        r##"<svg width="512" height="512" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <linearGradient id="bg" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" style="stop-color:#667eea;stop-opacity:1" />
      <stop offset="100%" style="stop-color:#764ba2;stop-opacity:1" />
    </linearGradient>
  </defs>
  <rect width="512" height="512" fill="url(#bg)"/>
  <rect x="20" y="20" width="472" height="472" rx="20" fill="white" fill-opacity="0.1"/>
  <text x="256" y="200" font-family="Arial, sans-serif" font-size="24" font-weight="bold" text-anchor="middle" fill="white">🎨 Mock Image</text>
  <text x="256" y="250" font-family="Arial, sans-serif" font-size="16" text-anchor="middle" fill="white" opacity="0.8">ClipDrop недоступен</text>
  <text x="256" y="300" font-family="Arial, sans-serif" font-size="14" text-anchor="middle" fill="white" opacity="0.6">Запрос: {preview}</text>
  <text x="256" y="350" font-family="Arial, sans-serif" font-size="12" text-anchor="middle" fill="white" opacity="0.4">⚠ Проверьте баланс ClipDrop</text>
</svg>"##
    )
}

/// Placeholder SVG as a base64 data URL
pub fn placeholder_data_url(prompt: &str) -> String {
    format!("data:image/svg+xml;base64,{}", BASE64.encode(placeholder_svg(prompt)))
}
