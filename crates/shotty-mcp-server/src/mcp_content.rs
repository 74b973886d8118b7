//! MCP content builders for capture results
//!
//! Inline captures become an image block plus a metadata block; stored
//! captures become a `file://` reference plus the same metadata. A result
//! never carries both the bytes and the path.
//!
//! # Examples
//!
//! ```
//! use shotty_core::model::{CapturePayload, CaptureResult};
//! use shotty_mcp_server::mcp_content::build_capture_result;
//!
//! let result = CaptureResult {
//!     payload:      CapturePayload::Inline(vec![137, 80, 78, 71, 13, 10, 26, 10]),
//!     mime_type:    "image/png",
//!     backend_used: "cli-via-extension-activation".to_string(),
//! };
//!
//! let response = build_capture_result(&result, 8);
//! assert!(!response.is_error.unwrap_or(false));
//! assert_eq!(response.content.len(), 2); // Image + Metadata
//! ```

use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use rmcp::model::{CallToolResult, Content};
use shotty_core::model::{CapturePayload, CaptureResult};

/// Builds MCP image content from encoded image bytes
///
/// # Examples
///
/// ```
/// use shotty_mcp_server::mcp_content::build_image_content;
///
/// let png_data = vec![137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13];
/// let content = build_image_content(&png_data, "image/png");
/// assert!(content.as_image().is_some());
/// ```
pub fn build_image_content(data: &[u8], mime_type: &str) -> Content {
    Content::image(STANDARD.encode(data), mime_type)
}

/// Formats a local path as a `file://` URI
pub fn file_uri(path: &Path) -> String {
    let path_str = path.to_string_lossy();

    #[cfg(target_os = "windows")]
    let uri = format!("file:///{}", path_str.replace('\\', "/"));

    #[cfg(not(target_os = "windows"))]
    let uri = format!("file://{}", path_str);

    uri
}

/// Builds a text reference to a stored screenshot
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
///
/// use shotty_mcp_server::mcp_content::build_resource_link;
///
/// let path = PathBuf::from("/home/u/Pictures/shotty/screenshot_full_1.png");
/// let content = build_resource_link(&path, "image/png", 12345);
/// assert!(content.as_text().unwrap().text.contains("file:///home/u"));
/// ```
pub fn build_resource_link(path: &Path, mime_type: &str, size: u64) -> Content {
    let uri = file_uri(path);
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("screenshot.png");
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    Content::text(format!(
        "## Screenshot File Reference\n\n**File:** [{}]({})\n**Timestamp:** {}\n**Size:** {} \
         bytes\n**MIME Type:** {}\n\n_The screenshot has been saved to the path above._",
        filename, uri, timestamp, size, mime_type
    ))
}

/// JSON metadata describing a capture result
pub fn capture_metadata(result: &CaptureResult, size: u64) -> serde_json::Value {
    let mut metadata = serde_json::json!({
        "backend_used": result.backend_used,
        "mime_type": result.mime_type,
        "size_bytes": size,
    });
    if let Some(path) = result.file_path() {
        metadata["file_path"] = serde_json::Value::String(path.to_string_lossy().to_string());
    }
    metadata
}

/// Builds the tool response for a capture result
///
/// `size` is the encoded image size in bytes (known to the caller for
/// stored results, whose bytes are not held in memory).
pub fn build_capture_result(result: &CaptureResult, size: u64) -> CallToolResult {
    let metadata = serde_json::to_string_pretty(&capture_metadata(result, size))
        .unwrap_or_else(|_| r#"{"error": "Failed to serialize metadata"}"#.to_string());
    let metadata_content = Content::text(format!("## Capture Metadata\n\n```json\n{}\n```", metadata));

    let primary = match &result.payload {
        CapturePayload::Inline(data) => build_image_content(data, result.mime_type),
        CapturePayload::Stored(path) => build_resource_link(path, result.mime_type, size),
    };

    CallToolResult::success(vec![primary, metadata_content])
}
