use foundation::time::HourStamp;

/// Path under which the imagery server exposes `stamp` for `dataset`. Both
/// segments are percent-encoded.
pub fn imagery_path(dataset: &str, stamp: HourStamp) -> String {
    format!(
        "/api/{}/{}",
        urlencoding::encode(dataset),
        urlencoding::encode(&stamp.to_string())
    )
}
