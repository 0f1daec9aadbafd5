use crate::StoreCapabilities;

/// How a download is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPath {
    /// Seek and stream the requested window (206)
    Stream,
    /// Fetch the whole file and answer 200
    Buffered,
}

/// Pick the delivery path for a download.
///
/// Streaming needs a Range header and a store that can both open streams and
/// position them without reading the whole file.
pub fn select_delivery_path(has_range_header: bool, capabilities: &StoreCapabilities) -> DeliveryPath {
    if has_range_header && capabilities.supports_stream && capabilities.supports_partial_read {
        DeliveryPath::Stream
    } else {
        DeliveryPath::Buffered
    }
}

/// Content type for a file name, from its extension
pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_only_with_range_and_partial_reads() {
        let full = StoreCapabilities::basic().with_stream().with_partial_read();
        assert_eq!(select_delivery_path(true, &full), DeliveryPath::Stream);
        assert_eq!(select_delivery_path(false, &full), DeliveryPath::Buffered);
    }

    #[test]
    fn stream_accessor_alone_is_not_enough() {
        let stream_only = StoreCapabilities::basic().with_stream();
        assert_eq!(select_delivery_path(true, &stream_only), DeliveryPath::Buffered);

        let flag_only = StoreCapabilities::basic().with_partial_read();
        assert_eq!(select_delivery_path(true, &flag_only), DeliveryPath::Buffered);

        assert_eq!(
            select_delivery_path(true, &StoreCapabilities::basic()),
            DeliveryPath::Buffered
        );
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("test.txt"), "text/plain");
        assert_eq!(content_type_for("clip.mp4"), "video/mp4");
        assert_eq!(content_type_for("no_extension"), "application/octet-stream");
    }
}
