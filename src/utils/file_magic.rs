/// 根据文件头识别图片/视频的 MIME 类型
///
/// 客户端未提供 Content-Type（或为 application/octet-stream）时用于判断媒体类型，
/// 无法识别返回 None
pub fn sniff_media_mime(data: &[u8]) -> Option<&'static str> {
    if data.len() < 4 {
        return None;
    }

    // 图片
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" {
        match &data[8..12] {
            b"WEBP" => return Some("image/webp"),
            b"AVI " => return Some("video/x-msvideo"),
            _ => {}
        }
    }

    // ISO BMFF：偏移 4 处为 ftyp，品牌决定具体类型
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return match &data[8..12] {
            b"heic" | b"heix" | b"mif1" => Some("image/heic"),
            b"qt  " => Some("video/quicktime"),
            _ => Some("video/mp4"),
        };
    }
    // Matroska / WebM
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some("video/webm");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_headers() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        assert_eq!(sniff_media_mime(&png), Some("image/png"));
        assert_eq!(sniff_media_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_media_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
    }

    #[test]
    fn test_video_headers() {
        assert_eq!(
            sniff_media_mime(b"\0\0\0\x18ftypisom\0\0\0\0"),
            Some("video/mp4")
        );
        assert_eq!(
            sniff_media_mime(b"\0\0\0\x14ftypqt  \0\0\0\0"),
            Some("video/quicktime")
        );
        assert_eq!(
            sniff_media_mime(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]),
            Some("video/webm")
        );
    }

    #[test]
    fn test_unknown_or_short_data() {
        assert_eq!(sniff_media_mime(b"%PDF-1.4"), None);
        assert_eq!(sniff_media_mime(&[0xFF, 0xD8]), None);
        assert_eq!(sniff_media_mime(&[]), None);
    }
}
