//! 上传文件的内容签名校验
//!
//! 只看首个分片的前若干字节，防止把可执行文件改名成 `.pdf` 之类上传。

/// 文件头特征
enum Signature {
    /// 从偏移 0 开始的前缀，任一匹配即可
    Prefix(&'static [&'static [u8]]),
    /// 指定偏移处的字节
    At(usize, &'static [u8]),
    /// RIFF 容器，偏移 8 处为子类型
    Riff(&'static [u8]),
    /// 纯文本，不做检查
    Text,
}

const OLE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const ZIP_EMPTY: &[u8] = &[0x50, 0x4B, 0x05, 0x06];

fn signature_for(extension: &str) -> Option<Signature> {
    use Signature::*;
    Some(match extension {
        ".pdf" => Prefix(&[b"%PDF"]),
        ".png" => Prefix(&[&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]]),
        ".jpg" | ".jpeg" => Prefix(&[&[0xFF, 0xD8, 0xFF]]),
        ".gif" => Prefix(&[b"GIF87a", b"GIF89a"]),
        ".webp" => Riff(b"WEBP"),
        ".doc" | ".ppt" | ".xls" => Prefix(&[OLE]),
        ".docx" | ".pptx" | ".xlsx" => Prefix(&[ZIP]),
        ".zip" => Prefix(&[ZIP, ZIP_EMPTY]),
        ".mp4" | ".m4v" | ".mov" => At(4, b"ftyp"),
        ".webm" | ".mkv" => Prefix(&[&[0x1A, 0x45, 0xDF, 0xA3]]),
        ".mp3" => Prefix(&[b"ID3", &[0xFF, 0xFB], &[0xFF, 0xF3]]),
        ".txt" | ".md" | ".csv" => Text,
        _ => return None,
    })
}

/// 内容与扩展名（含点号，不区分大小写）是否相符
///
/// 未登记的扩展名一律拒绝；空内容也拒绝。
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }
    let Some(signature) = signature_for(&extension.to_ascii_lowercase()) else {
        return false;
    };
    match signature {
        Signature::Prefix(prefixes) => prefixes.iter().any(|p| data.starts_with(p)),
        Signature::At(offset, bytes) => data
            .get(offset..offset + bytes.len())
            .is_some_and(|window| window == bytes),
        Signature::Riff(kind) => data.starts_with(b"RIFF") && data.get(8..12) == Some(kind),
        Signature::Text => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents() {
        assert!(validate_magic_bytes(b"%PDF-1.7\n", ".pdf"));
        assert!(validate_magic_bytes(b"%PDF-1.4", ".PDF"));
        assert!(!validate_magic_bytes(b"MZ\x90\x00", ".pdf"));

        let ooxml = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00];
        assert!(validate_magic_bytes(&ooxml, ".docx"));
        assert!(validate_magic_bytes(&ooxml, ".pptx"));
        assert!(validate_magic_bytes(&ooxml, ".zip"));
        assert!(!validate_magic_bytes(&ooxml, ".doc"));
    }

    #[test]
    fn test_images() {
        assert!(validate_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0], ".jpeg"));
        assert!(validate_magic_bytes(b"GIF89a....", ".gif"));
        assert!(validate_magic_bytes(b"RIFF\x10\x00\x00\x00WEBPVP8 ", ".webp"));
        assert!(!validate_magic_bytes(b"RIFF\x10\x00\x00\x00WAVE", ".webp"));
        assert!(!validate_magic_bytes(b"RIFF", ".webp"));
    }

    #[test]
    fn test_video_offset_signature() {
        let mp4 = [0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm'];
        assert!(validate_magic_bytes(&mp4, ".mp4"));
        assert!(!validate_magic_bytes(&mp4[..6], ".mp4"));
    }

    #[test]
    fn test_text_and_unknown() {
        assert!(validate_magic_bytes(b"Soal latihan bab 2", ".txt"));
        assert!(!validate_magic_bytes(b"", ".txt"));
        assert!(!validate_magic_bytes(b"MZ\x90\x00", ".exe"));
        assert!(!validate_magic_bytes(b"<html>", ".html"));
    }
}
