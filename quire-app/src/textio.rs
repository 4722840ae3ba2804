//! Text file I/O with encoding detection.
//!
//! Reads sniff the encoding with chardetng and decode through encoding_rs;
//! writes transcode when a non-UTF-8 label is requested. Empty files read as
//! empty UTF-8.

use std::path::Path;

use encoding_rs::Encoding;

use quire_core::ipc::commands::{EncodeArg, ReadResult, WriteFileInfo};

pub fn exists(path: &str) -> bool {
    Path::new(path).exists()
}

pub fn is_file(path: &str) -> bool {
    Path::new(path).is_file()
}

pub fn mkdir(path: &str) -> Result<(), String> {
    std::fs::create_dir(path).map_err(|e| e.to_string())
}

pub fn mkdir_all(path: &str) -> Result<(), String> {
    std::fs::create_dir_all(path).map_err(|e| e.to_string())
}

pub fn create(path: &str) -> Result<(), String> {
    std::fs::File::create_new(path)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Read a file, guessing its encoding from the raw bytes.
pub fn read_to_string(file_path: &str) -> Result<ReadResult, String> {
    let bytes = std::fs::read(file_path).map_err(|e| e.to_string())?;
    if bytes.is_empty() {
        return Ok(ReadResult {
            content: String::new(),
            encoding: encoding_rs::UTF_8.name().to_string(),
        });
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(&bytes, true);
    let encoding = detector.guess(None, true);
    let (content, _, _) = encoding.decode(&bytes);
    Ok(ReadResult {
        content: content.into_owned(),
        encoding: encoding.name().to_string(),
    })
}

/// Write text, transcoding when a non-UTF-8 encoding label is given. An
/// unrecognized label falls back to UTF-8.
pub fn write_text_file(info: WriteFileInfo) -> Result<(), String> {
    match info.encoding.as_deref() {
        Some(label) => {
            let encoding = Encoding::for_label(label.as_bytes()).unwrap_or(encoding_rs::UTF_8);
            if encoding == encoding_rs::UTF_8 {
                return std::fs::write(&info.full_path, info.data.as_bytes())
                    .map_err(|e| e.to_string());
            }
            let (encoded, _, _) = encoding.encode(&info.data);
            std::fs::write(&info.full_path, &encoded).map_err(|e| e.to_string())
        }
        None => std::fs::write(&info.full_path, info.data.as_bytes()).map_err(|e| e.to_string()),
    }
}

/// Re-decode a file (or raw content) under a named encoding.
pub fn change_encoding(arg: EncodeArg) -> Result<String, String> {
    let Some(encoding) = Encoding::for_label(arg.encoding.as_bytes()) else {
        return Err(format!("requested encoding '{}' is not recognized", arg.encoding));
    };

    let bytes = match (&arg.file_path, &arg.content) {
        (Some(path), _) => std::fs::read(path).map_err(|e| e.to_string())?,
        (None, Some(content)) => content.clone().into_bytes(),
        (None, None) => return Err("change_encoding needs a file path or content".into()),
    };
    if bytes.is_empty() {
        return Ok(String::new());
    }
    Ok(encoding.decode(&bytes).0.into_owned())
}
