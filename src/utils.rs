use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use indicatif::ProgressStyle;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const READ_BUFFER: usize = 1 << 20;

#[inline]
pub(crate) fn push_id(line: &mut String, id: u32) {
    let mut buffer = itoa::Buffer::new();
    line.push_str(buffer.format(id));
}

/// Opens a JSONL file for line-wise reading. Files ending in `.gz` are
/// decompressed on the fly.
pub fn open_jsonl(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let gzipped = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    if gzipped {
        Ok(Box::new(BufReader::with_capacity(
            READ_BUFFER,
            GzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER, file)))
    }
}

pub(crate) fn create_buffered(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Serializes `value` with the given indent width, e.g. 4 for the metadata
/// dumps and 2 for the id mappings. Width 0 writes compact JSON.
pub(crate) fn to_writer_indented<W: Write, T: Serialize + ?Sized>(
    writer: W,
    value: &T,
    indent: usize,
) -> Result<()> {
    if indent == 0 {
        serde_json::to_writer(writer, value)?;
        return Ok(());
    }
    let indent = vec![b' '; indent];
    let formatter = PrettyFormatter::with_indent(&indent);
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)?;
    Ok(())
}

pub(crate) fn write_json_file<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    indent: usize,
) -> Result<()> {
    let mut writer = create_buffered(path)?;
    to_writer_indented(&mut writer, value, indent)
        .with_context(|| format!("cannot serialize {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Truthiness of a JSON value: empty strings, arrays and objects, zero,
/// `false` and `null` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub(crate) fn spinner_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_spinner()
        .template("{spinner} [{elapsed_precise}] {msg} {pos} lines ({per_sec})")?)
}

pub(crate) fn bar_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{wide_bar}] {pos}/{len} ({eta})")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use indicatif::{InMemoryTerm, ProgressBar, ProgressDrawTarget};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn truthiness_follows_json_emptiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("Gift card")));
        assert!(is_truthy(&json!([{"large": "x.jpg"}])));
        assert!(is_truthy(&json!(2.5)));
    }

    #[test]
    fn gz_inputs_are_decompressed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.jsonl.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"{\"a\":1}\n{\"a\":2}\n").unwrap();
        encoder.finish().unwrap();

        let lines: Vec<String> = open_jsonl(&path)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["{\"a\":1}", "{\"a\":2}"]);
    }

    #[test]
    fn indented_json_uses_requested_width() {
        let mut out = Vec::new();
        to_writer_indented(&mut out, &json!({"k": [1]}), 4).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\n    \"k\": [\n        1\n    ]\n}"
        );

        let mut compact = Vec::new();
        to_writer_indented(&mut compact, &json!(["a", "b"]), 0).unwrap();
        assert_eq!(compact, b"[\"a\",\"b\"]");
    }

    #[test]
    fn bar_shows_its_message() {
        let term = InMemoryTerm::new(4, 100);
        let bar = ProgressBar::with_draw_target(
            Some(10),
            ProgressDrawTarget::term_like(Box::new(term.clone())),
        )
        .with_style(bar_style().unwrap());
        bar.set_message("Generating negatives");
        bar.tick();
        assert!(term.contents().starts_with("Generating negatives ["));
    }

    #[test]
    fn ids_are_appended_as_decimal() {
        let mut line = String::from("u");
        push_id(&mut line, 4_294_967_295);
        assert_eq!(line, "u4294967295");
    }
}
